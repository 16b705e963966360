//! Minimal element-tree XML parsing for capability documents.
//!
//! Map services describe themselves in small, well-formed XML documents.
//! This parser covers exactly that: elements, attributes, text, CDATA,
//! comments, and the five predefined entities. It is not a general XML
//! implementation; there is no DTD handling and no external entity
//! resolution, which also keeps attacker-controlled documents inert.
//!
//! Service documents lean heavily on namespace prefixes (`ows:Identifier`),
//! so element lookups match either the full name or the local part after
//! the prefix.

use thiserror::Error;

/// Errors for documents this parser cannot understand.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum XmlError {
    #[error("unexpected end of document")]
    UnexpectedEof,
    #[error("malformed XML near byte {position}: expected {expected}")]
    Malformed {
        position: usize,
        expected: &'static str,
    },
    #[error("closing tag </{close}> does not match <{open}>")]
    MismatchedTag { open: String, close: String },
}

/// One parsed element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Element name as written, prefix included.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlElement>,
    /// Concatenated character data directly inside this element, trimmed.
    pub text: String,
}

impl XmlElement {
    /// The name without any namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    fn matches(&self, name: &str) -> bool {
        self.name == name || self.local_name() == local_part(name)
    }

    /// First child whose name (full or local) matches.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.matches(name))
    }

    /// All children whose name (full or local) matches, in document order.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.matches(name))
    }

    /// Text content of the first matching child.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name || local_part(key) == local_part(name))
            .map(|(_, value)| value.as_str())
    }
}

fn local_part(name: &str) -> &str {
    match name.rsplit_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}

/// Parses a document and returns its root element.
pub fn parse(input: &str) -> Result<XmlElement, XmlError> {
    let mut parser = Parser {
        bytes: input.as_bytes(),
        pos: 0,
    };
    parser.skip_misc()?;
    let root = parser.parse_element()?;
    Ok(root)
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(prefix)
    }

    fn expect(&mut self, prefix: &[u8], expected: &'static str) -> Result<(), XmlError> {
        if self.starts_with(prefix) {
            self.pos += prefix.len();
            Ok(())
        } else if self.pos >= self.bytes.len() {
            Err(XmlError::UnexpectedEof)
        } else {
            Err(XmlError::Malformed {
                position: self.pos,
                expected,
            })
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Skips whitespace, the XML prolog, comments, and doctype declarations.
    fn skip_misc(&mut self) -> Result<(), XmlError> {
        loop {
            self.skip_whitespace();
            if self.starts_with(b"<?") {
                self.skip_until(b"?>")?;
            } else if self.starts_with(b"<!--") {
                self.skip_until(b"-->")?;
            } else if self.starts_with(b"<!") {
                self.skip_until(b">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_until(&mut self, terminator: &[u8]) -> Result<(), XmlError> {
        while self.pos < self.bytes.len() {
            if self.starts_with(terminator) {
                self.pos += terminator.len();
                return Ok(());
            }
            self.pos += 1;
        }
        Err(XmlError::UnexpectedEof)
    }

    fn read_name(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b'>' || b == b'/' || b == b'=' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(XmlError::Malformed {
                position: self.pos,
                expected: "name",
            });
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn parse_element(&mut self) -> Result<XmlElement, XmlError> {
        self.expect(b"<", "element start")?;
        let name = self.read_name()?;
        let mut element = XmlElement {
            name,
            ..Default::default()
        };

        // Attributes until the tag closes.
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'/') => {
                    self.expect(b"/>", "self-closing tag")?;
                    return Ok(element);
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let key = self.read_name()?;
                    self.skip_whitespace();
                    self.expect(b"=", "attribute value")?;
                    self.skip_whitespace();
                    let quote = match self.peek() {
                        Some(q @ (b'"' | b'\'')) => q,
                        _ => {
                            return Err(XmlError::Malformed {
                                position: self.pos,
                                expected: "quoted attribute value",
                            })
                        }
                    };
                    self.pos += 1;
                    let start = self.pos;
                    while self.peek().is_some_and(|b| b != quote) {
                        self.pos += 1;
                    }
                    if self.peek().is_none() {
                        return Err(XmlError::UnexpectedEof);
                    }
                    let raw = &self.bytes[start..self.pos];
                    self.pos += 1;
                    element
                        .attributes
                        .push((key, decode_entities(&String::from_utf8_lossy(raw))));
                }
                None => return Err(XmlError::UnexpectedEof),
            }
        }

        // Content until the matching close tag.
        let mut text = String::new();
        loop {
            if self.starts_with(b"</") {
                self.pos += 2;
                let close = self.read_name()?;
                self.skip_whitespace();
                self.expect(b">", "closing tag end")?;
                if close != element.name {
                    return Err(XmlError::MismatchedTag {
                        open: element.name,
                        close,
                    });
                }
                element.text = text.trim().to_string();
                return Ok(element);
            } else if self.starts_with(b"<!--") {
                self.skip_until(b"-->")?;
            } else if self.starts_with(b"<![CDATA[") {
                self.pos += b"<![CDATA[".len();
                let start = self.pos;
                while self.pos < self.bytes.len() && !self.starts_with(b"]]>") {
                    self.pos += 1;
                }
                if self.pos >= self.bytes.len() {
                    return Err(XmlError::UnexpectedEof);
                }
                text.push_str(&String::from_utf8_lossy(&self.bytes[start..self.pos]));
                self.pos += 3;
            } else if self.peek() == Some(b'<') {
                element.children.push(self.parse_element()?);
            } else {
                let start = self.pos;
                while self.peek().is_some_and(|b| b != b'<') {
                    self.pos += 1;
                }
                if self.peek().is_none() {
                    return Err(XmlError::UnexpectedEof);
                }
                text.push_str(&decode_entities(&String::from_utf8_lossy(
                    &self.bytes[start..self.pos],
                )));
            }
        }
    }
}

/// Replaces the predefined entities and numeric character references.
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            out.push_str(rest);
            return out;
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => {
                let code = entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()));
                match code.and_then(char::from_u32) {
                    Some(c) => out.push(c),
                    // Unknown entity: keep the literal text.
                    None => out.push_str(&rest[..=semi]),
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    out.push_str(rest);
    out
}
