//! Incremental construction of [`JsonValue`] trees from parse events.

use super::JsonValue;
use indexmap::IndexMap;
use thiserror::Error;

/// Errors for event streams that do not describe a well-formed document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("value event with no open container and a completed root")]
    MultipleRoots,
    #[error("value event inside an object with no pending key")]
    ValueWithoutKey,
    #[error("key event outside an object")]
    KeyOutsideObject,
    #[error("container end event does not match the open container")]
    MismatchedEnd,
    #[error("document finished with {open} container(s) still open")]
    UnfinishedDocument { open: usize },
    #[error("document finished without any value")]
    EmptyDocument,
}

/// A container still under construction.
///
/// The build-time cursor is this explicit stack of owned frames rather than
/// pointers into the growing tree; container growth can never invalidate a
/// frame. The stack is never empty while a container is mid-parse.
enum Frame {
    Object {
        map: IndexMap<String, JsonValue>,
        pending_key: Option<String>,
    },
    Array(Vec<JsonValue>),
}

/// Builds a [`JsonValue`] tree from a push-style event stream.
///
/// Feed events in document order, then call [`ValueBuilder::finish`]:
///
/// ```
/// use terrastream::json::{JsonValue, ValueBuilder};
///
/// let mut builder = ValueBuilder::new();
/// builder.object_start().unwrap();
/// builder.key("count").unwrap();
/// builder.uint(3).unwrap();
/// builder.object_end().unwrap();
/// let value = builder.finish().unwrap();
/// assert_eq!(value.get("count").and_then(JsonValue::as_u64), Some(3));
/// ```
#[derive(Default)]
pub struct ValueBuilder {
    stack: Vec<Frame>,
    root: Option<JsonValue>,
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn null(&mut self) -> Result<(), BuildError> {
        self.push_value(JsonValue::Null)
    }

    pub fn bool(&mut self, value: bool) -> Result<(), BuildError> {
        self.push_value(JsonValue::Bool(value))
    }

    pub fn int(&mut self, value: i64) -> Result<(), BuildError> {
        self.push_value(JsonValue::Int(value))
    }

    pub fn uint(&mut self, value: u64) -> Result<(), BuildError> {
        self.push_value(JsonValue::Uint(value))
    }

    pub fn float(&mut self, value: f64) -> Result<(), BuildError> {
        self.push_value(JsonValue::Float(value))
    }

    pub fn string(&mut self, value: impl Into<String>) -> Result<(), BuildError> {
        self.push_value(JsonValue::String(value.into()))
    }

    pub fn object_start(&mut self) -> Result<(), BuildError> {
        self.check_open_slot()?;
        self.stack.push(Frame::Object {
            map: IndexMap::new(),
            pending_key: None,
        });
        Ok(())
    }

    pub fn key(&mut self, key: impl Into<String>) -> Result<(), BuildError> {
        match self.stack.last_mut() {
            Some(Frame::Object { pending_key, .. }) if pending_key.is_none() => {
                *pending_key = Some(key.into());
                Ok(())
            }
            _ => Err(BuildError::KeyOutsideObject),
        }
    }

    pub fn object_end(&mut self) -> Result<(), BuildError> {
        match self.stack.pop() {
            Some(Frame::Object {
                map,
                pending_key: None,
            }) => self.push_value(JsonValue::Object(map)),
            Some(frame) => {
                self.stack.push(frame);
                Err(BuildError::MismatchedEnd)
            }
            None => Err(BuildError::MismatchedEnd),
        }
    }

    pub fn array_start(&mut self) -> Result<(), BuildError> {
        self.check_open_slot()?;
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    pub fn array_end(&mut self) -> Result<(), BuildError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.push_value(JsonValue::Array(items)),
            Some(frame) => {
                self.stack.push(frame);
                Err(BuildError::MismatchedEnd)
            }
            None => Err(BuildError::MismatchedEnd),
        }
    }

    /// Completes the build and returns the document root.
    pub fn finish(self) -> Result<JsonValue, BuildError> {
        if !self.stack.is_empty() {
            return Err(BuildError::UnfinishedDocument {
                open: self.stack.len(),
            });
        }
        self.root.ok_or(BuildError::EmptyDocument)
    }

    /// Verifies a value may start here without attaching it, used before
    /// opening a nested container.
    fn check_open_slot(&self) -> Result<(), BuildError> {
        match self.stack.last() {
            None if self.root.is_some() => Err(BuildError::MultipleRoots),
            None => Ok(()),
            Some(Frame::Array(_)) => Ok(()),
            Some(Frame::Object { pending_key, .. }) => {
                if pending_key.is_some() {
                    Ok(())
                } else {
                    Err(BuildError::ValueWithoutKey)
                }
            }
        }
    }

    /// Attaches a completed value to the innermost open container, or makes
    /// it the root.
    fn push_value(&mut self, value: JsonValue) -> Result<(), BuildError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(BuildError::MultipleRoots);
                }
                self.root = Some(value);
                Ok(())
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Frame::Object { map, pending_key }) => match pending_key.take() {
                Some(key) => {
                    // Keys are unique; a repeated key keeps the last value.
                    map.insert(key, value);
                    Ok(())
                }
                None => Err(BuildError::ValueWithoutKey),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_root() {
        let mut builder = ValueBuilder::new();
        builder.string("hello").unwrap();
        assert_eq!(builder.finish().unwrap(), JsonValue::String("hello".into()));
    }

    #[test]
    fn test_object_with_array_round_trip() {
        // Token stream for {"a":[1,2,3]}
        let mut builder = ValueBuilder::new();
        builder.object_start().unwrap();
        builder.key("a").unwrap();
        builder.array_start().unwrap();
        builder.int(1).unwrap();
        builder.int(2).unwrap();
        builder.int(3).unwrap();
        builder.array_end().unwrap();
        builder.object_end().unwrap();

        let value = builder.finish().unwrap();
        let object = value.as_object().expect("root should be an object");
        assert_eq!(object.len(), 1);
        let items = value.get("a").and_then(JsonValue::as_array).unwrap();
        let numbers: Vec<i64> = items.iter().filter_map(JsonValue::as_i64).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_key_order_preserved() {
        let mut builder = ValueBuilder::new();
        builder.object_start().unwrap();
        for key in ["zulu", "alpha", "mike"] {
            builder.key(key).unwrap();
            builder.null().unwrap();
        }
        builder.object_end().unwrap();
        let value = builder.finish().unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, vec!["zulu", "alpha", "mike"]);
    }

    #[test]
    fn test_nested_containers() {
        let mut builder = ValueBuilder::new();
        builder.array_start().unwrap();
        builder.object_start().unwrap();
        builder.key("ok").unwrap();
        builder.bool(true).unwrap();
        builder.object_end().unwrap();
        builder.array_start().unwrap();
        builder.array_end().unwrap();
        builder.array_end().unwrap();

        let value = builder.finish().unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].get("ok").and_then(JsonValue::as_bool), Some(true));
        assert_eq!(items[1], JsonValue::Array(Vec::new()));
    }

    #[test]
    fn test_value_without_key_rejected() {
        let mut builder = ValueBuilder::new();
        builder.object_start().unwrap();
        assert_eq!(builder.int(1), Err(BuildError::ValueWithoutKey));
    }

    #[test]
    fn test_mismatched_end_rejected() {
        let mut builder = ValueBuilder::new();
        builder.array_start().unwrap();
        assert_eq!(builder.object_end(), Err(BuildError::MismatchedEnd));
        // The array is still open and usable after the failed end.
        builder.int(5).unwrap();
        builder.array_end().unwrap();
        assert!(builder.finish().is_ok());
    }

    #[test]
    fn test_unfinished_document_rejected() {
        let mut builder = ValueBuilder::new();
        builder.object_start().unwrap();
        assert_eq!(
            builder.finish(),
            Err(BuildError::UnfinishedDocument { open: 1 })
        );
    }

    #[test]
    fn test_empty_document_rejected() {
        assert_eq!(ValueBuilder::new().finish(), Err(BuildError::EmptyDocument));
    }
}
