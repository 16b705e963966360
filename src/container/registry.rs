//! Format dispatch: 4-byte magic tag to tile loader.

use super::decode::decode_composite;
use super::header::CONTAINER_MAGIC;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::warn;

use crate::model::Model;
use crate::pipeline::{Future, TaskSystem};

/// Input to a format-specific tile loader.
#[derive(Debug, Clone)]
pub struct LoadInput {
    /// The tile's bytes, starting at its format header.
    pub data: Bytes,
    /// Where the tile came from, for log and warning context.
    pub source: String,
    /// Container nesting depth; 0 for a top-level tile.
    pub depth: u32,
}

impl LoadInput {
    pub fn new(data: Bytes, source: impl Into<String>) -> Self {
        Self {
            data,
            source: source.into(),
            depth: 0,
        }
    }
}

/// Decoded tile content. Exclusively owned by the caller of the decode
/// operation until merged or discarded.
#[derive(Debug, Default)]
pub struct TileContent {
    pub model: Option<Model>,
}

/// Outcome of a decode operation: optional content plus the structured
/// warning list accumulated while producing it. Absent content means "no
/// content", not an error.
#[derive(Debug, Default)]
pub struct DecodeResult {
    pub content: Option<TileContent>,
    pub warnings: Vec<String>,
}

impl DecodeResult {
    /// No content, nothing to report.
    pub fn absent() -> Self {
        Self::default()
    }

    /// No content, with an explanation for the caller.
    pub fn absent_with_warning(warning: impl Into<String>) -> Self {
        Self {
            content: None,
            warnings: vec![warning.into()],
        }
    }

    pub fn with_content(content: TileContent) -> Self {
        Self {
            content: Some(content),
            warnings: Vec::new(),
        }
    }
}

/// A format-specific tile loader. Loaders run their CPU-bound work on the
/// worker pool and resolve their future from wherever the work finishes.
pub type TileLoader =
    Arc<dyn Fn(&TaskSystem, LoadInput) -> Future<DecodeResult> + Send + Sync + 'static>;

/// Registry mapping a tile's 4-byte magic tag to its loader.
///
/// The composite container format registers itself, so containers can embed
/// further containers without the decoder special-casing recursion.
#[derive(Default)]
pub struct FormatRegistry {
    loaders: HashMap<[u8; 4], TileLoader>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a loader for a magic tag, replacing any previous one.
    pub fn register(&mut self, magic: [u8; 4], loader: TileLoader) {
        self.loaders.insert(magic, loader);
    }

    /// Looks up the loader for a magic tag.
    pub fn loader(&self, magic: [u8; 4]) -> Option<TileLoader> {
        self.loaders.get(&magic).cloned()
    }

    /// Finalizes the registry, registering the composite container format
    /// so nested containers dispatch back through it.
    pub fn into_shared(mut self) -> Arc<FormatRegistry> {
        Arc::new_cyclic(|weak: &Weak<FormatRegistry>| {
            let weak = weak.clone();
            self.register(
                CONTAINER_MAGIC,
                Arc::new(move |system, input| match weak.upgrade() {
                    Some(registry) => decode_composite(system, &registry, input),
                    None => {
                        warn!("format registry dropped while a container was decoding");
                        system.resolved(DecodeResult::absent())
                    }
                }),
            );
            self
        })
    }

    /// Dispatches a tile to its loader by the magic tag at the front of its
    /// data. Unknown or missing tags resolve to an absent result with a
    /// warning.
    pub fn dispatch(
        self: &Arc<Self>,
        system: &TaskSystem,
        input: LoadInput,
    ) -> Future<DecodeResult> {
        let Some(magic) = input.data.get(..4) else {
            warn!(source = %input.source, "tile of {} bytes is too short to carry a format tag", input.data.len());
            return system.resolved(DecodeResult::absent_with_warning(format!(
                "Tile from {} is too short to identify a format.",
                input.source
            )));
        };
        let magic: [u8; 4] = [magic[0], magic[1], magic[2], magic[3]];
        match self.loader(magic) {
            Some(loader) => loader(system, input),
            None => {
                warn!(
                    source = %input.source,
                    magic = %String::from_utf8_lossy(&magic),
                    "no loader registered for tile format"
                );
                system.resolved(DecodeResult::absent_with_warning(format!(
                    "Unknown tile format {:?}.",
                    String::from_utf8_lossy(&magic)
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_loader() -> TileLoader {
        Arc::new(|system, _input| system.resolved(DecodeResult::with_content(TileContent::default())))
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut registry = FormatRegistry::new();
        registry.register(*b"mesh", noop_loader());
        let registry = registry.into_shared();
        let system = TaskSystem::new(1);

        let input = LoadInput::new(Bytes::from_static(b"mesh-payload"), "test");
        let result = registry.dispatch(&system, input).wait();
        assert!(result.content.is_some());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_unknown_format_warns() {
        let registry = FormatRegistry::new().into_shared();
        let system = TaskSystem::new(1);
        let input = LoadInput::new(Bytes::from_static(b"xxxx1234"), "test");
        let result = registry.dispatch(&system, input).wait();
        assert!(result.content.is_none());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("Unknown tile format"));
    }

    #[test]
    fn test_truncated_tag_warns() {
        let registry = FormatRegistry::new().into_shared();
        let system = TaskSystem::new(1);
        let input = LoadInput::new(Bytes::from_static(b"ab"), "test");
        let result = registry.dispatch(&system, input).wait();
        assert!(result.content.is_none());
        assert!(result.warnings[0].contains("too short"));
    }

    #[test]
    fn test_container_format_registered_by_into_shared() {
        let registry = FormatRegistry::new().into_shared();
        assert!(registry.loader(CONTAINER_MAGIC).is_some());
    }
}
