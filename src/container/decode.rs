//! The composite decode operation.

use super::header::{
    InnerHeader, OuterHeader, CONTAINER_MAGIC, CONTAINER_VERSION, INNER_HEADER_SIZE,
    OUTER_HEADER_SIZE,
};
use super::registry::{DecodeResult, FormatRegistry, LoadInput, TileContent};
use super::MAX_CONTAINER_DEPTH;
use crate::pipeline::{Future, TaskSystem};
use std::sync::Arc;
use tracing::warn;

/// Decodes a composite container tile.
///
/// Embedded entries are sliced out of the buffer and dispatched through
/// the registry without waiting on one another; the returned future
/// resolves on the orchestration thread once every entry has, carrying the
/// merged geometry. Malformed input degrades to an absent or partial
/// result with warnings; this operation never fails.
pub fn decode_composite(
    system: &TaskSystem,
    registry: &Arc<FormatRegistry>,
    input: LoadInput,
) -> Future<DecodeResult> {
    let data = &input.data;
    let source = input.source.clone();

    if input.depth >= MAX_CONTAINER_DEPTH {
        warn!(source = %source, depth = input.depth, "container nesting too deep, dropping");
        return system.resolved(DecodeResult::absent_with_warning(format!(
            "Composite tile from {} exceeds the maximum nesting depth of {}.",
            source, MAX_CONTAINER_DEPTH
        )));
    }

    let Some(header) = OuterHeader::parse(data) else {
        warn!(source = %source, len = data.len(), "composite tile shorter than its header");
        return system.resolved(DecodeResult::absent_with_warning(format!(
            "Composite tile from {} must be at least {} bytes.",
            source, OUTER_HEADER_SIZE
        )));
    };

    if header.magic != CONTAINER_MAGIC {
        warn!(source = %source, "composite tile does not have the expected magic value");
        return system.resolved(DecodeResult::absent_with_warning(
            "Composite tile does not have the expected magic value \"cmpt\".",
        ));
    }

    if header.version != CONTAINER_VERSION {
        warn!(source = %source, version = header.version, "unsupported composite tile version");
        return system.resolved(DecodeResult::absent_with_warning(format!(
            "Unsupported composite tile version {}.",
            header.version
        )));
    }

    let declared = header.byte_length as usize;
    if declared > data.len() {
        warn!(
            source = %source,
            declared,
            actual = data.len(),
            "composite tile byte length exceeds the available bytes"
        );
        return system.resolved(DecodeResult::absent_with_warning(format!(
            "Composite tile byteLength is {} but only {} bytes are available.",
            declared,
            data.len()
        )));
    }

    // Walk the embedded entries. A truncated or overrunning entry stops the
    // walk; whatever was sliced before it still decodes.
    let mut warnings = Vec::new();
    let mut entries = Vec::new();
    let mut pos = OUTER_HEADER_SIZE;
    while pos < declared {
        let inner = match InnerHeader::parse(&data[pos..declared]) {
            Some(inner) => inner,
            None => {
                warn!(source = %source, pos, "composite tile ends before all embedded tiles could be read");
                warnings.push(
                    "Composite tile ends before all embedded tiles could be read.".to_string(),
                );
                break;
            }
        };
        let length = inner.byte_length as usize;
        if length < INNER_HEADER_SIZE || pos + length > declared {
            warn!(source = %source, pos, length, "embedded tile length is invalid");
            warnings
                .push("Composite tile ends before all embedded tiles could be read.".to_string());
            break;
        }
        entries.push(data.slice(pos..pos + length));
        pos += length;
    }

    // Full fan-out: every entry dispatches before any result is awaited.
    let dispatched: Vec<Future<DecodeResult>> = entries
        .into_iter()
        .map(|entry| {
            registry.dispatch(
                system,
                LoadInput {
                    data: entry,
                    source: input.source.clone(),
                    depth: input.depth + 1,
                },
            )
        })
        .collect();

    let tile_count = header.tile_count;
    system
        .join_all(dispatched)
        .then_on_orchestrator(move |results| merge_results(tile_count, &source, warnings, results))
}

/// Collects inner results in entry order and merges their geometry.
fn merge_results(
    declared_tile_count: u32,
    source: &str,
    mut warnings: Vec<String>,
    results: Vec<DecodeResult>,
) -> DecodeResult {
    let mut contents: Vec<TileContent> = Vec::new();
    for mut result in results {
        warnings.append(&mut result.warnings);
        if let Some(content) = result.content {
            contents.push(content);
        }
    }

    let mut iter = contents.into_iter();
    let Some(mut accumulator) = iter.next() else {
        if declared_tile_count > 0 {
            warn!(source = %source, "composite tile does not contain any loadable inner tiles");
            warnings.push("Composite tile does not contain any loadable inner tiles.".to_string());
        }
        return DecodeResult {
            content: None,
            warnings,
        };
    };

    // The first decoded tile is the accumulator; later models merge into
    // it, model-less results are skipped.
    for content in iter {
        if let Some(model) = content.model {
            match &mut accumulator.model {
                Some(accumulated) => accumulated.merge(model),
                None => accumulator.model = Some(model),
            }
        }
    }

    DecodeResult {
        content: Some(accumulator),
        warnings,
    }
}
