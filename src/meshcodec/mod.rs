//! Compressed-geometry decompression.
//!
//! Primitives may carry their geometry as an opaque compressed payload
//! instead of plain buffer data. This module bridges between a codec
//! implementation (behind the [`MeshDecoder`] trait) and the model: it
//! validates the compressed buffer view, runs the codec, then rebuilds the
//! primitive's index and vertex attribute data as ordinary buffers appended
//! to the model. Existing buffers are never touched, so accessors that do
//! not participate keep working.
//!
//! Compressed payloads come from remote tiles, so every per-primitive
//! failure is a warning and a skip, never an error for the whole model.

mod decoder;
mod decompress;

pub use decoder::{DecodedAttribute, DecodedMesh, MeshDecodeError, MeshDecoder};
pub use decompress::decompress_model;
