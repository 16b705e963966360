//! Mutable geometry aggregate: buffers, buffer views, accessors, meshes.
//!
//! The model mirrors the flat-indexed layout of glTF-style geometry:
//! primitives reference accessors by index, accessors reference buffer
//! views, buffer views reference buffers. Indices arrive from untrusted
//! input, so every lookup goes through the `*_at` helpers, which treat
//! negative or out-of-range indices as absent.

mod merge;
mod types;

pub use types::{
    Accessor, Buffer, BufferView, ComponentType, CompressedMeshExtension, ElementType, Mesh,
    Model, Primitive,
};
