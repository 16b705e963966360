//! Composite container tile decoding.
//!
//! A composite tile is a binary envelope concatenating independently
//! decodable tile blocks, each identified by a 4-byte magic tag. Decoding
//! walks the envelope, dispatches every embedded tile to its
//! format-specific loader through a [`FormatRegistry`] (full fan-out, no
//! ordering between siblings), joins the results on the orchestration
//! thread, and merges the decoded geometry in entry order.
//!
//! Composite tiles come from remote servers and are treated as hostile:
//! every validation failure degrades to an absent or partial result with a
//! warning, never an error. Containers may embed further containers; the
//! registry routes those back into this decoder, with nesting bounded by
//! [`MAX_CONTAINER_DEPTH`] so a buffer embedding itself cannot recurse
//! forever.

mod decode;
mod header;
mod registry;

pub use decode::decode_composite;
pub use header::{
    InnerHeader, OuterHeader, CONTAINER_MAGIC, CONTAINER_VERSION, INNER_HEADER_SIZE,
    OUTER_HEADER_SIZE,
};
pub use registry::{DecodeResult, FormatRegistry, LoadInput, TileContent, TileLoader};

/// Maximum container nesting depth. Deeper entries are dropped with a
/// warning.
pub const MAX_CONTAINER_DEPTH: u32 = 16;
