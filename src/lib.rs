//! TerraStream - Streaming and assembly of hierarchical 3D geospatial tiles
//!
//! This library provides the content-acquisition core of a level-of-detail
//! tile streaming engine: it decodes composite container tiles that embed
//! other tile formats, resolves per-tile imagery URLs against multiple
//! map-service addressing dialects, and reconstructs compressed mesh
//! payloads into renderable buffers.
//!
//! # Architecture
//!
//! Everything is built on the [`pipeline`] task system, which provides
//! futures with explicit thread affinity: results are finalized on a single
//! orchestration thread while CPU-bound decode work runs on a worker pool.
//!
//! - [`container`] - composite tile decoding with registry-based format
//!   dispatch and geometry merging
//! - [`overlay`] - quadtree raster overlay configuration and tile URL
//!   resolution (key-value and template dialects)
//! - [`meshcodec`] - reconstruction of index/attribute buffers from an
//!   external mesh codec's decoded output
//! - [`model`] - the mutable geometry aggregate (buffers, buffer views,
//!   accessors, meshes)
//! - [`json`] - generic JSON value trees built from push-style parse events
//!
//! Network I/O is deliberately absent: the overlay resolver produces URLs
//! for an external asset fetcher, and the container decoder consumes byte
//! buffers the caller already holds.

pub mod container;
pub mod json;
pub mod logging;
pub mod meshcodec;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod xml;

/// Version of the TerraStream library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
