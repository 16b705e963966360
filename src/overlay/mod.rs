//! Quadtree-addressed raster overlay configuration and URL resolution.
//!
//! Two-phase protocol. The discovery phase consumes a map service's
//! capability document and derives a projection, tiling scheme, level range
//! and coverage; explicit [`OverlayOptions`] always override discovered
//! values. The resolution phase is a pure function from configuration and
//! [`TileAddress`] to a fetchable image URL, supporting both the
//! key-value-pair dialect and the template dialect.
//!
//! Fetching the capability document and the resolved URLs belongs to an
//! external asset accessor. This module never performs network I/O.

mod capabilities;
mod config;
mod projection;
mod tiling;
mod url;

pub use capabilities::{parse_capabilities, CapabilitiesError, DiscoveredCapabilities};
pub use config::{
    configure, AuthToken, OverlayConfig, OverlayOptions, OverlayParams, DEFAULT_SUBDOMAINS,
    DEFAULT_TILE_SIZE,
};
pub use projection::{projection_for_crs, GlobeRectangle, Projection, Rectangle};
pub use tiling::{TileAddress, TilingScheme};
pub use url::resolve_tile_url;
