//! Capability document parsing for the discovery phase.

use super::projection::{projection_for_crs, GlobeRectangle, Projection};
use crate::xml::{self, XmlElement, XmlError};
use thiserror::Error;
use tracing::{debug, warn};

/// Level range used when a document yields no usable level bounds.
pub(super) const FALLBACK_MINIMUM_LEVEL: u32 = 0;
pub(super) const FALLBACK_MAXIMUM_LEVEL: u32 = 25;

/// Errors from documents the discovery phase cannot use at all.
///
/// Degraded documents (missing bounding box, missing levels) are not
/// errors; those fields fall back to defaults instead.
#[derive(Debug, Error)]
pub enum CapabilitiesError {
    #[error("capability document is not well-formed XML: {0}")]
    Xml(#[from] XmlError),
    #[error("capability document has no Contents section")]
    MissingContents,
    #[error("capability document does not list tile matrix set {0:?}")]
    UnknownTileMatrixSet(String),
}

/// What the discovery phase learned from a capability document.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredCapabilities {
    pub projection: Projection,
    /// Tile-matrix identifiers in level order, usable as per-level labels.
    pub tile_matrix_labels: Vec<String>,
    pub minimum_level: u32,
    pub maximum_level: u32,
    /// Layer coverage, if the document declared a bounding box.
    pub coverage: Option<GlobeRectangle>,
}

/// Parses a capability document, extracting the projection, level range and
/// coverage for the named tile matrix set.
pub fn parse_capabilities(
    document: &str,
    tile_matrix_set: &str,
) -> Result<DiscoveredCapabilities, CapabilitiesError> {
    let root = xml::parse(document)?;
    let contents = root
        .child("Contents")
        .ok_or(CapabilitiesError::MissingContents)?;

    let matrix_set = contents
        .children_named("TileMatrixSet")
        .find(|set| set.child_text("Identifier") == Some(tile_matrix_set))
        .ok_or_else(|| CapabilitiesError::UnknownTileMatrixSet(tile_matrix_set.to_string()))?;

    let crs = matrix_set.child_text("SupportedCRS").unwrap_or_default();
    let projection = projection_for_crs(crs);

    let tile_matrix_labels: Vec<String> = matrix_set
        .children_named("TileMatrix")
        .filter_map(|matrix| matrix.child_text("Identifier"))
        .map(str::to_string)
        .collect();

    let (minimum_level, maximum_level) = if tile_matrix_labels.is_empty() {
        warn!(
            tile_matrix_set,
            "capability document lists no tile matrices, assuming levels {}-{}",
            FALLBACK_MINIMUM_LEVEL,
            FALLBACK_MAXIMUM_LEVEL
        );
        (FALLBACK_MINIMUM_LEVEL, FALLBACK_MAXIMUM_LEVEL)
    } else {
        (0, tile_matrix_labels.len() as u32 - 1)
    };

    let coverage = contents
        .children_named("Layer")
        .find_map(layer_bounding_box);

    debug!(
        tile_matrix_set,
        ?projection,
        minimum_level,
        maximum_level,
        has_coverage = coverage.is_some(),
        "parsed capability document"
    );

    Ok(DiscoveredCapabilities {
        projection,
        tile_matrix_labels,
        minimum_level,
        maximum_level,
        coverage,
    })
}

/// Reads a layer's bounding box, trying the three alternative element
/// shapes in preference order.
fn layer_bounding_box(layer: &XmlElement) -> Option<GlobeRectangle> {
    for name in ["WGS84BoundingBox", "ows:BoundingBox", "BoundingBox"] {
        if let Some(bounds) = layer.child(name).and_then(corner_rectangle) {
            return Some(bounds);
        }
    }
    None
}

/// Parses `LowerCorner`/`UpperCorner` children, each holding two floats.
fn corner_rectangle(element: &XmlElement) -> Option<GlobeRectangle> {
    let lower = parse_corner(element.child_text("LowerCorner")?)?;
    let upper = parse_corner(element.child_text("UpperCorner")?)?;
    Some(GlobeRectangle {
        west: lower.0,
        south: lower.1,
        east: upper.0,
        north: upper.1,
    })
}

fn parse_corner(text: &str) -> Option<(f64, f64)> {
    let mut parts = text.split_whitespace();
    let first = parts.next()?.parse().ok()?;
    let second = parts.next()?.parse().ok()?;
    Some((first, second))
}
