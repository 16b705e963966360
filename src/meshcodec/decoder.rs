//! The codec seam.

use std::collections::HashMap;
use thiserror::Error;

/// Errors a codec can report for one compressed payload.
#[derive(Debug, Error)]
pub enum MeshDecodeError {
    #[error("compressed payload is malformed: {0}")]
    Malformed(String),
    #[error("compressed payload uses an unsupported geometry type: {0}")]
    UnsupportedGeometry(String),
}

/// One decoded vertex attribute, as component-major doubles. `values`
/// holds `components` doubles per point.
#[derive(Debug, Clone)]
pub struct DecodedAttribute {
    pub components: usize,
    pub values: Vec<f64>,
}

impl DecodedAttribute {
    /// Number of points this attribute covers.
    pub fn point_count(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }
}

/// A decompressed mesh: triangle faces plus per-point attributes keyed by
/// the codec's internal attribute id.
#[derive(Debug, Clone, Default)]
pub struct DecodedMesh {
    pub point_count: u32,
    pub faces: Vec<[u32; 3]>,
    pub attributes: HashMap<i64, DecodedAttribute>,
}

impl DecodedMesh {
    pub fn attribute(&self, id: i64) -> Option<&DecodedAttribute> {
        self.attributes.get(&id)
    }
}

/// A mesh decompression codec. Implementations must be callable from
/// worker threads.
pub trait MeshDecoder: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DecodedMesh, MeshDecodeError>;
}
