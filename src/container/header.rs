//! Fixed-layout container headers.
//!
//! All fields are little-endian. The outer header is followed immediately
//! by the first inner entry; entries are contiguous, and each inner
//! header's `byte_length` covers the header itself plus its payload.

/// Magic tag of the outer container header.
pub const CONTAINER_MAGIC: [u8; 4] = *b"cmpt";

/// The single supported container version.
pub const CONTAINER_VERSION: u32 = 1;

/// Size of the outer header in bytes.
pub const OUTER_HEADER_SIZE: usize = 16;

/// Size of an inner entry header in bytes.
pub const INNER_HEADER_SIZE: usize = 12;

/// Outer container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OuterHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Declared length of the whole container, header included.
    pub byte_length: u32,
    /// Declared number of embedded tiles.
    pub tile_count: u32,
}

impl OuterHeader {
    /// Reads the header from the front of a buffer. `None` when the buffer
    /// is too short to hold one.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < OUTER_HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: [data[0], data[1], data[2], data[3]],
            version: read_u32_le(data, 4),
            byte_length: read_u32_le(data, 8),
            tile_count: read_u32_le(data, 12),
        })
    }
}

/// Header of one embedded tile entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InnerHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Declared length of the entry, this header included.
    pub byte_length: u32,
}

impl InnerHeader {
    /// Reads an entry header from the front of a slice. `None` when the
    /// slice is too short.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < INNER_HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: [data[0], data[1], data[2], data[3]],
            version: read_u32_le(data, 4),
            byte_length: read_u32_le(data, 8),
        })
    }
}

fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
