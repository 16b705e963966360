//! Geometry model type definitions.

use indexmap::IndexMap;

/// Numeric component types, with the codes used by the wire format.
///
/// The codes order by width within signedness, which is also the widening
/// order used when an index accessor's declared type cannot represent the
/// decoded point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl ComponentType {
    pub const BYTE: i64 = 5120;
    pub const UNSIGNED_BYTE: i64 = 5121;
    pub const SHORT: i64 = 5122;
    pub const UNSIGNED_SHORT: i64 = 5123;
    pub const UNSIGNED_INT: i64 = 5125;
    pub const FLOAT: i64 = 5126;

    /// Maps a wire-format code to a component type. Unknown codes are the
    /// caller's problem to warn about.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::BYTE => Some(ComponentType::Byte),
            Self::UNSIGNED_BYTE => Some(ComponentType::UnsignedByte),
            Self::SHORT => Some(ComponentType::Short),
            Self::UNSIGNED_SHORT => Some(ComponentType::UnsignedShort),
            Self::UNSIGNED_INT => Some(ComponentType::UnsignedInt),
            Self::FLOAT => Some(ComponentType::Float),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ComponentType::Byte => Self::BYTE,
            ComponentType::UnsignedByte => Self::UNSIGNED_BYTE,
            ComponentType::Short => Self::SHORT,
            ComponentType::UnsignedShort => Self::UNSIGNED_SHORT,
            ComponentType::UnsignedInt => Self::UNSIGNED_INT,
            ComponentType::Float => Self::FLOAT,
        }
    }

    /// Size of one component in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            ComponentType::Byte | ComponentType::UnsignedByte => 1,
            ComponentType::Short | ComponentType::UnsignedShort => 2,
            ComponentType::UnsignedInt | ComponentType::Float => 4,
        }
    }
}

/// Element shapes an accessor can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ElementType {
    #[default]
    Scalar,
    Vec2,
    Vec3,
    Vec4,
}

impl ElementType {
    /// Components per element.
    pub fn component_count(self) -> usize {
        match self {
            ElementType::Scalar => 1,
            ElementType::Vec2 => 2,
            ElementType::Vec3 => 3,
            ElementType::Vec4 => 4,
        }
    }
}

/// A flat byte buffer.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    pub data: Vec<u8>,
}

/// A byte range within a buffer, optionally strided.
#[derive(Debug, Clone, Default)]
pub struct BufferView {
    /// Index of the owning buffer.
    pub buffer: i64,
    pub byte_offset: i64,
    pub byte_length: i64,
    pub byte_stride: Option<i64>,
}

/// A typed view over a buffer view's bytes.
#[derive(Debug, Clone, Default)]
pub struct Accessor {
    /// Index of the buffer view holding the data.
    pub buffer_view: i64,
    pub byte_offset: i64,
    /// Raw component-type code; may be unrecognized in malformed input.
    /// See [`ComponentType::from_code`].
    pub component_type: i64,
    /// Number of elements.
    pub count: i64,
    pub element_type: ElementType,
}

/// Optional compressed-geometry extension on a primitive: the buffer view
/// holding the compressed payload plus a mapping from semantic attribute
/// name to the codec's internal attribute id.
#[derive(Debug, Clone)]
pub struct CompressedMeshExtension {
    pub buffer_view: i64,
    pub attributes: Vec<(String, i64)>,
}

/// One drawable piece of a mesh.
#[derive(Debug, Clone, Default)]
pub struct Primitive {
    /// Semantic attribute name -> accessor index.
    pub attributes: IndexMap<String, i64>,
    /// Index accessor, if the primitive is indexed.
    pub indices: Option<i64>,
    pub compressed: Option<CompressedMeshExtension>,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub primitives: Vec<Primitive>,
}

/// The whole geometry aggregate.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<BufferView>,
    pub accessors: Vec<Accessor>,
    pub meshes: Vec<Mesh>,
}

impl Model {
    /// Bounds-checked buffer lookup; negative indices are absent.
    pub fn buffer_at(&self, index: i64) -> Option<&Buffer> {
        usize::try_from(index).ok().and_then(|i| self.buffers.get(i))
    }

    pub fn buffer_view_at(&self, index: i64) -> Option<&BufferView> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.buffer_views.get(i))
    }

    pub fn accessor_at(&self, index: i64) -> Option<&Accessor> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.accessors.get(i))
    }

    pub fn accessor_at_mut(&mut self, index: i64) -> Option<&mut Accessor> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.accessors.get_mut(i))
    }
}
