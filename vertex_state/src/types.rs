//! Scalar, handle and tag types shared across the crate.

/// Identifier of a rendering context.
pub type ContextId = u32;

/// Modification count stamped on bindings whose source cannot be tracked.
pub const UNKNOWN_MODIFIED_COUNT: u32 = u32::MAX;

/// Device-side name of a buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(u32);

impl BufferHandle {
    /// Wrap a raw device buffer name.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw device buffer name.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Device-side name of a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayHandle(u32);

impl VertexArrayHandle {
    /// Wrap a raw vertex array object name.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw vertex array object name.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Scalar type of the components stored in an array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Signed 8-bit integer.
    Byte,
    /// Unsigned 8-bit integer.
    UnsignedByte,
    /// Signed 16-bit integer.
    Short,
    /// Unsigned 16-bit integer.
    UnsignedShort,
    /// Signed 32-bit integer.
    Int,
    /// Unsigned 32-bit integer.
    UnsignedInt,
    /// 16-bit float.
    HalfFloat,
    /// 32-bit float.
    Float,
    /// 64-bit float.
    Double,
}

impl DataType {
    /// The OpenGL enum value naming this type.
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Byte => 0x1400,
            Self::UnsignedByte => 0x1401,
            Self::Short => 0x1402,
            Self::UnsignedShort => 0x1403,
            Self::Int => 0x1404,
            Self::UnsignedInt => 0x1405,
            Self::Float => 0x1406,
            Self::Double => 0x140A,
            Self::HalfFloat => 0x140B,
        }
    }

    /// Size of one component in bytes.
    pub fn size_in_bytes(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort | Self::HalfFloat => 2,
            Self::Int | Self::UnsignedInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// Whether this is an integer type.
    pub fn is_integer(self) -> bool {
        !self.is_floating_point()
    }

    /// Whether this is a floating point type.
    pub fn is_floating_point(self) -> bool {
        matches!(self, Self::HalfFloat | Self::Float | Self::Double)
    }
}

/// Element-type tag of an array: scalar type plus component count.
///
/// The discriminant doubles as the index into an
/// [`AttributeDispatchTable`](crate::dispatch::AttributeDispatchTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ArrayType {
    Byte,
    Short,
    Int,
    UByte,
    UShort,
    UInt,
    Float,
    Double,
    Vec2b,
    Vec3b,
    Vec4b,
    Vec2s,
    Vec3s,
    Vec4s,
    Vec2i,
    Vec3i,
    Vec4i,
    Vec2ub,
    Vec3ub,
    Vec4ub,
    Vec2us,
    Vec3us,
    Vec4us,
    Vec2ui,
    Vec3ui,
    Vec4ui,
    Vec2,
    Vec3,
    Vec4,
    Vec2d,
    Vec3d,
    Vec4d,
}

impl ArrayType {
    /// Index of this tag in dispatch tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Scalar type of each component.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Byte | Self::Vec2b | Self::Vec3b | Self::Vec4b => DataType::Byte,
            Self::Short | Self::Vec2s | Self::Vec3s | Self::Vec4s => DataType::Short,
            Self::Int | Self::Vec2i | Self::Vec3i | Self::Vec4i => DataType::Int,
            Self::UByte | Self::Vec2ub | Self::Vec3ub | Self::Vec4ub => DataType::UnsignedByte,
            Self::UShort | Self::Vec2us | Self::Vec3us | Self::Vec4us => DataType::UnsignedShort,
            Self::UInt | Self::Vec2ui | Self::Vec3ui | Self::Vec4ui => DataType::UnsignedInt,
            Self::Float | Self::Vec2 | Self::Vec3 | Self::Vec4 => DataType::Float,
            Self::Double | Self::Vec2d | Self::Vec3d | Self::Vec4d => DataType::Double,
        }
    }

    /// Number of components per element.
    pub fn data_size(self) -> u32 {
        match self {
            Self::Byte
            | Self::Short
            | Self::Int
            | Self::UByte
            | Self::UShort
            | Self::UInt
            | Self::Float
            | Self::Double => 1,
            Self::Vec2b
            | Self::Vec2s
            | Self::Vec2i
            | Self::Vec2ub
            | Self::Vec2us
            | Self::Vec2ui
            | Self::Vec2
            | Self::Vec2d => 2,
            Self::Vec3b
            | Self::Vec3s
            | Self::Vec3i
            | Self::Vec3ub
            | Self::Vec3us
            | Self::Vec3ui
            | Self::Vec3
            | Self::Vec3d => 3,
            Self::Vec4b
            | Self::Vec4s
            | Self::Vec4i
            | Self::Vec4ub
            | Self::Vec4us
            | Self::Vec4ui
            | Self::Vec4
            | Self::Vec4d => 4,
        }
    }

    /// Size of one element in bytes.
    pub fn element_size(self) -> usize {
        self.data_type().size_in_bytes() * self.data_size() as usize
    }
}

/// Conventionally named per-vertex attributes that are aliased onto
/// generic attribute slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedAttribute {
    /// Vertex position.
    Vertex,
    /// Vertex normal.
    Normal,
    /// Primary color.
    Color,
    /// Secondary color.
    SecondaryColor,
    /// Fog coordinate.
    FogCoord,
}

impl FixedAttribute {
    /// Every fixed attribute, in table order.
    pub const ALL: [FixedAttribute; 5] = [
        Self::Vertex,
        Self::Normal,
        Self::Color,
        Self::SecondaryColor,
        Self::FogCoord,
    ];

    /// Position of this attribute in per-attribute tables.
    pub fn index(self) -> usize {
        match self {
            Self::Vertex => 0,
            Self::Normal => 1,
            Self::Color => 2,
            Self::SecondaryColor => 3,
            Self::FogCoord => 4,
        }
    }
}
