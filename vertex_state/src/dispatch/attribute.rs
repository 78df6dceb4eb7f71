//! Per-element attribute uploads.
//!
//! A [`TypedAttributeDispatch`] pairs an upload entry point with the slot or
//! fixed attribute it writes to. Binding it to an array's data yields an
//! [`AttributeDispatch`], which uploads one element at a time.

use crate::device::{AttributeTarget, GraphicsDevice};
use crate::source::ArrayData;
use crate::types::{ArrayType, DataType};

/// Single-element upload entry point.
///
/// Each variant fixes the scalar type and component count of the call it
/// stands for (`glVertexAttrib3fv`, `glVertexAttrib4Nubv`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeFunction {
    Float1,
    Float2,
    Float3,
    Float4,
    Double1,
    Double2,
    Double3,
    Double4,
    UByte4Normalized,
}

impl AttributeFunction {
    /// Number of components uploaded per call.
    pub fn components(self) -> usize {
        match self {
            Self::Float1 | Self::Double1 => 1,
            Self::Float2 | Self::Double2 => 2,
            Self::Float3 | Self::Double3 => 3,
            Self::Float4 | Self::Double4 | Self::UByte4Normalized => 4,
        }
    }

    /// Scalar type the entry point reads.
    pub fn data_type(self) -> DataType {
        match self {
            Self::Float1 | Self::Float2 | Self::Float3 | Self::Float4 => DataType::Float,
            Self::Double1 | Self::Double2 | Self::Double3 | Self::Double4 => DataType::Double,
            Self::UByte4Normalized => DataType::UnsignedByte,
        }
    }

    /// Natural entry point for arrays of `array_type`, if there is one.
    pub fn for_array_type(array_type: ArrayType) -> Option<Self> {
        match array_type {
            ArrayType::Float => Some(Self::Float1),
            ArrayType::Vec2 => Some(Self::Float2),
            ArrayType::Vec3 => Some(Self::Float3),
            ArrayType::Vec4 => Some(Self::Float4),
            ArrayType::Double => Some(Self::Double1),
            ArrayType::Vec2d => Some(Self::Double2),
            ArrayType::Vec3d => Some(Self::Double3),
            ArrayType::Vec4d => Some(Self::Double4),
            ArrayType::Vec4ub => Some(Self::UByte4Normalized),
            _ => None,
        }
    }
}

/// Registered upload: entry point, destination and element stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypedAttributeDispatch {
    function: AttributeFunction,
    target: AttributeTarget,
    /// Distance between consecutive elements, in scalars.
    stride: usize,
}

impl TypedAttributeDispatch {
    /// Create a new upload registration.
    pub fn new(function: AttributeFunction, target: AttributeTarget, stride: usize) -> Self {
        Self {
            function,
            target,
            stride,
        }
    }

    /// Get the entry point.
    pub fn function(&self) -> AttributeFunction {
        self.function
    }

    /// Get the destination.
    pub fn target(&self) -> AttributeTarget {
        self.target
    }

    /// Get the element stride in scalars.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bind this upload to `data`.
    ///
    /// Returns `None` if the data's scalar type doesn't match the entry point.
    pub fn bind<'a>(&self, data: ArrayData<'a>) -> Option<AttributeDispatch<'a>> {
        let elements = match (self.function.data_type(), data) {
            (DataType::Float, ArrayData::F32(values)) => Elements::F32(values),
            (DataType::Double, ArrayData::F64(values)) => Elements::F64(values),
            (DataType::UnsignedByte, ArrayData::U8(values)) => Elements::U8(values),
            _ => return None,
        };
        Some(AttributeDispatch {
            upload: *self,
            elements,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Elements<'a> {
    F32(&'a [f32]),
    F64(&'a [f64]),
    U8(&'a [u8]),
}

impl Elements<'_> {
    fn len(&self) -> usize {
        match self {
            Self::F32(values) => values.len(),
            Self::F64(values) => values.len(),
            Self::U8(values) => values.len(),
        }
    }
}

/// An upload bound to an array's data.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDispatch<'a> {
    upload: TypedAttributeDispatch,
    elements: Elements<'a>,
}

impl AttributeDispatch<'_> {
    /// Get the registration this dispatch was bound from.
    pub fn upload(&self) -> TypedAttributeDispatch {
        self.upload
    }

    /// Number of whole elements available.
    pub fn len(&self) -> usize {
        let components = self.upload.function.components();
        let scalars = self.elements.len();
        if scalars < components {
            return 0;
        }
        match self.upload.stride {
            0 => 1,
            stride => (scalars - components) / stride + 1,
        }
    }

    /// Whether no element can be uploaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upload element `index`.
    ///
    /// Returns `false` and issues nothing if `index` is out of range.
    pub fn call(&self, device: &mut dyn GraphicsDevice, index: usize) -> bool {
        let Some(start) = index.checked_mul(self.upload.stride) else {
            return false;
        };
        let Some(end) = start.checked_add(self.upload.function.components()) else {
            return false;
        };
        let target = self.upload.target;

        match self.elements {
            Elements::F32(values) => match values.get(start..end) {
                Some(element) => device.vertex_attrib_f32(target, element),
                None => return false,
            },
            Elements::F64(values) => match values.get(start..end) {
                Some(element) => device.vertex_attrib_f64(target, element),
                None => return false,
            },
            Elements::U8(values) => match values.get(start..end) {
                Some(element) => device.vertex_attrib_u8_normalized(target, element),
                None => return false,
            },
        }
        true
    }
}
