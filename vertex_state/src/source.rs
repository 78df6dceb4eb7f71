//! Vertex data sources.
//!
//! An [`ArraySource`] is the CPU-side container of one attribute's data.
//! Sources are owned elsewhere and shared as [`SharedArray`]; the binding
//! cache only keeps weak references plus the last modification count it saw.

use std::sync::Arc;

use crate::types::{ArrayType, BufferHandle, ContextId, DataType};

/// Borrowed, typed view of a source's element data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArrayData<'a> {
    I8(&'a [i8]),
    U8(&'a [u8]),
    I16(&'a [i16]),
    U16(&'a [u16]),
    I32(&'a [i32]),
    U32(&'a [u32]),
    F32(&'a [f32]),
    F64(&'a [f64]),
}

impl<'a> ArrayData<'a> {
    /// Scalar type of the viewed data.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::I8(_) => DataType::Byte,
            Self::U8(_) => DataType::UnsignedByte,
            Self::I16(_) => DataType::Short,
            Self::U16(_) => DataType::UnsignedShort,
            Self::I32(_) => DataType::Int,
            Self::U32(_) => DataType::UnsignedInt,
            Self::F32(_) => DataType::Float,
            Self::F64(_) => DataType::Double,
        }
    }

    /// Number of scalars (not elements) in the view.
    pub fn len(&self) -> usize {
        match self {
            Self::I8(data) => data.len(),
            Self::U8(data) => data.len(),
            Self::I16(data) => data.len(),
            Self::U16(data) => data.len(),
            Self::I32(data) => data.len(),
            Self::U32(data) => data.len(),
            Self::F32(data) => data.len(),
            Self::F64(data) => data.len(),
        }
    }

    /// Whether the view holds no scalars.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of the view, as handed to client-memory pointer calls.
    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            Self::I8(data) => bytemuck::cast_slice(data),
            Self::U8(data) => data,
            Self::I16(data) => bytemuck::cast_slice(data),
            Self::U16(data) => bytemuck::cast_slice(data),
            Self::I32(data) => bytemuck::cast_slice(data),
            Self::U32(data) => bytemuck::cast_slice(data),
            Self::F32(data) => bytemuck::cast_slice(data),
            Self::F64(data) => bytemuck::cast_slice(data),
        }
    }
}

/// A device buffer holding a source's data, with the byte offset of
/// that data inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceBuffer {
    /// Buffer object the data lives in.
    pub handle: BufferHandle,
    /// Byte offset of the first element.
    pub offset: usize,
}

impl DeviceBuffer {
    /// Create a new device buffer reference.
    pub fn new(handle: BufferHandle, offset: usize) -> Self {
        Self { handle, offset }
    }
}

/// CPU-side vertex data bound to an attribute slot.
///
/// Implementations must bump [`modified_count`](Self::modified_count)
/// whenever their contents change; that counter is the only staleness
/// signal the binding cache uses.
pub trait ArraySource: Send + Sync {
    /// Element-type tag.
    fn array_type(&self) -> ArrayType;

    /// Scalar type of each component.
    fn data_type(&self) -> DataType {
        self.array_type().data_type()
    }

    /// Number of components per element.
    fn data_size(&self) -> u32 {
        self.array_type().data_size()
    }

    /// Byte stride between elements (0 = tightly packed).
    fn stride(&self) -> u32 {
        0
    }

    /// Whether integer data is normalized when converted to float.
    fn normalize(&self) -> bool {
        false
    }

    /// Whether integer and double data should reach the shader unconverted.
    fn preserve_data_type(&self) -> bool {
        false
    }

    /// Monotonically increasing modification counter.
    fn modified_count(&self) -> u32;

    /// Typed view of the element data.
    fn data(&self) -> ArrayData<'_>;

    /// Device buffer holding this source's data in `context`, if any.
    ///
    /// Sources that keep device buffers may create them lazily here.
    fn device_buffer(&self, _context: ContextId) -> Option<DeviceBuffer> {
        None
    }
}

/// Shared handle to an array source.
pub type SharedArray = Arc<dyn ArraySource>;
