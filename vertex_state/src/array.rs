//! Owned attribute arrays.
//!
//! [`AttributeArray`] is a ready-made [`ArraySource`]: typed storage, the
//! flags the dispatch path reads, an atomic modification counter and an
//! optional device buffer per context.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::RwLock;

use crate::error::{Result, VertexStateError};
use crate::source::{ArrayData, ArraySource, DeviceBuffer};
use crate::types::{ArrayType, ContextId, DataType};

/// Owned typed storage of an [`AttributeArray`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayStorage {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ArrayStorage {
    /// Borrow the storage as a typed view.
    pub fn as_data(&self) -> ArrayData<'_> {
        match self {
            Self::I8(data) => ArrayData::I8(data),
            Self::U8(data) => ArrayData::U8(data),
            Self::I16(data) => ArrayData::I16(data),
            Self::U16(data) => ArrayData::U16(data),
            Self::I32(data) => ArrayData::I32(data),
            Self::U32(data) => ArrayData::U32(data),
            Self::F32(data) => ArrayData::F32(data),
            Self::F64(data) => ArrayData::F64(data),
        }
    }
}

/// A vertex attribute array owned on the CPU.
///
/// # Example
///
/// ```ignore
/// let positions: SharedArray = Arc::new(AttributeArray::vec3(vec![[0.0, 0.0, 0.0]; 3]));
/// state.set_vertex_array(&mut device, Some(&positions))?;
/// ```
#[derive(Debug)]
pub struct AttributeArray {
    array_type: ArrayType,
    storage: ArrayStorage,
    stride: u32,
    normalize: bool,
    preserve_data_type: bool,
    modified_count: AtomicU32,
    /// Device buffers, indexed by context id.
    buffers: RwLock<Vec<Option<DeviceBuffer>>>,
}

impl AttributeArray {
    /// Create an array, checking that the storage matches the tag.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::InvalidParameter`] if the storage scalar
    /// type differs from `array_type`'s, or the scalar count is not a
    /// multiple of its component count.
    pub fn new(array_type: ArrayType, storage: ArrayStorage) -> Result<Self> {
        check_storage(array_type, &storage)?;
        Ok(Self::from_parts(array_type, storage))
    }

    fn from_parts(array_type: ArrayType, storage: ArrayStorage) -> Self {
        Self {
            array_type,
            storage,
            stride: 0,
            normalize: false,
            preserve_data_type: false,
            modified_count: AtomicU32::new(0),
            buffers: RwLock::new(Vec::new()),
        }
    }

    /// Scalar float array.
    pub fn floats(values: Vec<f32>) -> Self {
        Self::from_parts(ArrayType::Float, ArrayStorage::F32(values))
    }

    /// Scalar double array.
    pub fn doubles(values: Vec<f64>) -> Self {
        Self::from_parts(ArrayType::Double, ArrayStorage::F64(values))
    }

    /// Two-component float array.
    pub fn vec2(values: Vec<[f32; 2]>) -> Self {
        Self::from_parts(ArrayType::Vec2, ArrayStorage::F32(flatten(&values)))
    }

    /// Three-component float array.
    pub fn vec3(values: Vec<[f32; 3]>) -> Self {
        Self::from_parts(ArrayType::Vec3, ArrayStorage::F32(flatten(&values)))
    }

    /// Four-component float array.
    pub fn vec4(values: Vec<[f32; 4]>) -> Self {
        Self::from_parts(ArrayType::Vec4, ArrayStorage::F32(flatten(&values)))
    }

    /// Four-component unsigned byte array (normalized, typically colors).
    pub fn vec4ub(values: Vec<[u8; 4]>) -> Self {
        Self::from_parts(ArrayType::Vec4ub, ArrayStorage::U8(flatten(&values))).with_normalize(true)
    }

    /// Set the byte stride between elements.
    pub fn with_stride(mut self, stride: u32) -> Self {
        self.stride = stride;
        self
    }

    /// Set whether integer data is normalized.
    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Set whether integer/double data reaches the shader unconverted.
    pub fn with_preserve_data_type(mut self, preserve: bool) -> Self {
        self.preserve_data_type = preserve;
        self
    }

    /// Get the storage.
    pub fn storage(&self) -> &ArrayStorage {
        &self.storage
    }

    /// Replace the storage and mark the array modified.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::InvalidParameter`] if the new storage
    /// does not match this array's type or ends in a partial element.
    pub fn set_storage(&mut self, storage: ArrayStorage) -> Result<()> {
        check_storage(self.array_type, &storage)?;
        self.storage = storage;
        self.dirty();
        Ok(())
    }

    /// Number of whole elements.
    pub fn element_count(&self) -> usize {
        self.storage.as_data().len() / self.array_type.data_size() as usize
    }

    /// Mark the contents modified so cached bindings are refreshed.
    pub fn dirty(&self) {
        self.modified_count.fetch_add(1, Ordering::AcqRel);
    }

    /// Record the device buffer holding this array's data in `context`.
    pub fn assign_device_buffer(&self, context: ContextId, buffer: DeviceBuffer) {
        let mut buffers = self.buffers.write();
        let index = context as usize;
        if index >= buffers.len() {
            buffers.resize(index + 1, None);
        }
        buffers[index] = Some(buffer);
        log::trace!(
            "AttributeArray: context {} uses buffer {:?} at offset {}",
            context,
            buffer.handle,
            buffer.offset
        );
    }

    /// Forget the device buffer for `context`, returning it.
    pub fn release_device_buffer(&self, context: ContextId) -> Option<DeviceBuffer> {
        self.buffers
            .write()
            .get_mut(context as usize)
            .and_then(Option::take)
    }
}

impl ArraySource for AttributeArray {
    fn array_type(&self) -> ArrayType {
        self.array_type
    }

    fn data_type(&self) -> DataType {
        self.array_type.data_type()
    }

    fn stride(&self) -> u32 {
        self.stride
    }

    fn normalize(&self) -> bool {
        self.normalize
    }

    fn preserve_data_type(&self) -> bool {
        self.preserve_data_type
    }

    fn modified_count(&self) -> u32 {
        self.modified_count.load(Ordering::Acquire)
    }

    fn data(&self) -> ArrayData<'_> {
        self.storage.as_data()
    }

    fn device_buffer(&self, context: ContextId) -> Option<DeviceBuffer> {
        self.buffers.read().get(context as usize).copied().flatten()
    }
}

fn check_storage(array_type: ArrayType, storage: &ArrayStorage) -> Result<()> {
    let data = storage.as_data();
    if data.data_type() != array_type.data_type() {
        return Err(VertexStateError::InvalidParameter(format!(
            "{:?} array cannot hold {:?} data",
            array_type,
            data.data_type()
        )));
    }
    if data.len() % array_type.data_size() as usize != 0 {
        return Err(VertexStateError::InvalidParameter(format!(
            "{} scalars do not form whole {:?} elements",
            data.len(),
            array_type
        )));
    }
    Ok(())
}

fn flatten<T: Copy, const N: usize>(values: &[[T; N]]) -> Vec<T> {
    values.iter().flat_map(|v| v.iter().copied()).collect()
}

static_assertions::assert_impl_all!(AttributeArray: Send, Sync);
