//! Graphics device abstraction.
//!
//! The binding cache never talks to a graphics API directly. Every state
//! change goes through a [`GraphicsDevice`], which represents one
//! rendering context with its resolved entry points and capabilities.
//!
//! # Available Devices
//!
//! - [`RecordingDevice`]: records every call; used for testing and for
//!   inspecting what a bind sequence would issue.
//!
//! Real backends implement the trait on top of their context objects.

pub mod recording;

pub use recording::{AttribValues, DeviceCall, RecordedPointer, RecordingDevice};

use bitflags::bitflags;

use crate::error::Result;
use crate::types::{BufferHandle, ContextId, DataType, FixedAttribute, VertexArrayHandle};

bitflags! {
    /// Optional capabilities of a device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeviceFeatures: u32 {
        /// Vertex data can live in device buffer objects.
        const BUFFER_OBJECTS = 1 << 0;
        /// Vertex array objects can be created.
        const VERTEX_ARRAY_OBJECTS = 1 << 1;
        /// Integer attributes can be passed unconverted.
        const INTEGER_ATTRIBUTES = 1 << 2;
        /// Double attributes can be passed unconverted.
        const DOUBLE_ATTRIBUTES = 1 << 3;
    }
}

impl Default for DeviceFeatures {
    fn default() -> Self {
        Self::all()
    }
}

/// Where an attribute pointer call reads its data from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttribPointer<'a> {
    /// Client memory, read when the draw is issued.
    Client(&'a [u8]),
    /// Byte offset into the currently bound array buffer.
    Offset(usize),
}

/// Buffer binding points tracked by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    /// Vertex attribute data.
    Array,
    /// Index data.
    ElementArray,
}

impl BufferTarget {
    /// The OpenGL enum value naming this target.
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Array => 0x8892,
            Self::ElementArray => 0x8893,
        }
    }
}

/// Destination of a single-element attribute upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeTarget {
    /// A fixed-function attribute (`glNormal3fv`-style entry points).
    Fixed(FixedAttribute),
    /// A generic attribute slot (`glVertexAttrib*`-style entry points).
    Generic(u32),
}

/// A rendering context as seen by the binding cache.
///
/// All calls are synchronous and must be made on the thread that owns
/// the context.
pub trait GraphicsDevice {
    /// Identity of the context this device represents.
    fn context_id(&self) -> ContextId;

    /// Optional capabilities of this context.
    fn features(&self) -> DeviceFeatures;

    /// Enable the attribute array at `index`.
    fn enable_vertex_attrib_array(&mut self, index: u32);

    /// Disable the attribute array at `index`.
    fn disable_vertex_attrib_array(&mut self, index: u32);

    /// Point `index` at float-converted data.
    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        normalized: bool,
        stride: i32,
        pointer: AttribPointer<'_>,
    );

    /// Point `index` at integer data passed through unconverted.
    fn vertex_attrib_i_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        pointer: AttribPointer<'_>,
    );

    /// Point `index` at double data passed through unconverted.
    fn vertex_attrib_l_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        pointer: AttribPointer<'_>,
    );

    /// Upload one float element to `target`.
    fn vertex_attrib_f32(&mut self, target: AttributeTarget, values: &[f32]);

    /// Upload one double element to `target`.
    fn vertex_attrib_f64(&mut self, target: AttributeTarget, values: &[f64]);

    /// Upload one normalized unsigned byte element to `target`.
    fn vertex_attrib_u8_normalized(&mut self, target: AttributeTarget, values: &[u8]);

    /// Bind `buffer` (or nothing) to `target`.
    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>);

    /// Create a vertex array object.
    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle>;

    /// Delete a vertex array object.
    fn delete_vertex_array(&mut self, handle: VertexArrayHandle);

    /// Bind a vertex array object, or the default one.
    fn bind_vertex_array(&mut self, handle: Option<VertexArrayHandle>);
}
