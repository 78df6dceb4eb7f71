//! Binding record for one generic attribute slot.

use std::sync::{Arc, Weak};

use crate::device::{AttribPointer, DeviceFeatures, GraphicsDevice};
use crate::source::{ArraySource, DeviceBuffer, SharedArray};
use crate::types::{DataType, UNKNOWN_MODIFIED_COUNT};

/// Explicit pointer description for the legacy binding path.
///
/// Used when there is no [`ArraySource`] to describe the data, so nothing
/// can be cached about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawArray<'a> {
    /// Components per element.
    pub size: i32,
    /// Scalar type of each component.
    pub data_type: DataType,
    /// Byte stride between elements (0 = tightly packed).
    pub stride: i32,
    /// Where the data is read from.
    pub pointer: AttribPointer<'a>,
    /// Whether integer data is normalized.
    pub normalized: bool,
}

impl<'a> RawArray<'a> {
    /// Create a tightly packed, unnormalized description.
    pub fn new(size: i32, data_type: DataType, pointer: AttribPointer<'a>) -> Self {
        Self {
            size,
            data_type,
            stride: 0,
            pointer,
            normalized: false,
        }
    }

    /// Set the byte stride.
    pub fn with_stride(mut self, stride: i32) -> Self {
        self.stride = stride;
        self
    }

    /// Set the normalized flag.
    pub fn with_normalized(mut self, normalized: bool) -> Self {
        self.normalized = normalized;
        self
    }
}

/// What a slot is currently bound to.
#[derive(Debug, Clone)]
pub(crate) enum Binding {
    /// A source, compared by identity.
    Source(Weak<dyn ArraySource>),
    /// A raw pointer with no identity.
    Raw,
}

/// Binding record for one attribute slot.
///
/// Tracks what the slot is bound to, the modification count seen at the
/// last upload, and whether the slot was touched since the last reset.
#[derive(Debug, Clone)]
pub struct ArrayDispatch {
    slot: u32,
    binding: Option<Binding>,
    modified_count: u32,
    active: bool,
}

impl ArrayDispatch {
    /// Create an unbound, inactive record for `slot`.
    pub fn new(slot: u32) -> Self {
        Self {
            slot,
            binding: None,
            modified_count: UNKNOWN_MODIFIED_COUNT,
            active: false,
        }
    }

    /// Slot this record drives.
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Whether the slot was bound since the last reset.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Modification count recorded at the last bind.
    pub fn modified_count(&self) -> u32 {
        self.modified_count
    }

    /// Whether anything (source or raw pointer) is bound.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Whether a source, as opposed to a raw pointer, is bound.
    pub fn has_source(&self) -> bool {
        matches!(self.binding, Some(Binding::Source(_)))
    }

    /// Whether `source` is the bound source.
    pub fn is_bound_to(&self, source: &SharedArray) -> bool {
        match &self.binding {
            Some(Binding::Source(bound)) => {
                std::ptr::addr_eq(Weak::as_ptr(bound), Arc::as_ptr(source))
            }
            _ => false,
        }
    }

    /// The bound source, if it is still alive.
    pub fn bound_source(&self) -> Option<SharedArray> {
        match &self.binding {
            Some(Binding::Source(bound)) => bound.upgrade(),
            _ => None,
        }
    }

    pub(crate) fn bind_source(&mut self, source: &SharedArray) {
        self.binding = Some(Binding::Source(Arc::downgrade(source)));
        self.modified_count = source.modified_count();
    }

    pub(crate) fn bind_raw(&mut self) {
        self.binding = Some(Binding::Raw);
        self.modified_count = UNKNOWN_MODIFIED_COUNT;
    }

    pub(crate) fn clear_binding(&mut self) {
        self.binding = None;
    }

    /// Forget the recorded modification count so the next bind re-points.
    pub(crate) fn invalidate(&mut self) {
        self.modified_count = UNKNOWN_MODIFIED_COUNT;
    }

    // ========================================================================
    // Device calls
    // ========================================================================

    /// Enable the slot, then point it at `source`'s client memory.
    pub fn enable_and_dispatch(&self, device: &mut dyn GraphicsDevice, source: &dyn ArraySource) {
        device.enable_vertex_attrib_array(self.slot);
        self.dispatch(device, source);
    }

    /// Enable the slot, then point it at `source`'s data in `buffer`.
    ///
    /// `buffer` must already be bound to the array target.
    pub fn enable_and_dispatch_buffer(
        &self,
        device: &mut dyn GraphicsDevice,
        source: &dyn ArraySource,
        buffer: DeviceBuffer,
    ) {
        device.enable_vertex_attrib_array(self.slot);
        self.dispatch_buffer(device, source, buffer);
    }

    /// Enable the slot, then issue the pointer call described by `raw`.
    pub fn enable_and_dispatch_raw(&self, device: &mut dyn GraphicsDevice, raw: &RawArray<'_>) {
        device.enable_vertex_attrib_array(self.slot);
        device.vertex_attrib_pointer(
            self.slot,
            raw.size,
            raw.data_type,
            raw.normalized,
            raw.stride,
            raw.pointer,
        );
    }

    /// Point the already enabled slot at `source`'s client memory.
    pub fn dispatch(&self, device: &mut dyn GraphicsDevice, source: &dyn ArraySource) {
        let pointer = AttribPointer::Client(source.data().as_bytes());
        self.upload(device, source, pointer);
    }

    /// Point the already enabled slot at `source`'s data in `buffer`.
    pub fn dispatch_buffer(
        &self,
        device: &mut dyn GraphicsDevice,
        source: &dyn ArraySource,
        buffer: DeviceBuffer,
    ) {
        self.upload(device, source, AttribPointer::Offset(buffer.offset));
    }

    /// Disable the slot.
    pub fn disable(&self, device: &mut dyn GraphicsDevice) {
        device.disable_vertex_attrib_array(self.slot);
    }

    fn upload(&self, device: &mut dyn GraphicsDevice, source: &dyn ArraySource, pointer: AttribPointer<'_>) {
        let size = source.data_size() as i32;
        let data_type = source.data_type();
        let stride = source.stride() as i32;

        if source.preserve_data_type() {
            let features = device.features();
            match data_type {
                DataType::Float | DataType::HalfFloat => {}
                DataType::Double => {
                    if features.contains(DeviceFeatures::DOUBLE_ATTRIBUTES) {
                        device.vertex_attrib_l_pointer(self.slot, size, data_type, stride, pointer);
                        return;
                    }
                    log::debug!(
                        "ArrayDispatch[{}]: double attributes unsupported, converting to float",
                        self.slot
                    );
                }
                _ => {
                    if features.contains(DeviceFeatures::INTEGER_ATTRIBUTES) {
                        device.vertex_attrib_i_pointer(self.slot, size, data_type, stride, pointer);
                        return;
                    }
                    log::debug!(
                        "ArrayDispatch[{}]: integer attributes unsupported, converting {:?} to float",
                        self.slot,
                        data_type
                    );
                }
            }
        }

        device.vertex_attrib_pointer(self.slot, size, data_type, source.normalize(), stride, pointer);
    }
}
