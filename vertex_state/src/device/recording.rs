//! Recording device for testing and development.
//!
//! This device doesn't talk to a GPU. It records every call it receives
//! so tests can assert exactly which state changes a bind sequence issued.

use crate::error::{Result, VertexStateError};
use crate::types::{BufferHandle, ContextId, DataType, VertexArrayHandle};

use super::{AttribPointer, AttributeTarget, BufferTarget, DeviceFeatures, GraphicsDevice};

/// Pointer argument of a recorded attribute pointer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedPointer {
    /// Client memory: address and length of the slice.
    Client { address: usize, len: usize },
    /// Byte offset into the bound array buffer.
    Offset(usize),
}

impl From<AttribPointer<'_>> for RecordedPointer {
    fn from(pointer: AttribPointer<'_>) -> Self {
        match pointer {
            AttribPointer::Client(data) => Self::Client {
                address: data.as_ptr() as usize,
                len: data.len(),
            },
            AttribPointer::Offset(offset) => Self::Offset(offset),
        }
    }
}

/// Values of a recorded single-element upload.
#[derive(Debug, Clone, PartialEq)]
pub enum AttribValues {
    F32(Vec<f32>),
    F64(Vec<f64>),
    U8Normalized(Vec<u8>),
}

/// A call received by a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    EnableVertexAttribArray(u32),
    DisableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        data_type: DataType,
        normalized: bool,
        stride: i32,
        pointer: RecordedPointer,
    },
    VertexAttribIPointer {
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        pointer: RecordedPointer,
    },
    VertexAttribLPointer {
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        pointer: RecordedPointer,
    },
    VertexAttrib {
        target: AttributeTarget,
        values: AttribValues,
    },
    BindBuffer {
        target: BufferTarget,
        buffer: Option<BufferHandle>,
    },
    CreateVertexArray(VertexArrayHandle),
    DeleteVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
}

impl DeviceCall {
    /// Whether this is any of the attribute pointer calls.
    pub fn is_pointer_call(&self) -> bool {
        matches!(
            self,
            Self::VertexAttribPointer { .. }
                | Self::VertexAttribIPointer { .. }
                | Self::VertexAttribLPointer { .. }
        )
    }

    /// Attribute slot this call addresses, if it addresses one.
    pub fn slot(&self) -> Option<u32> {
        match self {
            Self::EnableVertexAttribArray(index)
            | Self::DisableVertexAttribArray(index)
            | Self::VertexAttribPointer { index, .. }
            | Self::VertexAttribIPointer { index, .. }
            | Self::VertexAttribLPointer { index, .. } => Some(*index),
            Self::VertexAttrib {
                target: AttributeTarget::Generic(index),
                ..
            } => Some(*index),
            _ => None,
        }
    }
}

type DeleteHook = Box<dyn FnMut(VertexArrayHandle) + Send>;

/// Device that records calls instead of executing them.
pub struct RecordingDevice {
    context_id: ContextId,
    features: DeviceFeatures,
    calls: Vec<DeviceCall>,
    next_vertex_array: u32,
    fail_vertex_array_creation: bool,
    on_delete: Option<DeleteHook>,
}

impl std::fmt::Debug for RecordingDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingDevice")
            .field("context_id", &self.context_id)
            .field("features", &self.features)
            .field("calls", &self.calls.len())
            .finish_non_exhaustive()
    }
}

impl RecordingDevice {
    /// Create a recording device for `context_id` with every feature enabled.
    pub fn new(context_id: ContextId) -> Self {
        Self {
            context_id,
            features: DeviceFeatures::all(),
            calls: Vec::new(),
            next_vertex_array: 1,
            fail_vertex_array_creation: false,
            on_delete: None,
        }
    }

    /// Restrict the reported feature set.
    pub fn with_features(mut self, features: DeviceFeatures) -> Self {
        self.features = features;
        self
    }

    /// Make vertex array object creation fail.
    pub fn with_failing_vertex_arrays(mut self) -> Self {
        self.fail_vertex_array_creation = true;
        self
    }

    /// Run `hook` whenever a vertex array object is deleted.
    pub fn on_delete_vertex_array(
        mut self,
        hook: impl FnMut(VertexArrayHandle) + Send + 'static,
    ) -> Self {
        self.on_delete = Some(Box::new(hook));
        self
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// Forget recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.len()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(*call)).count()
    }

    /// Number of enable calls.
    pub fn enable_count(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::EnableVertexAttribArray(_)))
    }

    /// Number of disable calls.
    pub fn disable_count(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::DisableVertexAttribArray(_)))
    }

    /// Number of attribute pointer calls of any flavour.
    pub fn pointer_count(&self) -> usize {
        self.count(DeviceCall::is_pointer_call)
    }

    /// Number of buffer bind calls.
    pub fn bind_buffer_count(&self) -> usize {
        self.count(|call| matches!(call, DeviceCall::BindBuffer { .. }))
    }

    /// Slots that received a disable call, in call order.
    pub fn disabled_slots(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::DisableVertexAttribArray(index) => Some(*index),
                _ => None,
            })
            .collect()
    }

    fn record(&mut self, call: DeviceCall) {
        log::trace!("RecordingDevice[{}]: {:?}", self.context_id, call);
        self.calls.push(call);
    }
}

impl GraphicsDevice for RecordingDevice {
    fn context_id(&self) -> ContextId {
        self.context_id
    }

    fn features(&self) -> DeviceFeatures {
        self.features
    }

    fn enable_vertex_attrib_array(&mut self, index: u32) {
        self.record(DeviceCall::EnableVertexAttribArray(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: u32) {
        self.record(DeviceCall::DisableVertexAttribArray(index));
    }

    fn vertex_attrib_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        normalized: bool,
        stride: i32,
        pointer: AttribPointer<'_>,
    ) {
        self.record(DeviceCall::VertexAttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            pointer: pointer.into(),
        });
    }

    fn vertex_attrib_i_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        pointer: AttribPointer<'_>,
    ) {
        self.record(DeviceCall::VertexAttribIPointer {
            index,
            size,
            data_type,
            stride,
            pointer: pointer.into(),
        });
    }

    fn vertex_attrib_l_pointer(
        &mut self,
        index: u32,
        size: i32,
        data_type: DataType,
        stride: i32,
        pointer: AttribPointer<'_>,
    ) {
        self.record(DeviceCall::VertexAttribLPointer {
            index,
            size,
            data_type,
            stride,
            pointer: pointer.into(),
        });
    }

    fn vertex_attrib_f32(&mut self, target: AttributeTarget, values: &[f32]) {
        self.record(DeviceCall::VertexAttrib {
            target,
            values: AttribValues::F32(values.to_vec()),
        });
    }

    fn vertex_attrib_f64(&mut self, target: AttributeTarget, values: &[f64]) {
        self.record(DeviceCall::VertexAttrib {
            target,
            values: AttribValues::F64(values.to_vec()),
        });
    }

    fn vertex_attrib_u8_normalized(&mut self, target: AttributeTarget, values: &[u8]) {
        self.record(DeviceCall::VertexAttrib {
            target,
            values: AttribValues::U8Normalized(values.to_vec()),
        });
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.record(DeviceCall::BindBuffer { target, buffer });
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayHandle> {
        if !self.features.contains(DeviceFeatures::VERTEX_ARRAY_OBJECTS) {
            return Err(VertexStateError::FeatureNotSupported(
                "vertex array objects".to_string(),
            ));
        }
        if self.fail_vertex_array_creation {
            return Err(VertexStateError::ResourceCreationFailed(
                "vertex array object".to_string(),
            ));
        }
        let handle = VertexArrayHandle::new(self.next_vertex_array);
        self.next_vertex_array += 1;
        self.record(DeviceCall::CreateVertexArray(handle));
        Ok(handle)
    }

    fn delete_vertex_array(&mut self, handle: VertexArrayHandle) {
        self.record(DeviceCall::DeleteVertexArray(handle));
        if let Some(hook) = self.on_delete.as_mut() {
            hook(handle);
        }
    }

    fn bind_vertex_array(&mut self, handle: Option<VertexArrayHandle>) {
        self.record(DeviceCall::BindVertexArray(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_records_calls_in_order() {
        let mut device = RecordingDevice::new(0);
        device.enable_vertex_attrib_array(2);
        device.vertex_attrib_pointer(2, 3, DataType::Float, false, 0, AttribPointer::Offset(16));
        device.disable_vertex_attrib_array(2);

        assert_eq!(device.call_count(), 3);
        assert_eq!(device.enable_count(), 1);
        assert_eq!(device.pointer_count(), 1);
        assert_eq!(device.disabled_slots(), vec![2]);
        assert_eq!(
            device.calls()[1],
            DeviceCall::VertexAttribPointer {
                index: 2,
                size: 3,
                data_type: DataType::Float,
                normalized: false,
                stride: 0,
                pointer: RecordedPointer::Offset(16),
            }
        );
    }

    #[test]
    fn test_vertex_array_creation_respects_features() {
        let mut device = RecordingDevice::new(0).with_features(DeviceFeatures::BUFFER_OBJECTS);
        assert!(matches!(
            device.create_vertex_array(),
            Err(VertexStateError::FeatureNotSupported(_))
        ));

        let mut device = RecordingDevice::new(0).with_failing_vertex_arrays();
        assert!(matches!(
            device.create_vertex_array(),
            Err(VertexStateError::ResourceCreationFailed(_))
        ));
        assert_eq!(device.call_count(), 0);
    }

    #[test]
    fn test_vertex_array_handles_are_unique() {
        let mut device = RecordingDevice::new(0);
        let a = device.create_vertex_array().unwrap();
        let b = device.create_vertex_array().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_delete_hook_runs() {
        let deleted = Arc::new(AtomicUsize::new(0));
        let counter = deleted.clone();
        let mut device = RecordingDevice::new(0).on_delete_vertex_array(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handle = device.create_vertex_array().unwrap();
        device.delete_vertex_array(handle);
        assert_eq!(deleted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_take_calls_empties_log() {
        let mut device = RecordingDevice::new(3);
        device.bind_buffer(BufferTarget::Array, Some(BufferHandle::new(1)));
        assert_eq!(device.take_calls().len(), 1);
        assert_eq!(device.call_count(), 0);
        assert_eq!(device.context_id(), 3);
    }
}
