//! Common utilities for vertex state integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use redlilium_vertex_state::{
    ArrayData, ArraySource, ArrayType, AttributeAliasing, AttributeArray, ContextId, DataType,
    DeviceBuffer, DeviceCall, RecordingDevice, SharedArray, VertexArrayState,
};

/// Initialize logging once for the test binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A state with the default aliasing fully assigned.
pub fn assigned_state(context_id: ContextId) -> VertexArrayState {
    let mut state = VertexArrayState::new(context_id);
    state
        .assign_all_dispatchers(&AttributeAliasing::new())
        .expect("default aliasing fits");
    state
}

/// A shared float×3 array with `count` elements.
pub fn vec3_source(count: usize) -> Arc<AttributeArray> {
    Arc::new(AttributeArray::vec3(vec![[0.5, 0.25, 1.0]; count]))
}

/// Coerce a concrete source to the shared trait object.
pub fn shared<T: ArraySource + 'static>(source: &Arc<T>) -> SharedArray {
    source.clone()
}

/// Calls addressing `slot`, in order.
pub fn calls_for_slot(device: &RecordingDevice, slot: u32) -> Vec<DeviceCall> {
    device
        .calls()
        .iter()
        .filter(|call| call.slot() == Some(slot))
        .cloned()
        .collect()
}

// ============================================================================
// Test Sources
// ============================================================================

/// Source with an externally driven modification counter and an
/// optional device buffer, for exercising the ArraySource contract
/// without AttributeArray.
pub struct CountingSource {
    values: Vec<f32>,
    modified: AtomicU32,
    buffer: Option<DeviceBuffer>,
}

impl CountingSource {
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            values,
            modified: AtomicU32::new(0),
            buffer: None,
        }
    }

    pub fn with_buffer(mut self, buffer: DeviceBuffer) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn bump(&self) {
        self.modified.fetch_add(1, Ordering::AcqRel);
    }
}

impl ArraySource for CountingSource {
    fn array_type(&self) -> ArrayType {
        ArrayType::Vec2
    }

    fn data_type(&self) -> DataType {
        DataType::Float
    }

    fn modified_count(&self) -> u32 {
        self.modified.load(Ordering::Acquire)
    }

    fn data(&self) -> ArrayData<'_> {
        ArrayData::F32(&self.values)
    }

    fn device_buffer(&self, _context: ContextId) -> Option<DeviceBuffer> {
        self.buffer
    }
}
