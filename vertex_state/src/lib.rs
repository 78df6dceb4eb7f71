//! # RedLilium Vertex State
//!
//! Per-context cache of vertex attribute bindings.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`VertexArrayState`] - Diffs attribute bindings and only issues the device calls that change something
//! - [`VertexArrayStateManager`] - Deletes released states' vertex array objects within a time budget
//! - [`VertexArrayStateList`] - One state per context, with configuration fan-out
//! - [`dispatch`] - Per-slot binding records and per-element upload tables
//! - [`GraphicsDevice`] - Trait the cache issues its calls through, plus a [`RecordingDevice`] for testing
//!
//! ## Example
//!
//! ```ignore
//! use redlilium_vertex_state::{AttributeArray, SharedArray, VertexArrayStateList, VertexStateConfig};
//!
//! let config = VertexStateConfig::new();
//! let mut states = VertexArrayStateList::with_config(&config);
//! let positions: SharedArray = Arc::new(AttributeArray::vec3(vertices));
//!
//! let state = states.get_or_create(&mut device, &config)?;
//! state.set_vertex_array(&mut device, Some(&positions))?;
//! // draw...
//! state.reset(&mut device);
//! ```

pub mod array;
pub mod clock;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod list;
pub mod manager;
pub mod source;
pub mod state;
pub mod types;

// Re-export main types for convenience
pub use array::{ArrayStorage, AttributeArray};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AttributeAliasing, VertexStateConfig};
pub use device::{
    AttribPointer, AttributeTarget, BufferTarget, DeviceCall, DeviceFeatures, GraphicsDevice,
    RecordingDevice,
};
pub use dispatch::{
    ArrayDispatch, AttributeDispatch, AttributeDispatchTable, AttributeDispatchers,
    AttributeFunction, DispatchPass, RawArray, TypedAttributeDispatch,
};
pub use error::{Result, VertexStateError};
pub use list::VertexArrayStateList;
pub use manager::VertexArrayStateManager;
pub use source::{ArrayData, ArraySource, DeviceBuffer, SharedArray};
pub use state::VertexArrayState;
pub use types::{
    ArrayType, BufferHandle, ContextId, DataType, FixedAttribute, UNKNOWN_MODIFIED_COUNT,
    VertexArrayHandle,
};

/// Vertex state library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the vertex state subsystem.
pub fn init() {
    log::info!("RedLilium Vertex State v{} initialized", VERSION);
}
