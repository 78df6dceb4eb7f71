//! Vertex state error types.

use thiserror::Error;

use crate::types::{ContextId, FixedAttribute};

/// Errors that can occur while managing vertex array state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VertexStateError {
    /// A requested device feature is not supported.
    #[error("feature not supported: {0}")]
    FeatureNotSupported(String),
    /// The device failed to create an object.
    #[error("resource creation failed: {0}")]
    ResourceCreationFailed(String),
    /// A fixed attribute was used before a slot was assigned to it.
    #[error("no dispatcher assigned for {0:?} array")]
    DispatcherNotAssigned(FixedAttribute),
    /// A texture coordinate unit was used before a slot was assigned to it.
    #[error("no dispatcher assigned for texture coordinate unit {0}")]
    TexCoordNotAssigned(u32),
    /// A context id outside the configured range.
    #[error("context {context} out of range (max contexts: {max})")]
    ContextOutOfRange {
        /// The offending context id.
        context: ContextId,
        /// Number of contexts supported.
        max: usize,
    },
    /// An object belonging to one context was handed to another.
    #[error("context mismatch: expected {expected}, found {found}")]
    ContextMismatch {
        /// Context the receiver belongs to.
        expected: ContextId,
        /// Context the object belongs to.
        found: ContextId,
    },
    /// An invalid parameter was provided.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result alias for vertex state operations.
pub type Result<T> = std::result::Result<T, VertexStateError>;
