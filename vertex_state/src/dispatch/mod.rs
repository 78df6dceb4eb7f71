//! Attribute dispatch.
//!
//! Two ways of feeding an attribute live here:
//!
//! - [`ArrayDispatch`]: points a slot at a whole array, either in client
//!   memory or in a device buffer. This is what [`VertexArrayState`]
//!   caches per slot.
//! - [`AttributeDispatchTable`] and [`AttributeDispatchers`]: pick a
//!   single-element upload by element type, for attributes bound per
//!   primitive rather than per vertex.
//!
//! [`VertexArrayState`]: crate::VertexArrayState

mod array;
mod attribute;
mod dispatchers;
mod table;

pub use array::{ArrayDispatch, RawArray};
pub use attribute::{AttributeDispatch, AttributeFunction, TypedAttributeDispatch};
pub use dispatchers::{AttributeDispatchers, DispatchPass};
pub use table::AttributeDispatchTable;
