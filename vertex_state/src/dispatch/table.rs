//! Element-type keyed upload tables.

use crate::device::AttributeTarget;
use crate::source::ArraySource;
use crate::types::{ArrayType, FixedAttribute};

use super::attribute::{AttributeDispatch, AttributeFunction, TypedAttributeDispatch};

/// Lookup from an array's element type to the upload that handles it.
///
/// Entries are sparse; the backing storage grows to the largest
/// registered type index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDispatchTable {
    entries: Vec<Option<TypedAttributeDispatch>>,
}

impl AttributeDispatchTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an upload to a fixed-function attribute for `array_type`.
    ///
    /// Passing `None` clears the entry.
    pub fn assign(
        &mut self,
        array_type: ArrayType,
        attribute: FixedAttribute,
        function: Option<AttributeFunction>,
        stride: usize,
    ) {
        self.set(array_type, AttributeTarget::Fixed(attribute), function, stride);
    }

    /// Register an upload to generic slot `slot` for `array_type`.
    ///
    /// Passing `None` clears the entry.
    pub fn target_assign(
        &mut self,
        slot: u32,
        array_type: ArrayType,
        function: Option<AttributeFunction>,
        stride: usize,
    ) {
        self.set(array_type, AttributeTarget::Generic(slot), function, stride);
    }

    fn set(
        &mut self,
        array_type: ArrayType,
        target: AttributeTarget,
        function: Option<AttributeFunction>,
        stride: usize,
    ) {
        let index = array_type.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        self.entries[index] =
            function.map(|function| TypedAttributeDispatch::new(function, target, stride));
    }

    /// Registration for `array_type`, if any.
    pub fn entry(&self, array_type: ArrayType) -> Option<&TypedAttributeDispatch> {
        self.entries.get(array_type.index()).and_then(Option::as_ref)
    }

    /// Number of slots in the backing storage.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Upload for `array`, bound to its data.
    ///
    /// Returns `None` when nothing is registered for the array's type; the
    /// caller then falls back to another path or skips the attribute.
    pub fn dispatcher<'a>(&self, array: &'a dyn ArraySource) -> Option<AttributeDispatch<'a>> {
        let entry = self.entry(array.array_type())?;
        let dispatch = entry.bind(array.data());
        if dispatch.is_none() {
            log::trace!(
                "AttributeDispatchTable: {:?} data does not match {:?}",
                array.data_type(),
                entry.function()
            );
        }
        dispatch
    }
}
