//! Per-context vertex attribute binding cache.
//!
//! A [`VertexArrayState`] remembers what every attribute slot of one
//! rendering context is bound to and issues device calls only when that
//! binding actually changes.
//!
//! # Bind Pass
//!
//! ```text
//! set_*_array(source)      ┌──────────────────────────────────────────┐
//!   ──────────────────────>│ null source   -> disable if bound        │
//!                          │ first bind    -> enable + point          │
//!                          │ new / dirty   -> point (already enabled) │
//!                          │ unchanged     -> nothing                 │
//!                          └──────────────────────────────────────────┘
//! reset()                  disable every slot touched since last reset
//! ```
//!
//! Slots are kept in an arena indexed by slot number. Records are created
//! on first use and live as long as the state.

use fixedbitset::FixedBitSet;

use crate::config::{AttributeAliasing, MAX_VERTEX_ATTRIB_SLOTS};
use crate::device::{BufferTarget, DeviceFeatures, GraphicsDevice};
use crate::dispatch::{ArrayDispatch, RawArray};
use crate::error::{Result, VertexStateError};
use crate::manager::VertexArrayStateManager;
use crate::source::SharedArray;
use crate::types::{BufferHandle, ContextId, FixedAttribute, VertexArrayHandle};

/// Binding cache for one rendering context.
#[derive(Debug)]
pub struct VertexArrayState {
    context_id: ContextId,
    /// Binding records indexed by slot.
    dispatches: Vec<ArrayDispatch>,
    /// Slots whose record has been constructed.
    constructed: FixedBitSet,
    /// Slot per fixed attribute, indexed by [`FixedAttribute::index`].
    fixed: [Option<u32>; 5],
    /// Slot per texture coordinate unit.
    tex_coords: Vec<Option<u32>>,
    /// Slots bound since the last reset, in first-bind order.
    active: Vec<u32>,
    vertex_array_object: Option<VertexArrayHandle>,
    current_vbo: Option<BufferHandle>,
    current_ebo: Option<BufferHandle>,
    requires_set_arrays: bool,
}

impl VertexArrayState {
    /// Create an empty state for `context_id`.
    ///
    /// No slot is assigned; call [`assign_all_dispatchers`](Self::assign_all_dispatchers)
    /// before using the fixed attribute helpers.
    pub fn new(context_id: ContextId) -> Self {
        Self {
            context_id,
            dispatches: Vec::new(),
            constructed: FixedBitSet::new(),
            fixed: [None; 5],
            tex_coords: Vec::new(),
            active: Vec::new(),
            vertex_array_object: None,
            current_vbo: None,
            current_ebo: None,
            requires_set_arrays: true,
        }
    }

    /// Context this state belongs to.
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Binding record for `slot`, if it has been constructed.
    pub fn dispatch(&self, slot: u32) -> Option<&ArrayDispatch> {
        if self.is_constructed(slot) {
            self.dispatches.get(slot as usize)
        } else {
            None
        }
    }

    /// Whether the record for `slot` has been constructed.
    pub fn is_constructed(&self, slot: u32) -> bool {
        self.constructed.contains(slot as usize)
    }

    /// Number of constructed records.
    pub fn constructed_count(&self) -> usize {
        self.constructed.count_ones(..)
    }

    /// Slots bound since the last reset, in first-bind order.
    pub fn active_slots(&self) -> &[u32] {
        &self.active
    }

    /// Slot assigned to `attribute`, if any.
    pub fn fixed_slot(&self, attribute: FixedAttribute) -> Option<u32> {
        self.fixed[attribute.index()]
    }

    /// Slot assigned to texture coordinate `unit`, if any.
    pub fn tex_coord_slot(&self, unit: u32) -> Option<u32> {
        self.tex_coords.get(unit as usize).copied().flatten()
    }

    fn construct(&mut self, slot: u32) -> Result<&mut ArrayDispatch> {
        if slot >= MAX_VERTEX_ATTRIB_SLOTS {
            return Err(VertexStateError::InvalidParameter(format!(
                "attribute slot {} exceeds the maximum of {}",
                slot, MAX_VERTEX_ATTRIB_SLOTS
            )));
        }

        let index = slot as usize;
        if index >= self.dispatches.len() {
            let start = self.dispatches.len() as u32;
            self.dispatches.extend((start..=slot).map(ArrayDispatch::new));
            self.constructed.grow(index + 1);
        }
        if !self.constructed.put(index) {
            log::trace!("VertexArrayState[{}]: constructed slot {}", self.context_id, slot);
        }
        Ok(&mut self.dispatches[index])
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Bind `source` to `slot`, or unbind the slot when `source` is `None`.
    ///
    /// Device calls are issued only when the slot was unbound, bound to a
    /// different source, or bound to a source modified since.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::InvalidParameter`] if `slot` is beyond
    /// [`MAX_VERTEX_ATTRIB_SLOTS`].
    pub fn set_array(
        &mut self,
        device: &mut dyn GraphicsDevice,
        slot: u32,
        source: Option<&SharedArray>,
    ) -> Result<()> {
        let Some(source) = source else {
            self.disable_array(device, slot);
            return Ok(());
        };

        let context_id = self.context_id;
        let dispatch = self.construct(slot)?;
        if !dispatch.is_active() {
            dispatch.set_active(true);
            self.active.push(slot);
        }

        let dispatch = &self.dispatches[slot as usize];
        let enable = !dispatch.has_source();
        let stale = !dispatch.is_bound_to(source) || dispatch.modified_count() != source.modified_count();

        if enable || stale {
            let buffer = if device.features().contains(DeviceFeatures::BUFFER_OBJECTS) {
                source.device_buffer(context_id)
            } else {
                None
            };
            match buffer {
                Some(buffer) => self.bind_vertex_buffer_object(device, buffer.handle),
                None => self.unbind_vertex_buffer_object(device),
            }

            let dispatch = &self.dispatches[slot as usize];
            match (enable, buffer) {
                (true, Some(buffer)) => dispatch.enable_and_dispatch_buffer(device, &**source, buffer),
                (true, None) => dispatch.enable_and_dispatch(device, &**source),
                (false, Some(buffer)) => dispatch.dispatch_buffer(device, &**source, buffer),
                (false, None) => dispatch.dispatch(device, &**source),
            }
        } else {
            log::trace!("VertexArrayState[{}]: slot {} unchanged", context_id, slot);
        }

        self.dispatches[slot as usize].bind_source(source);
        Ok(())
    }

    /// Point `slot` at raw data with no source to track.
    ///
    /// Always issues the enable and pointer calls. If a source is bound to
    /// the slot the call disables the slot instead.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::InvalidParameter`] if `slot` is beyond
    /// [`MAX_VERTEX_ATTRIB_SLOTS`].
    pub fn set_raw_array(
        &mut self,
        device: &mut dyn GraphicsDevice,
        slot: u32,
        raw: &RawArray<'_>,
    ) -> Result<()> {
        let dispatch = self.construct(slot)?;
        if dispatch.has_source() {
            dispatch.disable(device);
            dispatch.clear_binding();
            return Ok(());
        }

        if !dispatch.is_active() {
            dispatch.set_active(true);
            self.active.push(slot);
        }
        let dispatch = &mut self.dispatches[slot as usize];
        dispatch.enable_and_dispatch_raw(device, raw);
        dispatch.bind_raw();
        Ok(())
    }

    /// Bind `source` to the slot assigned to `attribute`.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::DispatcherNotAssigned`] if no slot has
    /// been assigned to `attribute`.
    pub fn set_fixed_array(
        &mut self,
        device: &mut dyn GraphicsDevice,
        attribute: FixedAttribute,
        source: Option<&SharedArray>,
    ) -> Result<()> {
        let slot = self
            .fixed_slot(attribute)
            .ok_or(VertexStateError::DispatcherNotAssigned(attribute))?;
        self.set_array(device, slot, source)
    }

    /// Bind the vertex position array.
    pub fn set_vertex_array(&mut self, device: &mut dyn GraphicsDevice, source: Option<&SharedArray>) -> Result<()> {
        self.set_fixed_array(device, FixedAttribute::Vertex, source)
    }

    /// Bind the normal array.
    pub fn set_normal_array(&mut self, device: &mut dyn GraphicsDevice, source: Option<&SharedArray>) -> Result<()> {
        self.set_fixed_array(device, FixedAttribute::Normal, source)
    }

    /// Bind the primary color array.
    pub fn set_color_array(&mut self, device: &mut dyn GraphicsDevice, source: Option<&SharedArray>) -> Result<()> {
        self.set_fixed_array(device, FixedAttribute::Color, source)
    }

    /// Bind the secondary color array.
    pub fn set_secondary_color_array(
        &mut self,
        device: &mut dyn GraphicsDevice,
        source: Option<&SharedArray>,
    ) -> Result<()> {
        self.set_fixed_array(device, FixedAttribute::SecondaryColor, source)
    }

    /// Bind the fog coordinate array.
    pub fn set_fog_coord_array(&mut self, device: &mut dyn GraphicsDevice, source: Option<&SharedArray>) -> Result<()> {
        self.set_fixed_array(device, FixedAttribute::FogCoord, source)
    }

    /// Bind the texture coordinate array for `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::TexCoordNotAssigned`] if no slot has
    /// been assigned to `unit`.
    pub fn set_tex_coord_array(
        &mut self,
        device: &mut dyn GraphicsDevice,
        unit: u32,
        source: Option<&SharedArray>,
    ) -> Result<()> {
        let slot = self
            .tex_coord_slot(unit)
            .ok_or(VertexStateError::TexCoordNotAssigned(unit))?;
        self.set_array(device, slot, source)
    }

    /// Bind generic attribute `index`.
    pub fn set_vertex_attrib_array(
        &mut self,
        device: &mut dyn GraphicsDevice,
        index: u32,
        source: Option<&SharedArray>,
    ) -> Result<()> {
        self.set_array(device, index, source)
    }

    /// Disable `slot` if anything is bound to it and forget the binding.
    pub fn disable_array(&mut self, device: &mut dyn GraphicsDevice, slot: u32) {
        if !self.is_constructed(slot) {
            return;
        }
        let dispatch = &mut self.dispatches[slot as usize];
        if dispatch.is_bound() {
            dispatch.disable(device);
            dispatch.clear_binding();
        }
    }

    /// Disable the slot assigned to `attribute`.
    pub fn disable_fixed_array(&mut self, device: &mut dyn GraphicsDevice, attribute: FixedAttribute) -> Result<()> {
        self.set_fixed_array(device, attribute, None)
    }

    /// Disable texture coordinate units `unit` and above.
    pub fn disable_tex_coord_arrays_from(&mut self, device: &mut dyn GraphicsDevice, unit: u32) {
        let slots: Vec<u32> = self
            .tex_coords
            .iter()
            .skip(unit as usize)
            .flatten()
            .copied()
            .collect();
        for slot in slots {
            self.disable_array(device, slot);
        }
    }

    /// Disable generic attribute slots `index` and above.
    pub fn disable_vertex_attrib_arrays_from(&mut self, device: &mut dyn GraphicsDevice, index: u32) {
        for slot in index..self.dispatches.len() as u32 {
            self.disable_array(device, slot);
        }
    }

    /// End a pass: disable every slot bound since the last reset.
    ///
    /// Only the active slots are visited. Slots already unbound during the
    /// pass are not disabled a second time.
    pub fn reset(&mut self, device: &mut dyn GraphicsDevice) {
        let count = self.active.len();
        for slot in self.active.drain(..) {
            let dispatch = &mut self.dispatches[slot as usize];
            if dispatch.is_bound() {
                dispatch.disable(device);
            }
            dispatch.clear_binding();
            dispatch.set_active(false);
        }
        log::trace!("VertexArrayState[{}]: reset {} slots", self.context_id, count);
    }

    /// Force every slot to be re-pointed on its next bind.
    pub fn dirty(&mut self) {
        self.requires_set_arrays = true;
        for slot in self.constructed.ones() {
            self.dispatches[slot].invalidate();
        }
    }

    /// Whether arrays must be set again before drawing.
    pub fn requires_set_arrays(&self) -> bool {
        self.requires_set_arrays
    }

    /// Record whether arrays must be set again before drawing.
    pub fn set_requires_set_arrays(&mut self, requires: bool) {
        self.requires_set_arrays = requires;
    }

    // ========================================================================
    // Slot assignment
    // ========================================================================

    /// Assign `slot` to `attribute` unless it already has one.
    pub fn assign_fixed_dispatcher(&mut self, attribute: FixedAttribute, slot: u32) -> Result<()> {
        if let Some(current) = self.fixed[attribute.index()] {
            if current != slot {
                log::trace!(
                    "VertexArrayState[{}]: {:?} stays on slot {} (requested {})",
                    self.context_id,
                    attribute,
                    current,
                    slot
                );
            }
            return Ok(());
        }
        self.construct(slot)?;
        self.fixed[attribute.index()] = Some(slot);
        log::debug!(
            "VertexArrayState[{}]: {:?} assigned to slot {}",
            self.context_id,
            attribute,
            slot
        );
        Ok(())
    }

    /// Assign the vertex position slot from `aliasing`.
    pub fn assign_vertex_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.assign_fixed_dispatcher(FixedAttribute::Vertex, aliasing.slot(FixedAttribute::Vertex))
    }

    /// Assign the normal slot from `aliasing`.
    pub fn assign_normal_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.assign_fixed_dispatcher(FixedAttribute::Normal, aliasing.slot(FixedAttribute::Normal))
    }

    /// Assign the primary color slot from `aliasing`.
    pub fn assign_color_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.assign_fixed_dispatcher(FixedAttribute::Color, aliasing.slot(FixedAttribute::Color))
    }

    /// Assign the secondary color slot from `aliasing`.
    pub fn assign_secondary_color_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.assign_fixed_dispatcher(
            FixedAttribute::SecondaryColor,
            aliasing.slot(FixedAttribute::SecondaryColor),
        )
    }

    /// Assign the fog coordinate slot from `aliasing`.
    pub fn assign_fog_coord_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.assign_fixed_dispatcher(FixedAttribute::FogCoord, aliasing.slot(FixedAttribute::FogCoord))
    }

    /// Assign slots to texture coordinate units `0..num_units`.
    ///
    /// Units that already have a slot keep it. Units `aliasing` has no
    /// slot for stay unassigned. Units at or above `num_units` are
    /// dropped; their slots stay bound until the next [`reset`](Self::reset).
    pub fn assign_tex_coord_array_dispatcher(&mut self, aliasing: &AttributeAliasing, num_units: u32) -> Result<()> {
        let num = num_units as usize;
        if self.tex_coords.len() > num {
            if self.tex_coords[num..].iter().any(Option::is_some) {
                log::debug!(
                    "VertexArrayState[{}]: texture units reduced to {}",
                    self.context_id,
                    num_units
                );
                self.requires_set_arrays = true;
            }
            self.tex_coords.truncate(num);
        } else {
            self.tex_coords.resize(num, None);
        }
        for unit in 0..num_units {
            if self.tex_coords[unit as usize].is_some() {
                continue;
            }
            let Some(slot) = aliasing.tex_coord_slot(unit) else {
                log::debug!(
                    "VertexArrayState[{}]: no slot configured for texture unit {}",
                    self.context_id,
                    unit
                );
                continue;
            };
            self.construct(slot)?;
            self.tex_coords[unit as usize] = Some(slot);
        }
        Ok(())
    }

    /// Construct records for generic slots `0..num`.
    pub fn assign_vertex_attrib_array_dispatcher(&mut self, num: u32) -> Result<()> {
        for slot in 0..num {
            self.construct(slot)?;
        }
        Ok(())
    }

    /// Assign every fixed attribute, texture unit and generic slot from
    /// `aliasing`. Existing assignments are kept.
    pub fn assign_all_dispatchers(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        for attribute in FixedAttribute::ALL {
            self.assign_fixed_dispatcher(attribute, aliasing.slot(attribute))?;
        }
        self.assign_tex_coord_array_dispatcher(aliasing, aliasing.tex_coord_units())?;
        self.assign_vertex_attrib_array_dispatcher(aliasing.vertex_attrib_count())
    }

    /// Forget the slot assigned to `attribute`. Other attributes keep theirs.
    pub fn invalidate_fixed_dispatcher(&mut self, attribute: FixedAttribute) {
        self.fixed[attribute.index()] = None;
    }

    /// Assign `attribute` from `aliasing`, replacing any existing slot.
    pub fn reassign_fixed_dispatcher(&mut self, attribute: FixedAttribute, aliasing: &AttributeAliasing) -> Result<()> {
        let previous = self.fixed[attribute.index()];
        self.invalidate_fixed_dispatcher(attribute);
        if let Err(err) = self.assign_fixed_dispatcher(attribute, aliasing.slot(attribute)) {
            self.fixed[attribute.index()] = previous;
            return Err(err);
        }
        let current = self.fixed[attribute.index()];
        if previous.is_some() && previous != current {
            log::debug!(
                "VertexArrayState[{}]: {:?} moved from slot {:?} to {:?}",
                self.context_id,
                attribute,
                previous,
                current
            );
            self.requires_set_arrays = true;
        }
        Ok(())
    }

    /// Reassign every fixed attribute and texture unit from `aliasing`.
    pub fn reassign_all_dispatchers(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        for attribute in FixedAttribute::ALL {
            self.reassign_fixed_dispatcher(attribute, aliasing)?;
        }

        let previous = std::mem::take(&mut self.tex_coords);
        if let Err(err) = self.assign_tex_coord_array_dispatcher(aliasing, aliasing.tex_coord_units()) {
            self.tex_coords = previous;
            return Err(err);
        }
        let changed = previous
            .iter()
            .enumerate()
            .any(|(unit, slot)| slot.is_some() && self.tex_coords.get(unit).copied().flatten() != *slot);
        if changed {
            log::debug!("VertexArrayState[{}]: texture units remapped", self.context_id);
            self.requires_set_arrays = true;
        }

        self.assign_vertex_attrib_array_dispatcher(aliasing.vertex_attrib_count())
    }

    // ========================================================================
    // Buffer objects
    // ========================================================================

    /// Currently bound vertex buffer.
    pub fn current_vertex_buffer_object(&self) -> Option<BufferHandle> {
        self.current_vbo
    }

    /// Currently bound element buffer.
    pub fn current_element_buffer_object(&self) -> Option<BufferHandle> {
        self.current_ebo
    }

    /// Bind `buffer` to the array target unless it is already bound.
    pub fn bind_vertex_buffer_object(&mut self, device: &mut dyn GraphicsDevice, buffer: BufferHandle) {
        if self.current_vbo == Some(buffer) {
            return;
        }
        device.bind_buffer(BufferTarget::Array, Some(buffer));
        self.current_vbo = Some(buffer);
    }

    /// Unbind the array target unless nothing is bound.
    pub fn unbind_vertex_buffer_object(&mut self, device: &mut dyn GraphicsDevice) {
        if self.current_vbo.is_none() {
            return;
        }
        device.bind_buffer(BufferTarget::Array, None);
        self.current_vbo = None;
    }

    /// Bind `buffer` to the element target unless it is already bound.
    pub fn bind_element_buffer_object(&mut self, device: &mut dyn GraphicsDevice, buffer: BufferHandle) {
        if self.current_ebo == Some(buffer) {
            return;
        }
        device.bind_buffer(BufferTarget::ElementArray, Some(buffer));
        self.current_ebo = Some(buffer);
    }

    /// Unbind the element target unless nothing is bound.
    pub fn unbind_element_buffer_object(&mut self, device: &mut dyn GraphicsDevice) {
        if self.current_ebo.is_none() {
            return;
        }
        device.bind_buffer(BufferTarget::ElementArray, None);
        self.current_ebo = None;
    }

    /// Forget the tracked buffer bindings.
    ///
    /// Use after something outside this state changed the bindings.
    pub fn reset_buffer_object_pointers(&mut self) {
        self.current_vbo = None;
        self.current_ebo = None;
    }

    // ========================================================================
    // Vertex array object
    // ========================================================================

    /// The vertex array object, if one was generated.
    pub fn vertex_array_object(&self) -> Option<VertexArrayHandle> {
        self.vertex_array_object
    }

    /// Generate the vertex array object if there is none yet.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::FeatureNotSupported`] if the device has
    /// no vertex array objects, or the device's error if creation fails.
    /// The state stays usable without one either way.
    pub fn generate_vertex_array_object(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        if self.vertex_array_object.is_some() {
            return Ok(());
        }
        if !device.features().contains(DeviceFeatures::VERTEX_ARRAY_OBJECTS) {
            log::warn!(
                "VertexArrayState[{}]: vertex array objects not supported",
                self.context_id
            );
            return Err(VertexStateError::FeatureNotSupported(
                "vertex array objects".to_string(),
            ));
        }

        match device.create_vertex_array() {
            Ok(handle) => {
                log::debug!(
                    "VertexArrayState[{}]: generated vertex array object {:?}",
                    self.context_id,
                    handle
                );
                self.vertex_array_object = Some(handle);
                Ok(())
            }
            Err(err) => {
                log::warn!(
                    "VertexArrayState[{}]: failed to create vertex array object: {}",
                    self.context_id,
                    err
                );
                Err(err)
            }
        }
    }

    /// Bind the vertex array object, if there is one.
    pub fn bind_vertex_array_object(&self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.vertex_array_object {
            device.bind_vertex_array(Some(handle));
        }
    }

    /// Bind the default vertex array, if this state has its own.
    pub fn unbind_vertex_array_object(&self, device: &mut dyn GraphicsDevice) {
        if self.vertex_array_object.is_some() {
            device.bind_vertex_array(None);
        }
    }

    /// Delete the vertex array object, if there is one.
    pub fn delete_vertex_array_object(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(handle) = self.vertex_array_object.take() {
            device.delete_vertex_array(handle);
            log::debug!(
                "VertexArrayState[{}]: deleted vertex array object {:?}",
                self.context_id,
                handle
            );
        }
    }

    /// Hand this state to `manager` for deferred deletion.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::ContextMismatch`] if `manager` belongs to
    /// another context.
    pub fn release(self, manager: &VertexArrayStateManager) -> Result<()> {
        manager.release(self)
    }
}

static_assertions::assert_impl_all!(VertexArrayState: Send);
