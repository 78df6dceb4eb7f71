//! Vertex array states indexed by context.

use crate::config::{AttributeAliasing, VertexStateConfig};
use crate::device::GraphicsDevice;
use crate::error::{Result, VertexStateError};
use crate::manager::VertexArrayStateManager;
use crate::state::VertexArrayState;
use crate::types::ContextId;

/// One optional [`VertexArrayState`] per context.
///
/// The list has a fixed number of entries. Configuration changes are
/// fanned out to every present entry.
#[derive(Debug)]
pub struct VertexArrayStateList {
    states: Vec<Option<VertexArrayState>>,
}

impl VertexArrayStateList {
    /// Create a list with room for `max_contexts` contexts.
    pub fn new(max_contexts: usize) -> Self {
        Self {
            states: (0..max_contexts).map(|_| None).collect(),
        }
    }

    /// Create a list sized by `config`.
    pub fn with_config(config: &VertexStateConfig) -> Self {
        Self::new(config.max_contexts)
    }

    /// Number of contexts the list can hold.
    pub fn capacity(&self) -> usize {
        self.states.len()
    }

    /// Number of present entries.
    pub fn len(&self) -> usize {
        self.states.iter().filter(|state| state.is_some()).count()
    }

    /// Whether no entry is present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `context` has a state.
    pub fn contains(&self, context: ContextId) -> bool {
        self.get(context).is_some()
    }

    /// State for `context`.
    pub fn get(&self, context: ContextId) -> Option<&VertexArrayState> {
        self.states.get(context as usize).and_then(Option::as_ref)
    }

    /// Mutable state for `context`.
    pub fn get_mut(&mut self, context: ContextId) -> Option<&mut VertexArrayState> {
        self.states.get_mut(context as usize).and_then(Option::as_mut)
    }

    fn entry_mut(&mut self, context: ContextId) -> Result<&mut Option<VertexArrayState>> {
        let max = self.states.len();
        self.states
            .get_mut(context as usize)
            .ok_or(VertexStateError::ContextOutOfRange { context, max })
    }

    /// Store `state` for `context`, returning the state it replaces.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::ContextOutOfRange`] if `context` is
    /// beyond the list's capacity, or [`VertexStateError::ContextMismatch`]
    /// if `state` belongs to another context.
    pub fn insert(&mut self, context: ContextId, state: VertexArrayState) -> Result<Option<VertexArrayState>> {
        if state.context_id() != context {
            return Err(VertexStateError::ContextMismatch {
                expected: context,
                found: state.context_id(),
            });
        }
        Ok(self.entry_mut(context)?.replace(state))
    }

    /// Remove and return the state for `context`.
    pub fn take(&mut self, context: ContextId) -> Option<VertexArrayState> {
        self.states.get_mut(context as usize).and_then(Option::take)
    }

    /// State for `device`'s context, creating it from `config` if needed.
    ///
    /// A new state has every dispatcher assigned. When the config asks for
    /// vertex array objects one is generated; failing to do so is logged
    /// and the state is used without it.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::ContextOutOfRange`] if the device's
    /// context is beyond the list's capacity.
    pub fn get_or_create(
        &mut self,
        device: &mut dyn GraphicsDevice,
        config: &VertexStateConfig,
    ) -> Result<&mut VertexArrayState> {
        let context = device.context_id();
        let max = self.states.len();
        let entry = self.entry_mut(context)?;
        if entry.is_none() {
            let mut state = VertexArrayState::new(context);
            state.assign_all_dispatchers(&config.aliasing)?;
            if config.use_vertex_array_objects
                && let Err(err) = state.generate_vertex_array_object(device)
            {
                log::debug!(
                    "VertexArrayStateList: context {} continues without a vertex array object: {}",
                    context,
                    err
                );
            }
            log::debug!("VertexArrayStateList: created state for context {}", context);
            *entry = Some(state);
        }
        entry
            .as_mut()
            .ok_or(VertexStateError::ContextOutOfRange { context, max })
    }

    /// Hand the state for `context` to `manager`.
    ///
    /// Returns `false` if there was no state.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::ContextMismatch`] if `manager` belongs to
    /// another context. The entry is left in place.
    pub fn release(&mut self, context: ContextId, manager: &VertexArrayStateManager) -> Result<bool> {
        if manager.context_id() != context {
            return Err(VertexStateError::ContextMismatch {
                expected: manager.context_id(),
                found: context,
            });
        }
        match self.take(context) {
            Some(state) => {
                state.release(manager)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Iterate over present states.
    pub fn iter(&self) -> impl Iterator<Item = &VertexArrayState> {
        self.states.iter().flatten()
    }

    /// Iterate mutably over present states.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VertexArrayState> {
        self.states.iter_mut().flatten()
    }

    fn for_each(&mut self, mut f: impl FnMut(&mut VertexArrayState) -> Result<()>) -> Result<()> {
        for state in self.iter_mut() {
            f(state)?;
        }
        Ok(())
    }

    // ========================================================================
    // Fan-out
    // ========================================================================

    /// Assign every dispatcher in every state.
    pub fn assign_all_dispatchers(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.assign_all_dispatchers(aliasing))
    }

    /// Assign the vertex position slot in every state.
    pub fn assign_vertex_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.assign_vertex_array_dispatcher(aliasing))
    }

    /// Assign the normal slot in every state.
    pub fn assign_normal_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.assign_normal_array_dispatcher(aliasing))
    }

    /// Assign the primary color slot in every state.
    pub fn assign_color_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.assign_color_array_dispatcher(aliasing))
    }

    /// Assign the secondary color slot in every state.
    pub fn assign_secondary_color_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.assign_secondary_color_array_dispatcher(aliasing))
    }

    /// Assign the fog coordinate slot in every state.
    pub fn assign_fog_coord_array_dispatcher(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.assign_fog_coord_array_dispatcher(aliasing))
    }

    /// Assign texture units `0..num_units` in every state.
    pub fn assign_tex_coord_array_dispatcher(&mut self, aliasing: &AttributeAliasing, num_units: u32) -> Result<()> {
        self.for_each(|state| state.assign_tex_coord_array_dispatcher(aliasing, num_units))
    }

    /// Construct generic slots `0..num` in every state.
    pub fn assign_vertex_attrib_array_dispatcher(&mut self, num: u32) -> Result<()> {
        self.for_each(|state| state.assign_vertex_attrib_array_dispatcher(num))
    }

    /// Reassign every fixed attribute and texture unit in every state.
    pub fn reassign_all_dispatchers(&mut self, aliasing: &AttributeAliasing) -> Result<()> {
        self.for_each(|state| state.reassign_all_dispatchers(aliasing))
    }

    /// Mark every state dirty.
    pub fn dirty_all(&mut self) {
        for state in self.iter_mut() {
            state.dirty();
        }
    }
}

impl Default for VertexArrayStateList {
    fn default() -> Self {
        Self::with_config(&VertexStateConfig::default())
    }
}

static_assertions::assert_impl_all!(VertexArrayStateList: Send);
