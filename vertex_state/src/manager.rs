//! Deferred deletion of released vertex array states.
//!
//! Deleting a vertex array object needs the owning context to be current,
//! which is rarely true where a state is dropped. States are therefore
//! released into a per-context queue and deleted later, a few at a time,
//! from a pass that does have the context.
//!
//! ```text
//! release(state)                 flush_deleted_objects(device, budget)
//!   │                              │
//!   ▼                              ▼
//! ┌──────────────────────┐  swap  ┌───────────────┐  delete while
//! │ Mutex<VecDeque<...>> │ ─────> │ local queue   │  elapsed < budget
//! └──────────────────────┘ <───── └───────────────┘
//!                       leftovers go back in front
//! ```
//!
//! The lock is held only for the swap and the re-queue, never while the
//! device is deleting objects.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::device::GraphicsDevice;
use crate::error::{Result, VertexStateError};
use crate::state::VertexArrayState;
use crate::types::ContextId;

/// Per-context queue of states waiting for their device objects to be
/// deleted.
pub struct VertexArrayStateManager {
    context_id: ContextId,
    clock: Arc<dyn Clock>,
    pending: Mutex<VecDeque<VertexArrayState>>,
}

impl std::fmt::Debug for VertexArrayStateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VertexArrayStateManager")
            .field("context_id", &self.context_id)
            .field("pending_count", &self.pending_count())
            .finish()
    }
}

impl VertexArrayStateManager {
    /// Create a manager for `context_id` timed by the system clock.
    pub fn new(context_id: ContextId) -> Self {
        Self::with_clock(context_id, Arc::new(SystemClock::new()))
    }

    /// Create a manager for `context_id` timed by `clock`.
    pub fn with_clock(context_id: ContextId, clock: Arc<dyn Clock>) -> Self {
        Self {
            context_id,
            clock,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Context this manager deletes objects for.
    pub fn context_id(&self) -> ContextId {
        self.context_id
    }

    /// Number of states waiting to be deleted.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Queue `state` for deletion.
    ///
    /// # Errors
    ///
    /// Returns [`VertexStateError::ContextMismatch`] if `state` belongs to
    /// another context. The state is dropped without touching the device.
    pub fn release(&self, state: VertexArrayState) -> Result<()> {
        if state.context_id() != self.context_id {
            log::warn!(
                "VertexArrayStateManager[{}]: rejected state from context {}",
                self.context_id,
                state.context_id()
            );
            return Err(VertexStateError::ContextMismatch {
                expected: self.context_id,
                found: state.context_id(),
            });
        }
        self.pending.lock().push_back(state);
        Ok(())
    }

    /// Delete queued states in release order while time remains.
    ///
    /// Elapsed time is re-measured after each deletion, so the budget may
    /// be overrun by the cost of one deletion. The time spent is subtracted
    /// from `available_time`. Returns the number of states deleted.
    pub fn flush_deleted_objects(
        &self,
        device: &mut dyn GraphicsDevice,
        available_time: &mut Duration,
    ) -> usize {
        if available_time.is_zero() {
            return 0;
        }
        if !self.accepts(device) {
            return 0;
        }

        let start = self.clock.now();
        let mut queue = std::mem::take(&mut *self.pending.lock());
        if queue.is_empty() {
            return 0;
        }

        let mut deleted = 0;
        let mut elapsed = Duration::ZERO;
        while elapsed < *available_time {
            let Some(mut state) = queue.pop_front() else {
                break;
            };
            state.delete_vertex_array_object(device);
            deleted += 1;
            elapsed = self.clock.now().saturating_sub(start);
        }

        let remaining = queue.len();
        if remaining > 0 {
            let mut pending = self.pending.lock();
            queue.append(&mut pending);
            *pending = queue;
        }

        *available_time = available_time.saturating_sub(elapsed);
        log::debug!(
            "VertexArrayStateManager[{}]: deleted {} states in {:?}, {} remaining",
            self.context_id,
            deleted,
            elapsed,
            remaining
        );
        deleted
    }

    /// Delete every queued state. Returns the number deleted.
    pub fn flush_all_deleted_objects(&self, device: &mut dyn GraphicsDevice) -> usize {
        if !self.accepts(device) {
            return 0;
        }

        let queue = std::mem::take(&mut *self.pending.lock());
        let deleted = queue.len();
        for mut state in queue {
            state.delete_vertex_array_object(device);
        }
        if deleted > 0 {
            log::debug!(
                "VertexArrayStateManager[{}]: deleted all {} states",
                self.context_id,
                deleted
            );
        }
        deleted
    }

    /// Drop every queued state without calling the device.
    ///
    /// Use when the context is gone and its objects died with it.
    pub fn discard_all_objects(&self) -> usize {
        let queue = std::mem::take(&mut *self.pending.lock());
        if !queue.is_empty() {
            log::debug!(
                "VertexArrayStateManager[{}]: discarded {} states",
                self.context_id,
                queue.len()
            );
        }
        queue.len()
    }

    fn accepts(&self, device: &dyn GraphicsDevice) -> bool {
        if device.context_id() == self.context_id {
            return true;
        }
        log::warn!(
            "VertexArrayStateManager[{}]: refusing to flush with device for context {}",
            self.context_id,
            device.context_id()
        );
        false
    }
}

static_assertions::assert_impl_all!(VertexArrayStateManager: Send, Sync);
