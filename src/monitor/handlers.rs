//! Change handler registration slots.
//!
//! Handlers are stored through detachable slots: a cloneable handle whose
//! callback can be cleared from anywhere. The monitor prunes cleared slots
//! on the next dispatch, and registering a slot that is already empty is
//! rejected eagerly.

use std::fmt;
use std::sync::{Arc, Mutex, TryLockError};

use crate::event::StateEvent;
use crate::status::ChangeStatus;

/// Boxed change callback.
///
/// Arguments are the computed status, the event that fired (`None` for the
/// one-shot divergence call made at registration time), and the emitter's
/// changed-keys payload.
pub type BoxedChangeFn = Box<dyn FnMut(&ChangeStatus, Option<StateEvent>, &[String]) + Send>;

/// A detachable cell holding a change callback.
///
/// Clones share the same cell, so clearing any handle empties them all.
#[derive(Clone)]
pub struct HandlerSlot {
    cell: Arc<Mutex<Option<BoxedChangeFn>>>,
}

impl HandlerSlot {
    /// Wrap a callback in a fresh slot.
    #[must_use]
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&ChangeStatus, Option<StateEvent>, &[String]) + Send + 'static,
    {
        Self {
            cell: Arc::new(Mutex::new(Some(Box::new(callback)))),
        }
    }

    /// A slot with nothing callable in it.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            cell: Arc::new(Mutex::new(None)),
        }
    }

    /// Drop the callback. The monitor prunes the slot on its next dispatch.
    pub fn clear(&self) {
        let mut guard = match self.cell.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }

    /// Returns true if the slot no longer holds a callback.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        match self.cell.lock() {
            Ok(guard) => guard.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    /// Invoke the callback if one is present.
    ///
    /// Returns whether the slot should stay registered: `false` means the
    /// slot is empty (or its last call panicked) and can be pruned. A slot
    /// that is busy mid-call stays registered but is skipped this round.
    pub(crate) fn invoke(
        &self,
        status: &ChangeStatus,
        event: Option<StateEvent>,
        changed: &[String],
    ) -> bool {
        match self.cell.try_lock() {
            Ok(mut guard) => match guard.as_mut() {
                Some(callback) => {
                    callback(status, event, changed);
                    true
                }
                None => false,
            },
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        }
    }
}

impl fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("cleared", &self.is_cleared())
            .finish()
    }
}
