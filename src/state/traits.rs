//! Abstract observable-state traits.
//!
//! These traits define the contract a state object must implement for a
//! monitor to watch it. By using traits, we enable:
//! - In-memory state cells for testing and embedded use
//! - Application view-models that own their own storage
//! - Test doubles that count listener attach/detach calls

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::event::StateEvent;

/// Unique identifier for an attached event listener.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new random listener id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked when a state event fires.
///
/// The slice is the emitter's changed-keys payload, passed through to the
/// listener verbatim.
pub type EventListener = Box<dyn FnMut(&[String]) + Send>;

/// Contract for a state object a monitor can watch.
///
/// # Safety Considerations
/// - Implementations must tolerate concurrent snapshot and listener calls
/// - `off` with an unknown id must be a no-op returning `false`
pub trait ObservableState: Send + Sync {
    /// Serialize the current state to a JSON snapshot.
    fn to_json(&self) -> Value;

    /// Attach a listener for an event. Returns the id needed to detach it.
    fn on(&self, event: StateEvent, listener: EventListener) -> ListenerId;

    /// Detach a listener by id. Returns `true` if something was removed.
    fn off(&self, event: StateEvent, id: ListenerId) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: ensure the trait is object-safe
    fn _assert_observable_state_object_safe(_: &dyn ObservableState) {}

    #[test]
    fn listener_ids_are_unique() {
        let a = ListenerId::new();
        let b = ListenerId::new();
        assert_ne!(a, b);
        assert_ne!(ListenerId::default(), ListenerId::default());
    }

    #[test]
    fn listener_id_serializes_transparently() {
        let uuid = Uuid::new_v4();
        let id = ListenerId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));

        let back: ListenerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn listener_id_displays_the_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(ListenerId::from_uuid(uuid).to_string(), uuid.to_string());
    }
}
