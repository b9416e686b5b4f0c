//! The state events a monitor tracks.
//!
//! A monitor only ever listens for these three event names on the observed
//! state object. It relays them to change handlers unchanged and never
//! synthesizes events of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tracked state event.
///
/// The serialized form and [`StateEvent::as_str`] both use the exact event
/// names from the observed contract.
///
/// # Examples
///
/// ```
/// use statewatch::StateEvent;
///
/// assert_eq!(StateEvent::Save.as_str(), "save_with_changes");
/// assert_eq!(StateEvent::from_name("reset_with_changes"), Some(StateEvent::Reset));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateEvent {
    /// `save_with_changes` — the state object was saved.
    #[serde(rename = "save_with_changes")]
    Save,

    /// `reset_with_changes` — the state object was reset.
    #[serde(rename = "reset_with_changes")]
    Reset,

    /// `fetch_with_changes` — the state object was refreshed from its source.
    #[serde(rename = "fetch_with_changes")]
    Fetch,
}

impl StateEvent {
    /// All tracked events, in the order the monitor subscribes to them.
    pub const ALL: [Self; 3] = [Self::Save, Self::Reset, Self::Fetch];

    /// Returns the event name as emitted on the state object.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Save => "save_with_changes",
            Self::Reset => "reset_with_changes",
            Self::Fetch => "fetch_with_changes",
        }
    }

    /// Parses an event name, returning `None` for anything untracked.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "save_with_changes" => Some(Self::Save),
            "reset_with_changes" => Some(Self::Reset),
            "fetch_with_changes" => Some(Self::Fetch),
            _ => None,
        }
    }
}

impl fmt::Display for StateEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
