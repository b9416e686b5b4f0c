//! In-memory observable state cell.
//!
//! This module provides a thread-safe reference implementation of
//! [`ObservableState`] for embedded usage and tests. The cell owns a JSON
//! document and a listener table per event. Mutating the document never
//! fires an event on its own; the owner decides when a lifecycle event is
//! emitted and what changed-keys payload goes with it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};

use serde_json::{Map, Value};

use crate::event::StateEvent;
use crate::state::traits::{EventListener, ListenerId, ObservableState};

struct ListenerEntry {
    id: ListenerId,
    callback: Arc<Mutex<EventListener>>,
}

/// Thread-safe JSON document with per-event listener lists.
///
/// Listeners attached for an event run synchronously on the emitting thread,
/// in subscription order. Attach/detach during an emission takes effect from
/// the next emission. A listener that is already mid-call when its event is
/// re-emitted (re-entrant emission, or a concurrent emit from another thread)
/// is skipped for that round.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use serde_json::json;
/// use statewatch::{ObservableState, StateCell, StateEvent};
///
/// let cell = Arc::new(StateCell::new());
/// cell.set("messages.world", json!("hello"));
///
/// let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// cell.on(
///     StateEvent::Save,
///     Box::new(move |changed| sink.lock().unwrap().extend_from_slice(changed)),
/// );
///
/// cell.emit(StateEvent::Save, &["messages.world".to_string()]);
/// assert_eq!(*seen.lock().unwrap(), vec!["messages.world".to_string()]);
/// ```
pub struct StateCell {
    document: RwLock<Value>,
    listeners: Mutex<HashMap<StateEvent, Vec<ListenerEntry>>>,
}

impl StateCell {
    /// Create a cell holding an empty JSON object.
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(Value::Object(Map::new()))
    }

    /// Create a cell holding the given document.
    #[must_use]
    pub fn with_document(document: Value) -> Self {
        Self {
            document: RwLock::new(document),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Set the value at a dotted path, creating intermediate objects.
    ///
    /// Every path segment is treated as an object key; a non-object value in
    /// the middle of the path is replaced by an object.
    pub fn set(&self, path: &str, value: Value) {
        let mut guard = match self.document.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut node = &mut *guard;
        for seg in parents {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Value::Object(map) = node else {
                return;
            };
            node = map.entry((*seg).to_string()).or_insert(Value::Null);
        }

        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        map.insert((*last).to_string(), value);
    }

    /// Remove the value at a dotted path, returning it if present.
    pub fn remove(&self, path: &str) -> Option<Value> {
        let mut guard = match self.document.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };

        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut node = &mut *guard;
        for seg in parents {
            let Value::Object(map) = node else {
                return None;
            };
            node = map.get_mut(*seg)?;
        }

        match node {
            Value::Object(map) => map.remove(*last),
            _ => None,
        }
    }

    /// Replace the whole document.
    pub fn replace(&self, document: Value) {
        let mut guard = match self.document.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = document;
    }

    /// Fire an event, invoking its listeners with the changed-keys payload.
    ///
    /// The listener list is snapshotted before any callback runs, so listener
    /// changes made during the emission apply from the next one.
    pub fn emit(&self, event: StateEvent, changed: &[String]) {
        let snapshot: Vec<Arc<Mutex<EventListener>>> = {
            let guard = match self.listeners.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard
                .get(&event)
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.callback)).collect())
                .unwrap_or_default()
        };

        for callback in snapshot {
            // Skip listeners that are mid-call (re-entrant or concurrent emit)
            // or whose last call panicked.
            let Ok(mut cb) = callback.try_lock() else {
                continue;
            };
            cb(changed);
        }
    }

    /// Number of listeners currently attached for an event.
    #[must_use]
    pub fn listener_count(&self, event: StateEvent) -> usize {
        let guard = match self.listeners.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(&event).map_or(0, Vec::len)
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl ObservableState for StateCell {
    fn to_json(&self) -> Value {
        match self.document.read() {
            Ok(g) => g.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn on(&self, event: StateEvent, listener: EventListener) -> ListenerId {
        let id = ListenerId::new();
        let mut guard = match self.listeners.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entry(event).or_default().push(ListenerEntry {
            id,
            callback: Arc::new(Mutex::new(listener)),
        });
        id
    }

    fn off(&self, event: StateEvent, id: ListenerId) -> bool {
        let mut guard = match self.listeners.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(entries) = guard.get_mut(&event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn _assert_send_sync<T: Send + Sync>() {}
    const _: fn() = _assert_send_sync::<StateCell>;

    fn recording_listener(sink: &Arc<Mutex<Vec<String>>>) -> EventListener {
        let sink = Arc::clone(sink);
        Box::new(move |changed| {
            let mut guard = sink.lock().unwrap();
            guard.extend_from_slice(changed);
        })
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let cell = StateCell::new();
        cell.set("a.b.c", json!(1));
        assert_eq!(cell.to_json(), json!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn set_overwrites_scalar_intermediates() {
        let cell = StateCell::with_document(json!({"a": 5}));
        cell.set("a.b", json!(true));
        assert_eq!(cell.to_json(), json!({"a": {"b": true}}));
    }

    #[test]
    fn remove_returns_the_old_value() {
        let cell = StateCell::with_document(json!({"a": {"b": 1}, "keep": 2}));
        assert_eq!(cell.remove("a.b"), Some(json!(1)));
        assert_eq!(cell.remove("a.b"), None);
        assert_eq!(cell.remove("missing.path"), None);
        assert_eq!(cell.to_json(), json!({"a": {}, "keep": 2}));
    }

    #[test]
    fn replace_swaps_the_document() {
        let cell = StateCell::with_document(json!({"old": true}));
        cell.replace(json!({"new": 1}));
        assert_eq!(cell.to_json(), json!({"new": 1}));
    }

    #[test]
    fn emit_invokes_listeners_in_subscription_order() {
        let cell = StateCell::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let sink = Arc::clone(&order);
            cell.on(
                StateEvent::Save,
                Box::new(move |_| sink.lock().unwrap().push(tag)),
            );
        }

        cell.emit(StateEvent::Save, &[]);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn emit_passes_the_changed_keys_through_verbatim() {
        let cell = StateCell::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        cell.on(StateEvent::Reset, recording_listener(&seen));

        // The payload is the emitter's claim; keys need not exist in the
        // document and are not validated or reordered.
        let payload = vec![
            "no.such.key".to_string(),
            "zzz".to_string(),
            "aaa".to_string(),
        ];
        cell.emit(StateEvent::Reset, &payload);
        assert_eq!(*seen.lock().unwrap(), payload);
    }

    #[test]
    fn listeners_only_fire_for_their_event() {
        let cell = StateCell::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        cell.on(StateEvent::Save, recording_listener(&seen));

        cell.emit(StateEvent::Reset, &["ignored".to_string()]);
        cell.emit(StateEvent::Fetch, &["ignored".to_string()]);
        assert!(seen.lock().unwrap().is_empty());

        cell.emit(StateEvent::Save, &["seen".to_string()]);
        assert_eq!(*seen.lock().unwrap(), vec!["seen".to_string()]);
    }

    #[test]
    fn off_detaches_exactly_the_given_listener() {
        let cell = StateCell::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let id = cell.on(StateEvent::Save, recording_listener(&seen));
        assert_eq!(cell.listener_count(StateEvent::Save), 1);

        assert!(cell.off(StateEvent::Save, id));
        assert!(!cell.off(StateEvent::Save, id));
        assert!(!cell.off(StateEvent::Reset, ListenerId::new()));
        assert_eq!(cell.listener_count(StateEvent::Save), 0);

        cell.emit(StateEvent::Save, &["dropped".to_string()]);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn listener_attached_during_emit_fires_next_time() {
        let cell = Arc::new(StateCell::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let cell_for_listener = Arc::clone(&cell);
        let sink = Arc::clone(&seen);
        cell.on(
            StateEvent::Save,
            Box::new(move |_| {
                let late = Arc::clone(&sink);
                cell_for_listener.on(
                    StateEvent::Save,
                    Box::new(move |changed| late.lock().unwrap().extend_from_slice(changed)),
                );
            }),
        );

        cell.emit(StateEvent::Save, &["one".to_string()]);
        assert!(seen.lock().unwrap().is_empty());

        cell.emit(StateEvent::Save, &["two".to_string()]);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn listener_removed_during_emit_still_fires_this_round() {
        let cell = Arc::new(StateCell::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        // The first listener detaches the second one mid-emission.
        let detacher = Arc::clone(&cell);
        let doomed_id: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let id_slot = Arc::clone(&doomed_id);
        cell.on(
            StateEvent::Save,
            Box::new(move |_| {
                if let Some(id) = id_slot.lock().unwrap().take() {
                    assert!(detacher.off(StateEvent::Save, id));
                }
            }),
        );

        let id = cell.on(StateEvent::Save, recording_listener(&seen));
        *doomed_id.lock().unwrap() = Some(id);

        // Already snapshotted for this round, so it still fires.
        cell.emit(StateEvent::Save, &["first".to_string()]);
        assert_eq!(*seen.lock().unwrap(), vec!["first".to_string()]);

        // Gone from the next round on.
        cell.emit(StateEvent::Save, &["second".to_string()]);
        assert_eq!(*seen.lock().unwrap(), vec!["first".to_string()]);
        assert_eq!(cell.listener_count(StateEvent::Save), 1);
    }

    #[test]
    fn emit_with_no_listeners_is_a_no_op() {
        let cell = StateCell::new();
        cell.emit(StateEvent::Fetch, &["anything".to_string()]);
    }
}
