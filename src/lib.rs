//! # Statewatch - dirty-state tracking for observable state objects
//!
//! Statewatch wraps an observable state object, subscribes to its save,
//! reset and fetch events, and tells registered change handlers whether the
//! state has diverged from a baseline snapshot.
//!
//! ## Core Concepts
//!
//! - **Observable state**: anything exposing a JSON snapshot plus listener
//!   attach/detach for the three lifecycle events
//! - **Baseline**: the immutable snapshot considered "clean"
//! - **Status**: clean/dirty, recomputed on every event with ignored paths
//!   excluded from the comparison
//! - **Change handler**: caller callback invoked in registration order with
//!   the status, the event and the emitter's changed-keys payload
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use serde_json::json;
//! use statewatch::{StateCell, StateEvent, StateMonitor};
//!
//! // State the application owns, with a baseline meaning "as last saved".
//! let cell = Arc::new(StateCell::with_document(json!({"title": "draft"})));
//! let monitor = StateMonitor::with_baseline(cell.clone(), json!({"title": "draft"}));
//!
//! let statuses = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&statuses);
//! monitor
//!     .on_change(move |status, event, changed| {
//!         sink.lock().unwrap().push((status.clean(), event, changed.to_vec()));
//!     })
//!     .unwrap();
//!
//! // The owner edits the state, then announces the save.
//! cell.set("title", json!("edited"));
//! cell.emit(StateEvent::Save, &["title".to_string()]);
//!
//! let seen = statuses.lock().unwrap();
//! assert_eq!(seen.len(), 1);
//! assert_eq!(seen[0].1, Some(StateEvent::Save));
//! assert!(!seen[0].0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod compare;
pub mod error;
pub mod event;
pub mod path;
pub mod status;

// State contract and monitor
pub mod monitor;
pub mod state;

// Re-export primary types at crate root for convenience
pub use compare::filtered_eq;
pub use error::{MonitorError, MonitorResult};
pub use event::StateEvent;
pub use monitor::{BoxedChangeFn, HandlerSlot, StateMonitor};
pub use path::{IgnoreSet, PropPath};
pub use state::{EventListener, ListenerId, ObservableState, StateCell};
pub use status::ChangeStatus;
