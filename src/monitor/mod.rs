//! Monitor subsystem for dirty-state tracking.
//!
//! A monitor binds to an observable state object, subscribes to its save,
//! reset and fetch events, and notifies registered change handlers with a
//! freshly computed clean/dirty status. This implementation is embedded-first
//! (in-process): dispatch happens synchronously on the thread that emits the
//! state event.

/// Handler slots and callback types.
pub mod handlers;
/// The monitor itself.
pub mod tracker;

pub use handlers::{BoxedChangeFn, HandlerSlot};
pub use tracker::StateMonitor;
