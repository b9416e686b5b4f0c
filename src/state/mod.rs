//! Observable state contract and reference cell.
//!
//! A monitor watches anything implementing [`ObservableState`]. The cell in
//! this module is the in-process reference implementation, used by embedded
//! callers and tests; applications with their own state ownership implement
//! the trait directly.

/// In-memory reference implementation.
pub mod cell;
/// Observable-state contract and listener types.
pub mod traits;

pub use cell::StateCell;
pub use traits::{EventListener, ListenerId, ObservableState};
