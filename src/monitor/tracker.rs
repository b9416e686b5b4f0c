//! Dirty-state tracking monitor.
//!
//! The monitor wraps an [`ObservableState`], listens for its save, reset and
//! fetch events, and on each one recomputes a clean/dirty status against an
//! immutable baseline. Registered handlers run synchronously on the emitting
//! thread, in registration order, with the emitter's changed-keys payload
//! passed through verbatim.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::compare::filtered_eq;
use crate::error::{MonitorError, MonitorResult};
use crate::event::StateEvent;
use crate::monitor::handlers::HandlerSlot;
use crate::path::{IgnoreSet, PropPath};
use crate::state::{ListenerId, ObservableState};
use crate::status::ChangeStatus;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

struct MonitorInner {
    state: Mutex<Option<Arc<dyn ObservableState>>>,
    baseline: Value,
    ignored: Mutex<IgnoreSet>,
    handlers: Mutex<Vec<HandlerSlot>>,
    attached: Mutex<Vec<(StateEvent, ListenerId)>>,
    destroyed: AtomicBool,
    pending_initial: AtomicBool,
}

impl MonitorInner {
    fn snapshot(&self) -> Option<Value> {
        // Clone the handle out so user `to_json` code never runs under a lock.
        let state = lock(&self.state).as_ref().map(Arc::clone)?;
        Some(state.to_json())
    }

    fn compute_status(&self, current: &Value) -> ChangeStatus {
        let ignored = lock(&self.ignored);
        ChangeStatus::from_clean(filtered_eq(current, &self.baseline, &ignored))
    }

    fn dispatch(&self, event: StateEvent, changed: &[String]) {
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        let Some(current) = self.snapshot() else {
            return;
        };
        let status = self.compute_status(&current);
        trace!(event = %event, status = %status, changed = changed.len(), "dispatching change");

        let slots: Vec<HandlerSlot> = lock(&self.handlers).clone();
        let mut stale = false;
        for slot in &slots {
            if !slot.invoke(&status, Some(event), changed) {
                stale = true;
            }
        }
        if stale {
            lock(&self.handlers).retain(|slot| !slot.is_cleared());
        }
    }

    fn teardown(&self) {
        let state = lock(&self.state).take();
        let attached = std::mem::take(&mut *lock(&self.attached));

        if let Some(state) = state {
            for (event, id) in attached {
                if !state.off(event, id) {
                    debug!(event = %event, listener = %id, "listener was already detached");
                }
            }
        }

        lock(&self.handlers).clear();
        debug!("monitor destroyed");
    }
}

fn ensure_attached(inner: &Arc<MonitorInner>) {
    let mut attached = lock(&inner.attached);
    if !attached.is_empty() {
        return;
    }

    let state = lock(&inner.state).as_ref().map(Arc::clone);
    let Some(state) = state else {
        return;
    };

    for event in StateEvent::ALL {
        let weak = Arc::downgrade(inner);
        let id = state.on(
            event,
            Box::new(move |changed| {
                if let Some(inner) = weak.upgrade() {
                    inner.dispatch(event, changed);
                }
            }),
        );
        attached.push((event, id));
    }
    debug!(listeners = attached.len(), "attached state listeners");
}

/// Watches an observable state object for divergence from a baseline.
///
/// Handlers registered with [`on_change`](Self::on_change) are invoked on
/// every save, reset and fetch event with `(status, event, changed_keys)`.
/// [`destroy`](Self::destroy) detaches the monitor's listeners from the
/// state object; dropping the monitor does the same.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use serde_json::json;
/// use statewatch::{StateCell, StateEvent, StateMonitor};
///
/// let cell = Arc::new(StateCell::new());
/// let monitor = StateMonitor::new(cell.clone());
///
/// let dirty_events = Arc::new(Mutex::new(0));
/// let sink = Arc::clone(&dirty_events);
/// monitor
///     .on_change(move |status, _event, _changed| {
///         if status.dirty() {
///             *sink.lock().unwrap() += 1;
///         }
///     })
///     .unwrap();
///
/// cell.set("name", json!("edited"));
/// cell.emit(StateEvent::Save, &["name".to_string()]);
/// assert_eq!(*dirty_events.lock().unwrap(), 1);
/// ```
pub struct StateMonitor {
    inner: Arc<MonitorInner>,
}

impl StateMonitor {
    /// Monitor `state` against an empty-object baseline.
    ///
    /// No divergence call is made at registration time for a monitor built
    /// this way; the first status handlers see comes from the first event.
    #[must_use]
    pub fn new(state: Arc<dyn ObservableState>) -> Self {
        Self::build(state, Value::Object(Map::new()), false)
    }

    /// Monitor `state` against a caller-provided baseline snapshot.
    ///
    /// The monitor takes ownership of the baseline; it is immutable from
    /// here on. If the state already differs from it, that divergence is
    /// surfaced once, to the first handler registered.
    #[must_use]
    pub fn with_baseline(state: Arc<dyn ObservableState>, baseline: Value) -> Self {
        Self::build(state, baseline, true)
    }

    fn build(state: Arc<dyn ObservableState>, baseline: Value, pending_initial: bool) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                state: Mutex::new(Some(state)),
                baseline,
                ignored: Mutex::new(IgnoreSet::new()),
                handlers: Mutex::new(Vec::new()),
                attached: Mutex::new(Vec::new()),
                destroyed: AtomicBool::new(false),
                pending_initial: AtomicBool::new(pending_initial),
            }),
        }
    }

    /// Register a change handler, returning its detachable slot.
    ///
    /// The monitor's listeners are attached to the state object on the first
    /// successful registration. Clearing the returned slot detaches the
    /// handler; the monitor prunes it on the next dispatch.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn on_change<F>(&self, handler: F) -> MonitorResult<HandlerSlot>
    where
        F: FnMut(&ChangeStatus, Option<StateEvent>, &[String]) + Send + 'static,
    {
        let slot = HandlerSlot::new(handler);
        self.register(&slot)?;
        Ok(slot)
    }

    /// Register a caller-constructed handler slot.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::InvalidHandler`] if the slot holds nothing
    /// callable, and [`MonitorError::Destroyed`] after
    /// [`destroy`](Self::destroy).
    pub fn on_change_slot(&self, slot: &HandlerSlot) -> MonitorResult<()> {
        self.register(slot)
    }

    fn register(&self, slot: &HandlerSlot) -> MonitorResult<()> {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return Err(MonitorError::destroyed("register a change handler"));
        }
        if slot.is_cleared() {
            return Err(MonitorError::invalid_handler("handler slot is empty"));
        }

        ensure_attached(&self.inner);
        lock(&self.inner.handlers).push(slot.clone());

        // A divergence present at construction time is surfaced once, to the
        // first handler registered, whatever the comparison finds.
        if self.inner.pending_initial.swap(false, Ordering::SeqCst) {
            if let Some(current) = self.inner.snapshot() {
                let status = self.inner.compute_status(&current);
                if status.dirty() {
                    trace!(status = %status, "surfacing baseline divergence at registration");
                    slot.invoke(&status, None, &[]);
                }
            }
        }
        Ok(())
    }

    /// Exclude dot-delimited property paths from the dirty comparison.
    ///
    /// Callable before or after handler registration; affects only future
    /// comparisons. The underlying state is never touched.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn ignore_props<I, P>(&self, paths: I) -> MonitorResult<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PropPath>,
    {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return Err(MonitorError::destroyed("ignore properties"));
        }
        let mut ignored = lock(&self.inner.ignored);
        ignored.extend(paths);
        debug!(total = ignored.len(), "updated ignored paths");
        Ok(())
    }

    /// Compute the current clean/dirty status on demand.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Destroyed`] after [`destroy`](Self::destroy).
    pub fn status(&self) -> MonitorResult<ChangeStatus> {
        if self.inner.destroyed.load(Ordering::SeqCst) {
            return Err(MonitorError::destroyed("compute status"));
        }
        let current = self
            .inner
            .snapshot()
            .ok_or(MonitorError::destroyed("compute status"))?;
        Ok(self.inner.compute_status(&current))
    }

    /// The baseline snapshot this monitor compares against.
    #[must_use]
    pub fn baseline(&self) -> &Value {
        &self.inner.baseline
    }

    /// Number of currently registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        lock(&self.inner.handlers).len()
    }

    /// Whether [`destroy`](Self::destroy) has run.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Tear the monitor down.
    ///
    /// Detaches the monitor's listener from each of the three event names
    /// exactly once, releases the state handle and drops every registered
    /// handler. Repeated calls are a no-op.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.teardown();
    }
}

impl Drop for StateMonitor {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for StateMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMonitor")
            .field("destroyed", &self.is_destroyed())
            .field("handlers", &self.handler_count())
            .finish_non_exhaustive()
    }
}
