//! Error types for statewatch.
//!
//! All errors are strongly typed using thiserror. Both kinds are
//! programmer-error contracts enforced eagerly at the violating call;
//! there is no retry or recovery path.

use thiserror::Error;

/// Errors raised by a [`StateMonitor`](crate::StateMonitor).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// The supplied handler holds nothing callable.
    ///
    /// Raised when registering a [`HandlerSlot`](crate::HandlerSlot) whose
    /// callable has already been detached by its owner.
    #[error("change handler must be a function: {reason}")]
    InvalidHandler {
        /// What made the handler unusable.
        reason: String,
    },

    /// The monitor was torn down and rejects further use.
    #[error("state monitor has been destroyed: cannot {operation}")]
    Destroyed {
        /// The operation that was rejected.
        operation: &'static str,
    },
}

impl MonitorError {
    /// Creates an invalid-handler error.
    #[must_use]
    pub fn invalid_handler(reason: impl Into<String>) -> Self {
        Self::InvalidHandler {
            reason: reason.into(),
        }
    }

    /// Creates a destroyed-monitor error for the rejected operation.
    #[must_use]
    pub const fn destroyed(operation: &'static str) -> Self {
        Self::Destroyed { operation }
    }

    /// Returns true if this is an invalid-handler error.
    #[must_use]
    pub const fn is_invalid_handler(&self) -> bool {
        matches!(self, Self::InvalidHandler { .. })
    }

    /// Returns true if this is a destroyed-monitor error.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed { .. })
    }
}

/// Result type alias for statewatch operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
