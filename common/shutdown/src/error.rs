//! Error types reported to the [`ShutdownLog`](crate::ShutdownLog). None of them escape to callers.

use thiserror::Error;

/// Returned by [`Stoppable::stop`](crate::Stoppable::stop) when a unit could not stop cleanly.
#[derive(Debug, Error)]
pub enum StopError {
    #[error("{0}")]
    Failed(String),

    #[error("io error while stopping: {0}")]
    Io(#[from] std::io::Error),

    /// The unit's stop future panicked; the payload message is kept when it is a string.
    #[error("stop panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl StopError {
    pub fn failed(reason: impl Into<String>) -> Self {
        StopError::Failed(reason.into())
    }
}

/// Returned by [`StopRegistry`](crate::StopRegistry) insertions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The registry was already drained by a shutdown.
    #[error("registry is closed, shutdown has already started")]
    Closed,

    #[error("registry lock poisoned")]
    Poisoned,
}
