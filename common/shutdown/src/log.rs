//! The logging capability shared by registration and shutdown.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{RegistrationError, StopError};

/// Records per-unit outcomes. Implementations must tolerate calls from any task.
pub trait ShutdownLog: Send + Sync {
    /// One call per stop attempt, in stop order.
    fn stop_result(&self, name: &str, elapsed: Duration, result: &Result<(), StopError>);

    fn registration_failed(&self, name: &str, error: &RegistrationError);
}

/// Default sink: structured `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLog;

impl ShutdownLog for TracingLog {
    fn stop_result(&self, name: &str, elapsed: Duration, result: &Result<(), StopError>) {
        match result {
            Ok(()) => info!(
                component = %name,
                duration_secs = elapsed.as_secs_f64(),
                result = "stopped",
                "Shutdown: component stopped"
            ),
            Err(e) => warn!(
                component = %name,
                duration_secs = elapsed.as_secs_f64(),
                result = "failed",
                error = %e,
                "Shutdown: component failed to stop"
            ),
        }
    }

    fn registration_failed(&self, name: &str, error: &RegistrationError) {
        warn!(component = %name, error = %error, "Shutdown: failed to register component");
    }
}
