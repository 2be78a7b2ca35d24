//! Ordered, fail-soft process shutdown: subsystems register [`Stoppable`] units during
//! startup, the main task blocks in [`Coordinator::wait_until_signal`], and on SIGINT/SIGTERM
//! or an explicit [`Coordinator::shutdown_all_and_stop_waiting`] every unit is stopped once,
//! one at a time, in registration order. Failures are logged, never propagated.

mod coordinator;
mod error;
mod log;
mod metrics;
mod readiness;
mod registry;
mod signals;
mod stoppable;

#[cfg(test)]
mod test_utils;

pub use coordinator::{Coordinator, CoordinatorBuilder, Phase};
pub use error::{RegistrationError, StopError};
pub use log::{ShutdownLog, TracingLog};
pub use readiness::ReadinessHandler;
pub use registry::{StopList, StopRegistry};
pub use signals::{
    OsSignals, ShutdownListener, SignalHandler, SignalSource, TerminationEvent,
    TerminationNotifier,
};
pub use stoppable::Stoppable;
