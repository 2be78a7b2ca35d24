use async_trait::async_trait;

use crate::error::StopError;

/// A unit that takes part in the ordered shutdown.
///
/// Implemented by each subsystem that owns something worth stopping: servers,
/// consumers, connection pools. The registry only holds an `Arc` to it, the
/// subsystem keeps ownership.
#[async_trait]
pub trait Stoppable: Send + Sync {
    /// Label used in logs and metrics.
    fn name(&self) -> &str;

    /// Called exactly once per registration when shutdown runs. Units are stopped one at a
    /// time, so a stop that never returns stalls every unit registered after it.
    async fn stop(&self) -> Result<(), StopError>;
}
