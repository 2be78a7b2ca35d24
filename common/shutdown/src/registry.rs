//! Ordered registry of stoppable units.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use futures::FutureExt;
#[cfg(test)]
use mockall::automock;
use tracing::debug;

use crate::error::{RegistrationError, StopError};
use crate::log::ShutdownLog;
use crate::metrics;
use crate::stoppable::Stoppable;

/// Storage for the stop sequence. The order at the moment
/// [`stop_all_in_order`](StopRegistry::stop_all_in_order) starts is the stop order.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StopRegistry: Send + Sync {
    fn add_to_front(&self, item: Arc<dyn Stoppable>) -> Result<(), RegistrationError>;

    fn add_to_back(&self, item: Arc<dyn Stoppable>) -> Result<(), RegistrationError>;

    /// Stops every unit head to tail, one at a time, logging each outcome. A failing unit
    /// never prevents the remaining ones from being stopped.
    async fn stop_all_in_order(&self, log: Arc<dyn ShutdownLog>);
}

/// Default [`StopRegistry`]: a deque that is drained exactly once.
///
/// Draining takes the deque out from under the lock before the first stop is awaited, so
/// registration and shutdown never overlap: an insertion racing a shutdown either lands
/// before the drain and gets stopped, or fails with [`RegistrationError::Closed`].
pub struct StopList {
    items: Mutex<Option<VecDeque<Arc<dyn Stoppable>>>>,
}

impl StopList {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Some(VecDeque::new())),
        }
    }

    /// Number of units waiting to be stopped; zero once drained.
    pub fn len(&self) -> usize {
        match self.items.lock() {
            Ok(items) => items.as_ref().map_or(0, VecDeque::len),
            Err(poisoned) => poisoned.into_inner().as_ref().map_or(0, VecDeque::len),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once a shutdown has taken the list.
    pub fn is_closed(&self) -> bool {
        match self.items.lock() {
            Ok(items) => items.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    fn insert(&self, item: Arc<dyn Stoppable>, to_front: bool) -> Result<(), RegistrationError> {
        let mut guard = self.items.lock().map_err(|_| RegistrationError::Poisoned)?;
        let items = guard.as_mut().ok_or(RegistrationError::Closed)?;
        if to_front {
            items.push_front(item);
        } else {
            items.push_back(item);
        }
        Ok(())
    }

    fn drain(&self) -> Option<VecDeque<Arc<dyn Stoppable>>> {
        match self.items.lock() {
            Ok(mut items) => items.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Default for StopList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StopRegistry for StopList {
    fn add_to_front(&self, item: Arc<dyn Stoppable>) -> Result<(), RegistrationError> {
        self.insert(item, true)
    }

    fn add_to_back(&self, item: Arc<dyn Stoppable>) -> Result<(), RegistrationError> {
        self.insert(item, false)
    }

    async fn stop_all_in_order(&self, log: Arc<dyn ShutdownLog>) {
        let Some(items) = self.drain() else {
            debug!("Shutdown: registry already drained, nothing to stop");
            return;
        };
        debug!(components = items.len(), "Shutdown: stopping registered components");

        for item in items {
            let clock = Instant::now();
            let result = AssertUnwindSafe(item.stop())
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(StopError::Panicked(panic_message(panic.as_ref()))));
            let elapsed = clock.elapsed();

            let outcome = if result.is_ok() { "stopped" } else { "failed" };
            metrics::emit_component_stop_result(item.name(), outcome);
            metrics::emit_component_stop_duration(item.name(), outcome, elapsed.as_secs_f64());
            log.stop_result(item.name(), elapsed, &result);
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
