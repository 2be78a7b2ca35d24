use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{RegistrationError, StopError};
use crate::log::ShutdownLog;
use crate::stoppable::Stoppable;

/// Stoppable that always stops cleanly.
pub struct Named(String);

impl Named {
    pub fn arc(name: &str) -> Arc<Self> {
        Arc::new(Self(name.to_string()))
    }
}

#[async_trait]
impl Stoppable for Named {
    fn name(&self) -> &str {
        &self.0
    }

    async fn stop(&self) -> Result<(), StopError> {
        Ok(())
    }
}

/// Keeps registration failures only. Stop outcomes are covered by the integration tests.
#[derive(Default)]
pub struct RegistrationLog {
    failures: Mutex<Vec<(String, RegistrationError)>>,
}

impl RegistrationLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failures(&self) -> Vec<(String, RegistrationError)> {
        self.failures.lock().unwrap().clone()
    }
}

impl ShutdownLog for RegistrationLog {
    fn stop_result(&self, _name: &str, _elapsed: Duration, _result: &Result<(), StopError>) {}

    fn registration_failed(&self, name: &str, error: &RegistrationError) {
        self.failures
            .lock()
            .unwrap()
            .push((name.to_string(), error.clone()));
    }
}
