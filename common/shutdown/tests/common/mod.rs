#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shutdown::{RegistrationError, ShutdownLog, StopError, Stoppable};

/// Shared, ordered record of stop calls.
pub type Calls = Arc<Mutex<Vec<String>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// Stoppable that records its name, optionally takes a while, and optionally fails or panics.
pub struct TestUnit {
    name: String,
    calls: Calls,
    delay: Duration,
    failure: Option<String>,
    panics: bool,
    in_flight: Option<Arc<AtomicBool>>,
}

impl TestUnit {
    pub fn new(name: &str, calls: &Calls) -> Self {
        Self {
            name: name.to_string(),
            calls: calls.clone(),
            delay: Duration::ZERO,
            failure: None,
            panics: false,
            in_flight: None,
        }
    }

    pub fn failing_with(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub fn taking(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Panics if another unit sharing `flag` is stopping at the same time.
    pub fn exclusive(mut self, flag: &Arc<AtomicBool>) -> Self {
        self.in_flight = Some(flag.clone());
        self
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Stoppable for TestUnit {
    fn name(&self) -> &str {
        &self.name
    }

    async fn stop(&self) -> Result<(), StopError> {
        if let Some(flag) = &self.in_flight {
            assert!(
                !flag.swap(true, Ordering::SeqCst),
                "{} started stopping while another unit was still stopping",
                self.name
            );
        }
        self.calls.lock().unwrap().push(self.name.clone());
        if self.panics {
            panic!("{} refused to stop", self.name);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(flag) = &self.in_flight {
            flag.store(false, Ordering::SeqCst);
        }
        match &self.failure {
            Some(reason) => Err(StopError::failed(reason.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Stopped(String),
    StopFailed(String, String),
    RegistrationFailed(String, RegistrationError),
}

#[derive(Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl ShutdownLog for RecordingLog {
    fn stop_result(&self, name: &str, _elapsed: Duration, result: &Result<(), StopError>) {
        let entry = match result {
            Ok(()) => LogEntry::Stopped(name.to_string()),
            Err(e) => LogEntry::StopFailed(name.to_string(), e.to_string()),
        };
        self.entries.lock().unwrap().push(entry);
    }

    fn registration_failed(&self, name: &str, error: &RegistrationError) {
        self.entries
            .lock()
            .unwrap()
            .push(LogEntry::RegistrationFailed(name.to_string(), error.clone()));
    }
}
