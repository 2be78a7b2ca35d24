//! Shutdown coordinator: unit registration, blocking wait, ordered stop sequence.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, info_span, Instrument};

use crate::log::{ShutdownLog, TracingLog};
use crate::metrics;
use crate::readiness::ReadinessHandler;
use crate::registry::{StopList, StopRegistry};
use crate::signals::{OsSignals, ShutdownListener, SignalHandler, SignalSource, TerminationNotifier};
use crate::stoppable::Stoppable;

/// Coordinator state. Moves forward only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Accepting registrations, nobody waiting yet.
    Initializing,
    /// [`Coordinator::wait_until_signal`] has been called.
    WaitingForSignal,
    /// A trigger was received; units are being stopped.
    ShuttingDown,
    /// Every registered unit got its stop attempt.
    Terminated,
}

impl Phase {
    pub fn is_shutting_down(self) -> bool {
        matches!(self, Phase::ShuttingDown | Phase::Terminated)
    }
}

/// Runs the stop sequence; handed to the signal source as its listener.
struct Orchestrator {
    name: String,
    registry: Arc<dyn StopRegistry>,
    log: Arc<dyn ShutdownLog>,
    phase: watch::Sender<Phase>,
}

impl Orchestrator {
    /// Resolves once the stop sequence has completed.
    async fn terminated(&self) {
        let mut phase = self.phase.subscribe();
        while *phase.borrow_and_update() != Phase::Terminated {
            if phase.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait]
impl ShutdownListener for Orchestrator {
    async fn shutdown_signal_received(&self) {
        let started = self.phase.send_if_modified(|phase| {
            if phase.is_shutting_down() {
                return false;
            }
            *phase = Phase::ShuttingDown;
            true
        });
        if !started {
            debug!(service = %self.name, "Shutdown: already in progress, trigger ignored");
            return;
        }

        metrics::emit_shutdown_initiated(&self.name);
        let clock = Instant::now();
        async {
            info!("Shutdown: stopping components in registration order");
            self.registry.stop_all_in_order(self.log.clone()).await;
        }
        .instrument(info_span!("shutdown", service = %self.name))
        .await;

        self.phase.send_replace(Phase::Terminated);
        metrics::emit_shutdown_completed(&self.name);
        info!(
            service = %self.name,
            total_duration_secs = clock.elapsed().as_secs_f64(),
            "Shutdown: complete"
        );
    }
}

/// Collects [`Stoppable`] units during startup and stops them in order once terminated.
///
/// Cheap to clone; clones share the same registry and trigger, so one clone can block in
/// [`wait_until_signal`](Coordinator::wait_until_signal) while another, e.g. inside an HTTP
/// handler, calls [`shutdown_all_and_stop_waiting`](Coordinator::shutdown_all_and_stop_waiting).
///
/// Registering once shutdown has started is the caller's mistake. It is not blocked; the
/// default registry rejects it and the failure is logged.
#[derive(Clone)]
pub struct Coordinator {
    orchestrator: Arc<Orchestrator>,
    signals: Arc<dyn SignalSource>,
}

impl Coordinator {
    pub fn builder(name: &str) -> CoordinatorBuilder {
        CoordinatorBuilder::new(name)
    }

    /// Coordinator triggered by SIGINT/SIGTERM, with the default registry and tracing log.
    /// Must be called from within a tokio runtime.
    pub fn with_os_signals(name: &str) -> std::io::Result<Self> {
        Ok(Self::builder(name).build(OsSignals::new()?))
    }

    pub fn name(&self) -> &str {
        &self.orchestrator.name
    }

    /// Adds `item` to the stop sequence, at the head if `to_front`, otherwise at the tail.
    /// A failed insertion is logged with the item's name and otherwise ignored.
    pub fn register(&self, item: Arc<dyn Stoppable>, to_front: bool) {
        let registry = &self.orchestrator.registry;
        let result = if to_front {
            registry.add_to_front(item.clone())
        } else {
            registry.add_to_back(item.clone())
        };

        match result {
            Ok(()) => debug!(
                service = %self.name(),
                component = %item.name(),
                to_front,
                "Shutdown: component registered"
            ),
            Err(e) => {
                metrics::emit_registration_failed(self.name());
                self.orchestrator.log.registration_failed(item.name(), &e);
            }
        }
    }

    /// Blocks until a termination trigger arrived and the stop sequence has run. Also returns
    /// once a directly driven [`shutdown_signal_received`](Coordinator::shutdown_signal_received)
    /// has completed.
    pub async fn wait_until_signal(&self) {
        let waiting = self.orchestrator.phase.send_if_modified(|phase| {
            if *phase != Phase::Initializing {
                return false;
            }
            *phase = Phase::WaitingForSignal;
            true
        });
        if waiting {
            info!(service = %self.name(), "Shutdown: waiting for termination signal");
        }
        tokio::select! {
            _ = self.signals.wait_for_trigger() => {}
            _ = self.orchestrator.terminated() => {}
        }
    }

    /// Stops every registered unit in order, then releases anyone in
    /// [`wait_until_signal`](Coordinator::wait_until_signal). Normally driven by the signal
    /// listener; only the first call runs the sequence.
    pub async fn shutdown_signal_received(&self) {
        self.orchestrator.shutdown_signal_received().await
    }

    /// Triggers shutdown without an OS signal, releasing anyone blocked in
    /// [`wait_until_signal`](Coordinator::wait_until_signal) once the units are stopped.
    pub fn shutdown_all_and_stop_waiting(&self) {
        info!(service = %self.name(), "Shutdown: requested programmatically");
        self.signals.notify_and_release();
    }

    pub fn phase(&self) -> Phase {
        *self.orchestrator.phase.borrow()
    }

    /// Receiver notified on every phase transition.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.orchestrator.phase.subscribe()
    }

    /// Axum-compatible handler for `/_readiness`.
    pub fn readiness_handler(&self) -> ReadinessHandler {
        ReadinessHandler::new(self.subscribe())
    }
}

/// Builder for [`Coordinator`]; defaults to a [`StopList`] registry and [`TracingLog`].
pub struct CoordinatorBuilder {
    name: String,
    log: Option<Arc<dyn ShutdownLog>>,
    registry: Option<Arc<dyn StopRegistry>>,
}

impl CoordinatorBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            log: None,
            registry: None,
        }
    }

    pub fn with_log(mut self, log: Arc<dyn ShutdownLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn StopRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Spawns the signal listener on the current tokio runtime, fed by `notifier`.
    pub fn build<N>(self, notifier: N) -> Coordinator
    where
        N: TerminationNotifier,
    {
        let orchestrator = self.orchestrator();
        let signals = SignalHandler::spawn(notifier, orchestrator.clone());
        Coordinator {
            orchestrator,
            signals: Arc::new(signals),
        }
    }

    /// Uses `signals` as is. Whoever provides it is responsible for calling
    /// [`Coordinator::shutdown_signal_received`] when it fires; waiters return once that call
    /// completes or `signals` releases them, whichever happens first.
    pub fn build_with_signal_source(self, signals: Arc<dyn SignalSource>) -> Coordinator {
        Coordinator {
            orchestrator: self.orchestrator(),
            signals,
        }
    }

    fn orchestrator(self) -> Arc<Orchestrator> {
        let (phase, _) = watch::channel(Phase::Initializing);
        Arc::new(Orchestrator {
            name: self.name,
            registry: self.registry.unwrap_or_else(|| Arc::new(StopList::new())),
            log: self.log.unwrap_or_else(|| Arc::new(TracingLog)),
            phase,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::RegistrationError;
    use crate::registry::MockStopRegistry;
    use crate::signals::MockSignalSource;
    use crate::test_utils::{Named, RegistrationLog};

    fn coordinator(
        registry: MockStopRegistry,
        signals: MockSignalSource,
        log: Arc<RegistrationLog>,
    ) -> Coordinator {
        Coordinator::builder("test")
            .with_registry(Arc::new(registry))
            .with_log(log)
            .build_with_signal_source(Arc::new(signals))
    }

    #[test]
    fn registers_at_the_requested_end() {
        let mut registry = MockStopRegistry::new();
        registry
            .expect_add_to_front()
            .withf(|item| item.name() == "one")
            .times(1)
            .returning(|_| Ok(()));
        registry
            .expect_add_to_back()
            .withf(|item| item.name() == "two")
            .times(1)
            .returning(|_| Ok(()));
        let log = RegistrationLog::new();
        let coordinator = coordinator(registry, MockSignalSource::new(), log.clone());

        coordinator.register(Named::arc("one"), true);
        coordinator.register(Named::arc("two"), false);

        assert!(log.failures().is_empty());
    }

    #[test]
    fn logs_failure_if_unit_can_not_be_added_to_front() {
        let mut registry = MockStopRegistry::new();
        registry
            .expect_add_to_front()
            .times(1)
            .returning(|_| Err(RegistrationError::Closed));
        let log = RegistrationLog::new();
        let coordinator = coordinator(registry, MockSignalSource::new(), log.clone());

        coordinator.register(Named::arc("some service"), true);

        assert_eq!(
            log.failures(),
            vec![("some service".to_string(), RegistrationError::Closed)]
        );
    }

    #[test]
    fn logs_failure_if_unit_can_not_be_added_to_back() {
        let mut registry = MockStopRegistry::new();
        registry
            .expect_add_to_back()
            .times(1)
            .returning(|_| Err(RegistrationError::Poisoned));
        let log = RegistrationLog::new();
        let coordinator = coordinator(registry, MockSignalSource::new(), log.clone());

        coordinator.register(Named::arc("some service"), false);

        assert_eq!(
            log.failures(),
            vec![("some service".to_string(), RegistrationError::Poisoned)]
        );
    }

    #[tokio::test]
    async fn waits_on_the_signal_source() {
        let mut signals = MockSignalSource::new();
        signals.expect_wait_for_trigger().times(1).return_const(());
        let coordinator = coordinator(MockStopRegistry::new(), signals, RegistrationLog::new());
        assert_eq!(coordinator.phase(), Phase::Initializing);

        coordinator.wait_until_signal().await;

        assert_eq!(coordinator.phase(), Phase::WaitingForSignal);
    }

    #[test]
    fn tells_the_signal_source_to_stop_waiting() {
        let mut signals = MockSignalSource::new();
        signals.expect_notify_and_release().times(1).return_const(());
        let coordinator = coordinator(MockStopRegistry::new(), signals, RegistrationLog::new());

        coordinator.shutdown_all_and_stop_waiting();
    }

    #[tokio::test]
    async fn signal_stops_the_registry_exactly_once() {
        let mut registry = MockStopRegistry::new();
        registry.expect_stop_all_in_order().times(1).return_const(());
        let coordinator = coordinator(registry, MockSignalSource::new(), RegistrationLog::new());
        let mut phases = coordinator.subscribe();

        coordinator.shutdown_signal_received().await;
        assert_eq!(coordinator.phase(), Phase::Terminated);
        assert!(phases.has_changed().unwrap());

        coordinator.shutdown_signal_received().await;
        assert_eq!(*phases.borrow_and_update(), Phase::Terminated);
    }

    /// Signal source that never fires on its own.
    struct Silent;

    #[async_trait]
    impl SignalSource for Silent {
        async fn wait_for_trigger(&self) {
            std::future::pending::<()>().await
        }

        fn notify_and_release(&self) {}
    }

    #[tokio::test]
    async fn directly_driven_sequence_releases_waiters() {
        let mut registry = MockStopRegistry::new();
        registry.expect_stop_all_in_order().times(1).return_const(());
        let coordinator = Coordinator::builder("test")
            .with_registry(Arc::new(registry))
            .with_log(RegistrationLog::new())
            .build_with_signal_source(Arc::new(Silent));

        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.wait_until_signal().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        coordinator.shutdown_signal_received().await;

        tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("waiter still blocked")
            .unwrap();
        assert_eq!(coordinator.phase(), Phase::Terminated);

        // Late waiters return straight away too.
        tokio::time::timeout(Duration::from_millis(50), coordinator.wait_until_signal())
            .await
            .expect("late waiter blocked");
    }

    #[tokio::test]
    async fn os_signal_coordinator_starts_initializing() {
        let coordinator = Coordinator::with_os_signals("svc").expect("signal handlers");

        assert_eq!(coordinator.name(), "svc");
        assert_eq!(coordinator.phase(), Phase::Initializing);
        assert_eq!(
            coordinator.readiness_handler().check().await,
            axum::http::StatusCode::OK
        );
    }

    #[test]
    fn phase_reports_shutting_down() {
        assert!(!Phase::Initializing.is_shutting_down());
        assert!(!Phase::WaitingForSignal.is_shutting_down());
        assert!(Phase::ShuttingDown.is_shutting_down());
        assert!(Phase::Terminated.is_shutting_down());
    }
}
