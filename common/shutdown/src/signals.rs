//! One-shot termination trigger: OS signals or an explicit call, whichever comes first.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A labeled request to terminate the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminationEvent {
    label: String,
}

impl TerminationEvent {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub(crate) fn programmatic() -> Self {
        Self::new("programmatic")
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for TerminationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// External source of termination requests, consumed by the listener task.
#[async_trait]
pub trait TerminationNotifier: Send + 'static {
    /// Resolves with the next request. `None` means the source will never deliver one.
    async fn recv(&mut self) -> Option<TerminationEvent>;
}

/// SIGINT and SIGTERM.
pub struct OsSignals {
    interrupt: Signal,
    terminate: Signal,
}

impl OsSignals {
    /// Installs the handlers. Must be called from within a tokio runtime.
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }
}

#[async_trait]
impl TerminationNotifier for OsSignals {
    async fn recv(&mut self) -> Option<TerminationEvent> {
        tokio::select! {
            Some(()) = self.interrupt.recv() => Some(TerminationEvent::new("SIGINT")),
            Some(()) = self.terminate.recv() => Some(TerminationEvent::new("SIGTERM")),
            else => None,
        }
    }
}

/// Lets tests and embedders feed synthetic requests through a channel.
#[async_trait]
impl TerminationNotifier for mpsc::Receiver<TerminationEvent> {
    async fn recv(&mut self) -> Option<TerminationEvent> {
        mpsc::Receiver::recv(self).await
    }
}

/// Receives the trigger once, before any waiter is released.
#[async_trait]
pub trait ShutdownListener: Send + Sync {
    async fn shutdown_signal_received(&self);
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Suspends until the trigger has been handled. Returns immediately if that already happened.
    async fn wait_for_trigger(&self);

    /// Fires the trigger without an external request. Only the first call has an effect.
    fn notify_and_release(&self);
}

/// Default [`SignalSource`]: a listener task racing the notifier against the explicit trigger.
pub struct SignalHandler {
    notify: CancellationToken,
    released: CancellationToken,
}

impl SignalHandler {
    /// Spawns the listener task on the current tokio runtime.
    ///
    /// Waiters are released after `listener` returns, or if the task unwinds.
    pub fn spawn<N>(mut notifier: N, listener: Arc<dyn ShutdownListener>) -> Self
    where
        N: TerminationNotifier,
    {
        let notify = CancellationToken::new();
        let released = CancellationToken::new();

        let trigger = notify.clone();
        let release = released.clone().drop_guard();
        tokio::spawn(async move {
            let _release = release;
            let event = tokio::select! {
                biased;

                _ = trigger.cancelled() => TerminationEvent::programmatic(),
                Some(event) = notifier.recv() => event,
            };
            info!(trigger = %event, "Shutdown: termination requested");
            listener.shutdown_signal_received().await;
        });

        Self { notify, released }
    }

    pub fn is_released(&self) -> bool {
        self.released.is_cancelled()
    }
}

#[async_trait]
impl SignalSource for SignalHandler {
    async fn wait_for_trigger(&self) {
        self.released.cancelled().await
    }

    fn notify_and_release(&self) {
        self.notify.cancel()
    }
}
