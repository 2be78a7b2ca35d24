use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shutdown::{StopError, Stoppable};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Background loop doing a unit of work every `interval` until stopped.
pub struct Ticker {
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    ticks: Arc<AtomicU64>,
}

impl Ticker {
    pub fn start(interval: Duration) -> Arc<Self> {
        let token = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run(interval, token.clone(), ticks.clone()));
        Arc::new(Self {
            token,
            task: Mutex::new(Some(task)),
            ticks,
        })
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}

async fn run(interval: Duration, token: CancellationToken, ticks: Arc<AtomicU64>) {
    let mut interval = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let count = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(ticks = count, "worker tick");
            }
        }
    }
    info!(ticks = ticks.load(Ordering::Relaxed), "ticker exited");
}

#[async_trait]
impl Stoppable for Ticker {
    fn name(&self) -> &str {
        "ticker"
    }

    async fn stop(&self) -> Result<(), StopError> {
        self.token.cancel();
        let task = self
            .task
            .lock()
            .map_err(|_| StopError::failed("ticker task lock poisoned"))?
            .take();
        if let Some(task) = task {
            task.await
                .map_err(|e| StopError::failed(format!("ticker task failed: {e}")))?;
        }
        Ok(())
    }
}
