//! K8s readiness probe handler.

use axum::http::StatusCode;
use tokio::sync::watch;

use crate::coordinator::Phase;

/// Axum-compatible readiness probe; returns 200 until shutdown begins, 503 afterwards.
#[derive(Clone)]
pub struct ReadinessHandler {
    phase: watch::Receiver<Phase>,
}

impl ReadinessHandler {
    pub(crate) fn new(phase: watch::Receiver<Phase>) -> Self {
        Self { phase }
    }

    /// Reads the current phase; no I/O.
    pub async fn check(&self) -> StatusCode {
        if self.phase.borrow().is_shutting_down() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }
}
