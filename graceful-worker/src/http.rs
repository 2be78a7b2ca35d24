use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use shutdown::{Coordinator, StopError, Stoppable};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Probe endpoints plus `POST /_shutdown`, which starts the same sequence a SIGTERM would.
pub fn router(coordinator: Coordinator) -> Router {
    let readiness = coordinator.readiness_handler();
    Router::new()
        .route("/_readiness", get(move || async move { readiness.check().await }))
        .route("/_liveness", get(|| async { "ok" }))
        .route(
            "/_shutdown",
            post(move || async move {
                coordinator.shutdown_all_and_stop_waiting();
                StatusCode::ACCEPTED
            }),
        )
}

/// HTTP server that drains in-flight requests when stopped.
pub struct HttpServer {
    addr: SocketAddr,
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl HttpServer {
    pub async fn start(bind: &str, app: Router) -> std::io::Result<Arc<Self>> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        let token = CancellationToken::new();

        let cancelled = token.clone();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { cancelled.cancelled().await })
                .await
        });
        info!(address = %addr, "listening");

        Ok(Arc::new(Self {
            addr,
            token,
            task: Mutex::new(Some(task)),
        }))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

#[async_trait]
impl Stoppable for HttpServer {
    fn name(&self) -> &str {
        "http-server"
    }

    async fn stop(&self) -> Result<(), StopError> {
        self.token.cancel();
        let task = self
            .task
            .lock()
            .map_err(|_| StopError::failed("server task lock poisoned"))?
            .take();
        if let Some(task) = task {
            task.await
                .map_err(|e| StopError::failed(format!("server task failed: {e}")))??;
        }
        Ok(())
    }
}
