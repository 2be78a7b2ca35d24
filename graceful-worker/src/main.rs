//! Demo service wiring a ticking worker and an HTTP server into the shutdown coordinator.

use anyhow::{Context, Result};
use graceful_worker::config::Config;
use graceful_worker::http::{router, HttpServer};
use graceful_worker::ticker::Ticker;
use shutdown::Coordinator;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<()> {
    let log_layer = fmt::layer().with_filter(
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy(),
    );
    tracing_subscriber::registry().with(log_layer).init();

    let config = Config::from_args(std::env::args_os()).with_context(|| {
        format!(
            "invalid configuration, supported settings:\n{}",
            Config::usage()
        )
    })?;

    let coordinator =
        Coordinator::with_os_signals("graceful-worker").context("failed to install signal handlers")?;

    // Back of the list: keeps ticking while the server drains.
    coordinator.register(Ticker::start(config.tick_interval), false);

    let server = HttpServer::start(&config.bind(), router(coordinator.clone()))
        .await
        .with_context(|| format!("failed to bind {}", config.bind()))?;
    coordinator.register(server, true);

    coordinator.wait_until_signal().await;
    info!("graceful-worker exited");
    Ok(())
}
