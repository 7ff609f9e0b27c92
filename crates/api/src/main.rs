use std::sync::Arc;

use anyhow::Context;

use clientreg_infra::config::AppConfig;
use clientreg_observability::ProcessClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    clientreg_observability::init();

    let clock = Arc::new(ProcessClock::start());
    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!(
        persistent = config.use_persistent_stores,
        validation = ?config.document_validation,
        "configuration loaded"
    );

    let (app, services, counter_handle) = clientreg_api::app::build_app(&config, clock)
        .await
        .context("failed to bootstrap services")?;

    let listener = tokio::net::TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    let restart_marker = tokio::spawn(record_restarts(services.clone()));
    drop(services);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    restart_marker.abort();
    let _ = restart_marker.await;
    let counted = counter_handle.join().await;
    tracing::info!(counted, "server shutdown complete");
    Ok(())
}

/// SIGHUP marks a restart of the serving components in the uptime report.
#[cfg(unix)]
async fn record_restarts(services: Arc<clientreg_api::app::services::AppServices>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("failed to install SIGHUP handler: {e}");
            return;
        }
    };
    while hangup.recv().await.is_some() {
        services.metrics.record_restart();
    }
}

#[cfg(not(unix))]
async fn record_restarts(_services: Arc<clientreg_api::app::services::AppServices>) {}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
