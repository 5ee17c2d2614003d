//! `gatewatch export`: monitors plus the HTTP exporter.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use gatewatch_config::Config;
use gatewatch_core::{MemoryRepository, Monitor, Sinks};

use crate::cli::{ExportArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::metrics::PrometheusMetrics;
use crate::server::{self, AppState};

pub async fn handle(args: &ExportArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let configs = if args.all {
        config::all_monitor_configs(global, cfg)?
    } else {
        vec![config::selected_monitor_config(global, cfg)?]
    };

    let metrics = PrometheusMetrics::new()?;
    let repository = Arc::new(MemoryRepository::new(cfg.export.history));
    let alerts = super::alert_sinks(cfg)?;

    let mut monitors = Vec::with_capacity(configs.len());
    for monitor_cfg in configs {
        let sinks = Sinks {
            repository: Some(repository.clone()),
            metrics: vec![Arc::new(metrics.clone())],
            alerts: alerts.clone(),
        };
        match Monitor::start(monitor_cfg, sinks).await {
            Ok(monitor) => monitors.push(monitor),
            Err(e) => {
                stop_all(&monitors).await;
                return Err(e.into());
            }
        }
    }

    let addr = args
        .listen
        .clone()
        .unwrap_or_else(|| cfg.export.listen.clone());
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            stop_all(&monitors).await;
            return Err(CliError::Listen {
                addr,
                reason: e.to_string(),
            });
        }
    };
    info!(%addr, gateways = monitors.len(), "exporter listening");

    let state = Arc::new(AppState {
        monitors: monitors.clone(),
        metrics,
        repository,
    });
    let served = server::serve(listener, state, shutdown_signal()).await;

    stop_all(&monitors).await;
    Ok(served?)
}

async fn stop_all(monitors: &[Monitor]) {
    for monitor in monitors {
        monitor.shutdown().await;
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutting down");
}
