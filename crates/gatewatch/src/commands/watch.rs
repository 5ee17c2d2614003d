//! `gatewatch watch`: live tick stream until Ctrl-C or `--count`.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use gatewatch_config::Config;
use gatewatch_core::{Monitor, Sinks, TickResult};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(args: &WatchArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut monitor_cfg = config::selected_monitor_config(global, cfg)?;
    if let Some(ms) = args.interval {
        if ms == 0 {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be greater than 0".into(),
            });
        }
        monitor_cfg.poller.interval = Duration::from_millis(ms);
    }

    let sinks = Sinks {
        alerts: super::alert_sinks(cfg)?,
        ..Sinks::default()
    };
    let monitor = Monitor::start(monitor_cfg, sinks).await?;
    info!(gateway = monitor.name(), model = %monitor.model(), "watching");

    let mut feed = monitor.subscribe();
    // The poll task may already have stopped before we subscribed.
    if let Some(err) = monitor.fatal_error() {
        let err = err.clone();
        monitor.shutdown().await;
        return Err(err.into());
    }
    let color = output::should_color();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut seen: u64 = 0;
    let result = loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break Ok(()),
            msg = feed.recv() => match msg {
                Ok(tick) => {
                    if let Err(e) = print_tick(&tick, global.output, color) {
                        break Err(e);
                    }
                    if let Some(err) = monitor.fatal_error() {
                        break Err(err.clone().into());
                    }
                    seen += 1;
                    if args.count.is_some_and(|n| seen >= n) {
                        break Ok(());
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!(missed, "output fell behind, skipped ticks"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    monitor.shutdown().await;
    result
}

fn print_tick(tick: &TickResult, format: OutputFormat, color: bool) -> Result<(), CliError> {
    let text = match format {
        OutputFormat::Table => output::tick_line(tick, color),
        // One object per line so the stream stays line-delimited.
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(tick)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(tick)?),
    };
    output::print_output(&text);
    Ok(())
}
