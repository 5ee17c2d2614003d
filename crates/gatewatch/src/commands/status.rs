//! `gatewatch status`: one status request, rendered once.

use chrono::Utc;
use serde::Serialize;

use gatewatch_api::{GatewayClient, GatewayStatus, detect};
use gatewatch_config::Config;
use gatewatch_core::{SignalQuality, SignalSample, classify, sample_from_status};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusReport {
    gateway: String,
    quality: SignalQuality,
    status: GatewayStatus,
    sample: SignalSample,
}

pub async fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = config::selected_monitor_config(global, cfg)?;
    let detected = detect(monitor.model, &monitor.url, &monitor.transport).await?;

    // Auto-detection already fetched a status; don't ask twice.
    let status = match detected.probe {
        Some(status) => status,
        None => detected.client.get_status().await?,
    };
    detected.client.close();

    let report = StatusReport {
        gateway: monitor.name,
        quality: classify(status.signal.sinr),
        sample: sample_from_status(&status, Utc::now()),
        status,
    };

    let color = output::should_color();
    let out = output::render_single(global.output, &report, |r| {
        output::status_detail(&r.status, r.quality, color)
    })?;
    output::print_output(&out);
    Ok(())
}
