//! `gatewatch detect`

use serde::Serialize;

use gatewatch_api::{GatewayClient, GatewayModel, detect};
use gatewatch_config::Config;

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct DetectReport {
    gateway: String,
    url: String,
    model: GatewayModel,
    /// False when the model was pinned and no request was made.
    probed: bool,
}

pub async fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = config::selected_monitor_config(global, cfg)?;
    let detected = detect(monitor.model, &monitor.url, &monitor.transport).await?;

    let report = DetectReport {
        gateway: monitor.name,
        url: monitor.url.to_string(),
        model: detected.model(),
        probed: detected.probe.is_some(),
    };
    detected.client.close();

    let out = output::render_single(global.output, &report, |r| {
        if r.probed {
            format!("{} at {}", r.model, r.url)
        } else {
            format!("{} at {} (pinned, not probed)", r.model, r.url)
        }
    })?;
    output::print_output(&out);
    Ok(())
}
