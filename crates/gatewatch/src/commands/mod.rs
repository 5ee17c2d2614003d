//! Command dispatch: bridges CLI args -> monitors -> output formatting.

pub mod config_cmd;
pub mod detect;
pub mod export;
pub mod status;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use gatewatch_config::Config;
use gatewatch_core::{AlertSink, LogAlertSink, WebhookAlertSink};
use url::Url;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to its handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Detect => detect::handle(cfg, global).await,
        Command::Status => status::handle(cfg, global).await,
        Command::Watch(args) => watch::handle(&args, cfg, global).await,
        Command::Export(args) => export::handle(&args, cfg, global).await,
        // Config and Completions are handled before a config is loaded
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Alert collaborators from the `[alerts]` table. Logging is on unless
/// disabled; the webhook only when a URL is set.
pub fn alert_sinks(cfg: &Config) -> Result<Vec<Arc<dyn AlertSink>>, CliError> {
    let mut sinks: Vec<Arc<dyn AlertSink>> = Vec::new();
    if cfg.alerts.log.unwrap_or(true) {
        sinks.push(Arc::new(LogAlertSink));
    }
    if let Some(ref raw) = cfg.alerts.webhook_url {
        let url = Url::parse(raw).map_err(|e| CliError::Validation {
            field: "alerts.webhook_url".into(),
            reason: format!("'{raw}': {e}"),
        })?;
        let timeout = Duration::from_millis(cfg.defaults.timeout_ms);
        sinks.push(Arc::new(WebhookAlertSink::new(url, timeout)?));
    }
    Ok(sinks)
}
