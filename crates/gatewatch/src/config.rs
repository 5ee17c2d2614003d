//! Flag-over-profile resolution.
//!
//! `gatewatch-config` owns the file format; this module layers the global
//! CLI flags on top and hands back ready `MonitorConfig`s.

use gatewatch_config::{Config, ConfigError, GatewayProfile, load_config, profile_to_monitor_config};
use gatewatch_core::MonitorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Profile name used when a gateway comes from `--url` alone.
const ADHOC_NAME: &str = "default";

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config(global.config.as_deref())?)
}

/// The single gateway selected by `--gateway` / `default_gateway`, with
/// flag overrides applied. `--url` works without any profile.
pub fn selected_monitor_config(global: &GlobalOpts, cfg: &Config) -> Result<MonitorConfig, CliError> {
    let (name, mut profile) = match cfg.select_gateway(global.gateway.as_deref()) {
        Ok((name, profile)) => (name, profile.clone()),
        Err(ConfigError::NoGateway) if global.url.is_some() => {
            (ADHOC_NAME.to_owned(), GatewayProfile::default())
        }
        Err(ConfigError::UnknownGateway { name }) if global.url.is_some() => {
            (name, GatewayProfile::default())
        }
        Err(ConfigError::UnknownGateway { name }) => {
            return Err(CliError::UnknownGateway {
                name,
                available: available_profiles(cfg),
            });
        }
        Err(e) => return Err(e.into()),
    };

    apply_flags(&mut profile, global);
    Ok(profile_to_monitor_config(&name, &profile, &cfg.defaults)?)
}

/// Every configured gateway, with transport flags applied. Falls back to
/// the selected gateway when no profiles exist.
pub fn all_monitor_configs(global: &GlobalOpts, cfg: &Config) -> Result<Vec<MonitorConfig>, CliError> {
    if cfg.gateways.is_empty() {
        return Ok(vec![selected_monitor_config(global, cfg)?]);
    }
    cfg.gateways
        .iter()
        .map(|(name, profile)| {
            let mut profile = profile.clone();
            apply_transport_flags(&mut profile, global);
            Ok(profile_to_monitor_config(name, &profile, &cfg.defaults)?)
        })
        .collect()
}

fn apply_flags(profile: &mut GatewayProfile, global: &GlobalOpts) {
    if let Some(ref url) = global.url {
        profile.url.clone_from(url);
    }
    if let Some(ref model) = global.model {
        profile.overrides.model = Some(model.clone());
    }
    apply_transport_flags(profile, global);
}

fn apply_transport_flags(profile: &mut GatewayProfile, global: &GlobalOpts) {
    if global.insecure {
        profile.overrides.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.overrides.timeout_ms = Some(timeout);
    }
}

fn available_profiles(cfg: &Config) -> String {
    if cfg.gateways.is_empty() {
        "(none)".into()
    } else {
        cfg.gateways.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
