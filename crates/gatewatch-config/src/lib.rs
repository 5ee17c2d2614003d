//! Configuration for gatewatch.
//!
//! TOML gateway profiles layered with environment overrides, credential
//! resolution (env + plaintext), validation, and translation to
//! `gatewatch_core::MonitorConfig`. The CLI adds flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gatewatch_api::{ModelSelection, TransportConfig};
use gatewatch_core::{BreakerConfig, DetectionConfig, MonitorConfig, PollerConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment prefix for every override (`GATEWATCH_DEFAULTS__TIMEOUT_MS`).
pub const ENV_PREFIX: &str = "GATEWATCH_";

/// Fallback password variable when a profile names none.
pub const PASSWORD_ENV: &str = "GATEWATCH_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("gateway '{name}' is not defined in the config file")]
    UnknownGateway { name: String },

    #[error("no gateway configured (pass --url or add a [gateways.<name>] profile)")]
    NoGateway,

    #[error("no password configured for gateway '{gateway}'")]
    NoCredentials { gateway: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--gateway` is not given.
    pub default_gateway: Option<String>,

    /// Tunables shared by every gateway.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub gateways: BTreeMap<String, GatewayProfile>,

    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub export: ExportSettings,
}

/// Effective tunables. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Defaults {
    pub model: String,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    pub insecure: bool,
    pub failure_threshold: u32,
    pub recovery_timeout_ms: u64,
    pub stale_threshold_ms: u64,
    pub detection_window_ms: u64,
    pub sinr_drop_threshold_5g: f64,
    pub sinr_drop_threshold_4g: f64,
    pub rsrp_drop_threshold_5g: f64,
    pub rsrp_drop_threshold_4g: f64,
    pub sinr_critical_5g: f64,
    pub sinr_critical_4g: f64,
    pub rsrp_critical_5g: f64,
    pub rsrp_critical_4g: f64,
    pub queue_capacity: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        let detection = DetectionConfig::default();
        let breaker = BreakerConfig::default();
        let poller = PollerConfig::default();
        Self {
            model: "auto".into(),
            // Exporter cadence; the library default is much faster.
            poll_interval_ms: 5000,
            timeout_ms: millis(poller.timeout),
            insecure: false,
            failure_threshold: breaker.failure_threshold,
            recovery_timeout_ms: millis(breaker.recovery_timeout),
            stale_threshold_ms: millis(poller.stale_threshold),
            detection_window_ms: millis(detection.window),
            sinr_drop_threshold_5g: detection.sinr_drop_5g,
            sinr_drop_threshold_4g: detection.sinr_drop_4g,
            rsrp_drop_threshold_5g: detection.rsrp_drop_5g,
            rsrp_drop_threshold_4g: detection.rsrp_drop_4g,
            sinr_critical_5g: detection.sinr_critical_5g,
            sinr_critical_4g: detection.sinr_critical_4g,
            rsrp_critical_5g: detection.rsrp_critical_5g,
            rsrp_critical_4g: detection.rsrp_critical_4g,
            queue_capacity: gatewatch_core::config::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Per-gateway overrides of [`Defaults`]. Unset fields inherit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Overrides {
    pub model: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub insecure: Option<bool>,
    pub failure_threshold: Option<u32>,
    pub recovery_timeout_ms: Option<u64>,
    pub stale_threshold_ms: Option<u64>,
    pub detection_window_ms: Option<u64>,
    pub sinr_drop_threshold_5g: Option<f64>,
    pub sinr_drop_threshold_4g: Option<f64>,
    pub rsrp_drop_threshold_5g: Option<f64>,
    pub rsrp_drop_threshold_4g: Option<f64>,
    pub sinr_critical_5g: Option<f64>,
    pub sinr_critical_4g: Option<f64>,
    pub rsrp_critical_5g: Option<f64>,
    pub rsrp_critical_4g: Option<f64>,
    pub queue_capacity: Option<usize>,
}

impl Defaults {
    /// Layer `overrides` on top of these defaults.
    pub fn apply(&self, o: &Overrides) -> Self {
        Self {
            model: o.model.clone().unwrap_or_else(|| self.model.clone()),
            poll_interval_ms: o.poll_interval_ms.unwrap_or(self.poll_interval_ms),
            timeout_ms: o.timeout_ms.unwrap_or(self.timeout_ms),
            insecure: o.insecure.unwrap_or(self.insecure),
            failure_threshold: o.failure_threshold.unwrap_or(self.failure_threshold),
            recovery_timeout_ms: o.recovery_timeout_ms.unwrap_or(self.recovery_timeout_ms),
            stale_threshold_ms: o.stale_threshold_ms.unwrap_or(self.stale_threshold_ms),
            detection_window_ms: o.detection_window_ms.unwrap_or(self.detection_window_ms),
            sinr_drop_threshold_5g: o.sinr_drop_threshold_5g.unwrap_or(self.sinr_drop_threshold_5g),
            sinr_drop_threshold_4g: o.sinr_drop_threshold_4g.unwrap_or(self.sinr_drop_threshold_4g),
            rsrp_drop_threshold_5g: o.rsrp_drop_threshold_5g.unwrap_or(self.rsrp_drop_threshold_5g),
            rsrp_drop_threshold_4g: o.rsrp_drop_threshold_4g.unwrap_or(self.rsrp_drop_threshold_4g),
            sinr_critical_5g: o.sinr_critical_5g.unwrap_or(self.sinr_critical_5g),
            sinr_critical_4g: o.sinr_critical_4g.unwrap_or(self.sinr_critical_4g),
            rsrp_critical_5g: o.rsrp_critical_5g.unwrap_or(self.rsrp_critical_5g),
            rsrp_critical_4g: o.rsrp_critical_4g.unwrap_or(self.rsrp_critical_4g),
            queue_capacity: o.queue_capacity.unwrap_or(self.queue_capacity),
        }
    }

    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> Result<ModelSelection, ConfigError> {
        let model = self
            .model
            .parse::<ModelSelection>()
            .map_err(|reason| invalid("model", reason))?;

        for (field, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("timeout_ms", self.timeout_ms),
            ("recovery_timeout_ms", self.recovery_timeout_ms),
            ("stale_threshold_ms", self.stale_threshold_ms),
            ("detection_window_ms", self.detection_window_ms),
        ] {
            if value == 0 {
                return Err(invalid(field, "must be greater than 0"));
            }
        }
        if self.failure_threshold == 0 {
            return Err(invalid("failure_threshold", "must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be at least 1"));
        }
        for (field, value) in [
            ("sinr_drop_threshold_5g", self.sinr_drop_threshold_5g),
            ("sinr_drop_threshold_4g", self.sinr_drop_threshold_4g),
            ("rsrp_drop_threshold_5g", self.rsrp_drop_threshold_5g),
            ("rsrp_drop_threshold_4g", self.rsrp_drop_threshold_4g),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("must be a non-negative number, got {value}")));
            }
        }
        for (field, value) in [
            ("sinr_critical_5g", self.sinr_critical_5g),
            ("sinr_critical_4g", self.sinr_critical_4g),
            ("rsrp_critical_5g", self.rsrp_critical_5g),
            ("rsrp_critical_4g", self.rsrp_critical_4g),
        ] {
            if !value.is_finite() {
                return Err(invalid(field, "must be a finite number"));
            }
        }
        Ok(model)
    }
}

/// A named gateway profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayProfile {
    /// Gateway base URL (e.g., "http://192.168.12.1").
    pub url: String,

    /// Username for firmware that guards its status page.
    pub username: Option<String>,

    /// Password (plaintext; prefer `password_env`).
    pub password: Option<String>,

    /// Environment variable holding the password.
    pub password_env: Option<String>,

    #[serde(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AlertSettings {
    /// POST critical disruption transitions to this URL.
    pub webhook_url: Option<String>,
    /// Log critical transitions (on by default).
    pub log: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Listen address for `gatewatch export`.
    pub listen: String,
    /// Samples and events kept in memory per exporter.
    pub history: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:9877".into(),
            history: 1024,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "gatewatch").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("gatewatch");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config: defaults, then the TOML file at `path` (or the
/// canonical path), then `GATEWATCH_` environment overrides.
///
/// A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

/// A commented-out-free starter file with one example gateway.
pub fn starter_config() -> Config {
    let mut gateways = BTreeMap::new();
    gateways.insert(
        "home".to_owned(),
        GatewayProfile {
            url: "http://192.168.12.1".into(),
            ..GatewayProfile::default()
        },
    );
    Config {
        default_gateway: Some("home".into()),
        gateways,
        ..Config::default()
    }
}

// ── Profile selection ───────────────────────────────────────────────

impl Config {
    /// Pick a profile: explicit name, then `default_gateway`, then the only
    /// profile if exactly one exists.
    pub fn select_gateway(&self, name: Option<&str>) -> Result<(String, &GatewayProfile), ConfigError> {
        let chosen = match name.or(self.default_gateway.as_deref()) {
            Some(n) => n.to_owned(),
            None => match self.gateways.keys().next() {
                Some(only) if self.gateways.len() == 1 => only.clone(),
                _ => return Err(ConfigError::NoGateway),
            },
        };
        self.gateways
            .get(&chosen)
            .map(|profile| (chosen.clone(), profile))
            .ok_or(ConfigError::UnknownGateway { name: chosen })
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the profile password: `password_env` → `GATEWATCH_PASSWORD` →
/// plaintext.
pub fn resolve_password(profile: &GatewayProfile) -> Option<SecretString> {
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(val));
    }
    profile.password.clone().map(SecretString::from)
}

// ── Translation to MonitorConfig ────────────────────────────────────

/// Parse and check a gateway URL.
pub fn parse_gateway_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| invalid("url", format!("'{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid("url", format!("unsupported scheme '{other}' (use http or https)"))),
    }
}

/// Build a validated `MonitorConfig` for profile `name`.
pub fn profile_to_monitor_config(
    name: &str,
    profile: &GatewayProfile,
    defaults: &Defaults,
) -> Result<MonitorConfig, ConfigError> {
    let url = parse_gateway_url(&profile.url)?;
    let settings = defaults.apply(&profile.overrides);
    let model = settings.validate()?;

    let mut transport = TransportConfig {
        accept_invalid_certs: settings.insecure,
        timeout: Duration::from_millis(settings.timeout_ms),
        credentials: None,
    };
    if let Some(username) = profile.username.clone() {
        let password = resolve_password(profile).ok_or_else(|| ConfigError::NoCredentials {
            gateway: name.into(),
        })?;
        transport = transport.with_credentials(username, password);
    }

    Ok(MonitorConfig {
        name: name.into(),
        url,
        model,
        transport,
        poller: PollerConfig {
            interval: Duration::from_millis(settings.poll_interval_ms),
            timeout: Duration::from_millis(settings.timeout_ms),
            stale_threshold: Duration::from_millis(settings.stale_threshold_ms),
        },
        breaker: BreakerConfig {
            failure_threshold: settings.failure_threshold,
            recovery_timeout: Duration::from_millis(settings.recovery_timeout_ms),
        },
        detection: DetectionConfig {
            window: Duration::from_millis(settings.detection_window_ms),
            sinr_drop_5g: settings.sinr_drop_threshold_5g,
            sinr_drop_4g: settings.sinr_drop_threshold_4g,
            rsrp_drop_5g: settings.rsrp_drop_threshold_5g,
            rsrp_drop_4g: settings.rsrp_drop_threshold_4g,
            sinr_critical_5g: settings.sinr_critical_5g,
            sinr_critical_4g: settings.sinr_critical_4g,
            rsrp_critical_5g: settings.rsrp_critical_5g,
            rsrp_critical_4g: settings.rsrp_critical_4g,
        },
        queue_capacity: settings.queue_capacity,
    })
}

