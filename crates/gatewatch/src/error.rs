//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use gatewatch_config::ConfigError;
use gatewatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const DETECTION: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Gateway ──────────────────────────────────────────────────────
    #[error("Could not reach gateway at {url}")]
    #[diagnostic(
        code(gatewatch::unreachable),
        help(
            "Check that the gateway is powered on and reachable from this host.\n\
             Cause: {reason}\n\
             Try: gatewatch status --url http://192.168.12.1"
        )
    )]
    Unreachable { url: String, reason: String },

    #[error("Gateway request timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(gatewatch::timeout),
        help("Increase the deadline with --timeout or check the gateway's load.")
    )]
    Timeout { timeout_ms: u64 },

    #[error("Gateway returned an unusable response: {message}")]
    #[diagnostic(
        code(gatewatch::bad_response),
        help("The firmware may use a different status schema. Re-run with -vvv to see the payload.")
    )]
    BadResponse { message: String },

    #[error("Gateway model '{model}' is not supported")]
    #[diagnostic(
        code(gatewatch::unsupported),
        help("Supported models: arcadyan, nokia. Use --model auto to probe.")
    )]
    Unsupported { model: String },

    #[error("Could not detect the gateway model")]
    #[diagnostic(
        code(gatewatch::detection_failed),
        help(
            "No supported status endpoint answered. Last error: {reason}\n\
             Pin the model with --model if you know it."
        )
    )]
    DetectionFailed { reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(gatewatch::validation))]
    Validation { field: String, reason: String },

    #[error("Gateway profile '{name}' not found")]
    #[diagnostic(
        code(gatewatch::unknown_gateway),
        help("Available profiles: {available}")
    )]
    UnknownGateway { name: String, available: String },

    #[error("No gateway configured")]
    #[diagnostic(
        code(gatewatch::no_gateway),
        help(
            "Pass --url, or create a config with: gatewatch config init\n\
             Expected at: {path}"
        )
    )]
    NoGateway { path: String },

    #[error("No password configured for gateway '{gateway}'")]
    #[diagnostic(
        code(gatewatch::no_credentials),
        help("Set password_env in the profile, or export GATEWATCH_PASSWORD.")
    )]
    NoCredentials { gateway: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(code(gatewatch::config_exists), help("Use --force to overwrite it."))]
    ConfigExists { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(gatewatch::config))]
    Config { message: String },

    // ── Runtime ──────────────────────────────────────────────────────
    #[error("Sink '{sink}' failed: {message}")]
    #[diagnostic(code(gatewatch::sink))]
    Sink { sink: String, message: String },

    #[error("Could not serve on {addr}: {reason}")]
    #[diagnostic(
        code(gatewatch::listen),
        help("Pick another address with --listen.")
    )]
    Listen { addr: String, reason: String },

    #[error("Metrics registry error: {0}")]
    #[diagnostic(code(gatewatch::metrics))]
    Metrics(#[from] prometheus::Error),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(gatewatch::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(gatewatch::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(gatewatch::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Unreachable { .. } | Self::Listen { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Unsupported { .. } => exit_code::UNSUPPORTED,
            Self::DetectionFailed { .. } => exit_code::DETECTION,
            Self::Validation { .. } | Self::ConfigExists { .. } => exit_code::USAGE,
            Self::UnknownGateway { .. }
            | Self::NoGateway { .. }
            | Self::NoCredentials { .. }
            | Self::Config { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unreachable { url, reason } => Self::Unreachable { url, reason },
            CoreError::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            CoreError::BadResponse { message } => Self::BadResponse { message },
            CoreError::Unsupported { model } => Self::Unsupported { model },
            CoreError::DetectionFailed { reason } => Self::DetectionFailed { reason },
            CoreError::Sink { sink, message } => Self::Sink { sink, message },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

impl From<gatewatch_api::Error> for CliError {
    fn from(err: gatewatch_api::Error) -> Self {
        CoreError::from(err).into()
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownGateway { name } => Self::UnknownGateway {
                name,
                available: String::from("(see gatewatch config show)"),
            },
            ConfigError::NoGateway => Self::NoGateway {
                path: gatewatch_config::config_path().display().to_string(),
            },
            ConfigError::NoCredentials { gateway } => Self::NoCredentials { gateway },
            ConfigError::Io(e) => Self::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let err: CliError = CoreError::Timeout { timeout_ms: 10 }.into();
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err: CliError = gatewatch_api::Error::Unreachable {
            url: "http://gw".into(),
            reason: "refused".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::CONNECTION);

        let err: CliError = ConfigError::NoGateway.into();
        assert_eq!(err.exit_code(), exit_code::CONFIG);

        let err: CliError = CoreError::DetectionFailed {
            reason: "nothing answered".into(),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::DETECTION);
    }
}
