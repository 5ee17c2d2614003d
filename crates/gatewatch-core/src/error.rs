// ── Core error types ──
//
// Errors surfaced by gatewatch-core. Consumers never match on reqwest or
// serde failures directly: the `From<gatewatch_api::Error>` impl folds the
// transport taxonomy into domain variants.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Gateway errors ───────────────────────────────────────────────
    #[error("Cannot reach gateway at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Gateway request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Gateway returned an unusable response: {message}")]
    BadResponse { message: String },

    #[error("Gateway model '{model}' is not supported")]
    Unsupported { model: String },

    #[error("Could not detect gateway model: {reason}")]
    DetectionFailed { reason: String },

    // ── Collaborator errors ──────────────────────────────────────────
    #[error("Sink '{sink}' failed: {message}")]
    Sink { sink: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Failures the circuit breaker retries on its own schedule.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Timeout { .. } | Self::BadResponse { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<gatewatch_api::Error> for CoreError {
    fn from(err: gatewatch_api::Error) -> Self {
        use gatewatch_api::Error as Api;
        match err {
            Api::Unreachable { url, reason } => Self::Unreachable { url, reason },
            Api::Timeout { timeout_ms } => Self::Timeout { timeout_ms },
            Api::BadResponse { message, body: _ } => Self::BadResponse { message },
            Api::Unsupported { model } => Self::Unsupported { model },
            Api::DetectionFailed { last } => Self::DetectionFailed {
                reason: last.to_string(),
            },
            Api::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => Self::Config {
                message: format!("TLS error: {msg}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_their_class() {
        let err: CoreError = gatewatch_api::Error::Timeout { timeout_ms: 2000 }.into();
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Gateway request timed out after 2000ms");

        let err: CoreError = gatewatch_api::Error::DetectionFailed {
            last: Box::new(gatewatch_api::Error::Unsupported {
                model: "sagemcom".into(),
            }),
        }
        .into();
        assert!(!err.is_transient());
        assert!(err.to_string().contains("sagemcom"));
    }
}
