use thiserror::Error;

/// Top-level error type for the `gatewatch-api` crate.
///
/// Covers every failure mode a gateway status request can hit:
/// transport, payload decoding, unimplemented vendor protocols, and
/// startup model detection. `gatewatch-core` maps these into
/// domain-level errors and breaker bookkeeping.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// Gateway could not be reached (connection refused, DNS, reset, etc.)
    #[error("Gateway unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// Request exceeded its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// The gateway answered, but the payload was not usable.
    #[error("Bad response from gateway: {message}")]
    BadResponse { message: String, body: Option<String> },

    // ── Vendor ──────────────────────────────────────────────────────
    /// The vendor client has no protocol implementation.
    #[error("Gateway model '{model}' is not supported")]
    Unsupported { model: String },

    /// No vendor client answered the detection probe.
    #[error("Gateway model detection failed: {last}")]
    DetectionFailed { last: Box<Error> },
}

/// Coarse classification used by the poller and CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Unreachable,
    BadResponse,
    Unsupported,
    DetectionFailed,
    Config,
}

impl Error {
    /// Map a `reqwest` failure for `url` into the crate taxonomy.
    pub(crate) fn from_transport(url: &url::Url, err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if err.is_decode() {
            Self::BadResponse {
                message: format!("failed to read body from {url}: {err}"),
                body: None,
            }
        } else {
            Self::Unreachable {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    pub(crate) fn bad_body(message: impl Into<String>, body: &str) -> Self {
        Self::BadResponse {
            message: message.into(),
            body: Some(body.chars().take(512).collect()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unreachable { .. } | Self::Timeout { .. } => ErrorKind::Unreachable,
            Self::BadResponse { .. } => ErrorKind::BadResponse,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::DetectionFailed { .. } => ErrorKind::DetectionFailed,
            Self::InvalidUrl(_) | Self::Tls(_) => ErrorKind::Config,
        }
    }

    /// Returns `true` for failures the circuit breaker retries on its own
    /// schedule (network trouble, timeouts, unparsable payloads).
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unreachable | ErrorKind::BadResponse
        )
    }

    /// Returns `true` if this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
