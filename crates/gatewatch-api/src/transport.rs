// Shared transport configuration for building reqwest::Client instances.
//
// All vendor clients share TLS, timeout, and credential settings through
// this module, avoiding duplicated builder logic.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

/// Optional HTTP basic credentials for firmware that guards its status page.
#[derive(Debug, Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub password: SecretString,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Accept any certificate (gateways ship self-signed certs).
    pub accept_invalid_certs: bool,
    /// Hard per-request deadline, enforced by reqwest.
    pub timeout: Duration,
    pub credentials: Option<BasicCredentials>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            timeout: Duration::from_secs(5),
            credentials: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(concat!("gatewatch/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| crate::error::Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Timeout in whole milliseconds, for error reporting.
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Attach basic credentials to a request, if configured.
    pub(crate) fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(creds) => {
                builder.basic_auth(&creds.username, Some(creds.password.expose_secret()))
            }
            None => builder,
        }
    }

    pub fn with_credentials(mut self, username: String, password: SecretString) -> Self {
        self.credentials = Some(BasicCredentials { username, password });
        self
    }
}
