// ── Poller ──
//
// Owns one vendor client and its circuit breaker. Each call to `poll_once`
// is one tick: gate on the breaker, issue at most one bounded request,
// normalize, classify. A blocked or failed tick yields `NoData`; the
// previous reading is never handed out again. A client that cannot poll
// its model at all yields a terminal `NoData` and leaves the breaker alone.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::Utc;
use gatewatch_api::{Error, GatewayClient, GatewayStatus};
use serde::Serialize;
use tracing::{debug, warn};

use crate::breaker::CircuitBreaker;
use crate::config::{BreakerConfig, PollerConfig};
use crate::convert::sample_from_status;
use crate::model::{GatewayStats, SignalSample};
use crate::quality::{SignalQuality, classify};

/// A successful tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub status: GatewayStatus,
    pub sample: SignalSample,
    /// Quality of the active radio's SINR.
    pub quality: SignalQuality,
}

/// Why a tick produced no data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoDataReason {
    /// The breaker is open; no request was issued.
    CircuitOpen,
    /// The request exceeded the poller's deadline.
    Timeout { timeout_ms: u64 },
    RequestFailed { kind: String, error: String },
    /// The client has no protocol for this model. Terminal.
    Unsupported { model: String },
}

impl NoDataReason {
    /// Whether polling this client again can never succeed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

impl std::fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircuitOpen => f.write_str("circuit open"),
            Self::Timeout { timeout_ms } => write!(f, "timed out after {timeout_ms}ms"),
            Self::RequestFailed { error, .. } => f.write_str(error),
            Self::Unsupported { model } => write!(f, "gateway model '{model}' is not supported"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    Reading(Box<Reading>),
    NoData(NoDataReason),
}

impl PollOutcome {
    pub fn reading(&self) -> Option<&Reading> {
        match self {
            Self::Reading(r) => Some(r),
            Self::NoData(_) => None,
        }
    }

    pub fn sample(&self) -> Option<&SignalSample> {
        self.reading().map(|r| &r.sample)
    }
}

pub struct Poller<C> {
    client: C,
    config: PollerConfig,
    breaker: CircuitBreaker,
    stats: GatewayStats,
    published: Arc<ArcSwap<GatewayStats>>,
}

impl<C: GatewayClient> Poller<C> {
    pub fn new(client: C, config: PollerConfig, breaker: BreakerConfig) -> Self {
        let stats = GatewayStats::default();
        let published = Arc::new(ArcSwap::from_pointee(stats.clone()));
        Self {
            client,
            config,
            breaker: CircuitBreaker::new(breaker),
            stats,
            published,
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Shared handle to the latest published stats snapshot.
    pub fn stats_handle(&self) -> Arc<ArcSwap<GatewayStats>> {
        Arc::clone(&self.published)
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    pub fn set_running(&mut self, running: bool) {
        self.stats.is_running = running;
        self.publish();
    }

    /// Run one tick.
    ///
    /// Cancel-safe: all bookkeeping happens after the request resolves, so
    /// dropping this future mid-request leaves no partial state behind.
    pub async fn poll_once(&mut self) -> PollOutcome {
        if !self.breaker.can_execute() {
            debug!("circuit open, skipping request");
            self.stats.circuit_state = self.breaker.state();
            self.publish();
            return PollOutcome::NoData(NoDataReason::CircuitOpen);
        }

        let result = tokio::time::timeout(self.config.timeout, self.client.get_status()).await;
        let now = Utc::now();
        self.stats.last_attempt = Some(now);

        let outcome = match result {
            Ok(Ok(status)) => {
                self.breaker.record_success();
                self.stats.last_success = Some(now);
                self.stats.success_count += 1;

                let sample = sample_from_status(&status, now);
                let quality = classify(status.signal.sinr);
                debug!(sinr = ?status.signal.sinr, %quality, "poll succeeded");
                PollOutcome::Reading(Box::new(Reading {
                    status,
                    sample,
                    quality,
                }))
            }
            Ok(Err(Error::Unsupported { model })) => {
                let reason = NoDataReason::Unsupported { model };
                warn!(%reason, "gateway client cannot poll this model");
                self.stats.error_count += 1;
                self.stats.last_error = Some(reason.to_string());
                PollOutcome::NoData(reason)
            }
            Ok(Err(e)) => {
                let reason = NoDataReason::RequestFailed {
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                };
                self.record_failure(&reason);
                PollOutcome::NoData(reason)
            }
            Err(_elapsed) => {
                let reason = NoDataReason::Timeout {
                    timeout_ms: duration_ms(self.config.timeout),
                };
                self.record_failure(&reason);
                PollOutcome::NoData(reason)
            }
        };

        self.stats.consecutive_failures = self.breaker.consecutive_failures();
        self.stats.circuit_state = self.breaker.state();
        self.publish();
        outcome
    }

    fn record_failure(&mut self, reason: &NoDataReason) {
        debug!(%reason, "poll failed");
        self.breaker.record_failure();
        self.stats.error_count += 1;
        self.stats.last_error = Some(reason.to_string());
    }

    fn publish(&self) {
        self.published.store(Arc::new(self.stats.clone()));
    }
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
