// ── Poller statistics ──

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitState {
    #[default]
    Closed,
    Open,
    HalfOpen,
}

/// Counters and timestamps for one monitored gateway.
///
/// Written only by the poller; everyone else reads published snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStats {
    pub last_success: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub success_count: u64,
    pub error_count: u64,
    pub consecutive_failures: u32,
    pub last_error: Option<String>,
    pub circuit_state: CircuitState,
    pub is_running: bool,
}

impl GatewayStats {
    pub fn staleness(&self, now: DateTime<Utc>, threshold: Duration) -> Staleness {
        Staleness::compute(self.last_success, now, threshold)
    }
}

/// Elapsed time since the last successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staleness {
    /// `f64::INFINITY` if no poll has ever succeeded.
    pub seconds_since_success: f64,
    pub is_stale: bool,
}

impl Staleness {
    pub fn compute(
        last_success: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        threshold: Duration,
    ) -> Self {
        let seconds_since_success = match last_success {
            Some(at) => {
                let millis = (now - at).num_milliseconds().max(0);
                #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
                let secs = millis as f64 / 1000.0;
                secs
            }
            None => f64::INFINITY,
        };
        Self {
            seconds_since_success,
            is_stale: seconds_since_success > threshold.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn never_succeeded_is_infinitely_stale() {
        let s = Staleness::compute(None, Utc::now(), Duration::from_secs(30));
        assert!(s.seconds_since_success.is_infinite());
        assert!(s.is_stale);
    }

    #[test]
    fn staleness_uses_strict_threshold() {
        let now = Utc::now();
        let threshold = Duration::from_secs(30);

        let fresh = Staleness::compute(Some(now - TimeDelta::seconds(30)), now, threshold);
        assert!((fresh.seconds_since_success - 30.0).abs() < f64::EPSILON);
        assert!(!fresh.is_stale);

        let stale = Staleness::compute(Some(now - TimeDelta::milliseconds(30_001)), now, threshold);
        assert!(stale.is_stale);
    }
}
