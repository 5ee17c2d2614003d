// ── Circuit breaker ──
//
// closed ──(failures ≥ threshold)──▶ open ──(recovery elapsed)──▶ half_open
//   ▲                                  ▲                              │
//   └───────────── success ────────────┼──────────────────────────────┤
//                                      └────────── failure ───────────┘
//
// Time is passed in explicitly so the poller can drive it from the tokio
// clock (and tests can pause that clock).

use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::BreakerConfig;
use crate::model::CircuitState;

#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    /// Set while the single half-open probe is outstanding.
    probe_pending: bool,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            probe_pending: false,
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Whether a request may be issued at `now`. An open circuit whose
    /// recovery timeout has elapsed moves to half-open and admits exactly
    /// one probe until its outcome is recorded.
    pub fn can_execute_at(&mut self, now: Instant) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                let admit = !self.probe_pending;
                self.probe_pending = true;
                admit
            }
            CircuitState::Open => {
                let recovered = self
                    .last_failure
                    .is_none_or(|at| now.saturating_duration_since(at) > self.config.recovery_timeout);
                if recovered {
                    info!("circuit half-open, probing gateway");
                    self.state = CircuitState::HalfOpen;
                    self.probe_pending = true;
                }
                recovered
            }
        }
    }

    pub fn can_execute(&mut self) -> bool {
        self.can_execute_at(Instant::now())
    }

    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            info!(from = %self.state, "circuit closed");
        }
        self.consecutive_failures = 0;
        self.state = CircuitState::Closed;
        self.probe_pending = false;
    }

    /// Record a failed or timed-out request at `now`.
    pub fn record_failure_at(&mut self, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let reopen = self.state == CircuitState::HalfOpen
            || self.consecutive_failures >= self.config.failure_threshold;
        if reopen {
            if self.state != CircuitState::Open {
                warn!(
                    failures = self.consecutive_failures,
                    recovery_ms = u64::try_from(self.config.recovery_timeout.as_millis()).unwrap_or(u64::MAX),
                    "circuit opened"
                );
            }
            self.state = CircuitState::Open;
            self.last_failure = Some(now);
            self.probe_pending = false;
        }
    }

    pub fn record_failure(&mut self) {
        self.record_failure_at(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(BreakerConfig {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
        })
    }

    #[test]
    fn opens_after_threshold() {
        let mut b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        b.record_failure_at(t0);
        assert_eq!(b.state(), CircuitState::Closed);
        assert!(b.can_execute_at(t0));

        b.record_failure_at(t0);
        assert_eq!(b.state(), CircuitState::Open);
        assert!(!b.can_execute_at(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn half_open_after_recovery_then_closes() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure_at(t0);
        }

        let later = t0 + Duration::from_millis(30_001);
        assert!(b.can_execute_at(later));
        assert_eq!(b.state(), CircuitState::HalfOpen);
        // Only one probe while its outcome is pending.
        assert!(!b.can_execute_at(later));

        b.record_success();
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.consecutive_failures(), 0);
    }

    #[test]
    fn failed_probe_reopens_immediately() {
        let mut b = breaker();
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure_at(t0);
        }
        let probe_at = t0 + Duration::from_secs(31);
        assert!(b.can_execute_at(probe_at));
        b.record_failure_at(probe_at);

        assert_eq!(b.state(), CircuitState::Open);
        // Recovery restarts from the failed probe.
        assert!(!b.can_execute_at(probe_at + Duration::from_secs(30)));
        assert!(b.can_execute_at(probe_at + Duration::from_secs(31)));
    }

    #[test]
    fn success_resets_failure_streak() {
        let mut b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        b.record_failure_at(t0);
        b.record_success();
        b.record_failure_at(t0);
        assert_eq!(b.state(), CircuitState::Closed);
        assert_eq!(b.consecutive_failures(), 1);
    }
}
