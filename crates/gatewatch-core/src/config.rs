// ── Runtime monitor configuration ──
//
// These types describe *how* to watch one gateway. They carry connection
// and tuning data but never touch disk: the config crate (or a test) builds
// a `MonitorConfig` and hands it to `Monitor::start`.

use std::time::Duration;

use gatewatch_api::{ModelSelection, TransportConfig};
use url::Url;

/// Fallback queue depth for each downstream collaborator.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Poll loop cadence and staleness tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Fixed tick period.
    pub interval: Duration,
    /// Hard deadline for one status request. A timeout is a breaker failure.
    pub timeout: Duration,
    /// Age of the last success after which data is reported stale.
    pub stale_threshold: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(200),
            timeout: Duration::from_secs(5),
            stale_threshold: Duration::from_secs(30),
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    /// Consecutive failures that open the circuit.
    pub failure_threshold: u32,
    /// Time the circuit stays open before a half-open probe is allowed.
    pub recovery_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
        }
    }
}

/// Disruption detector thresholds. Drops are in dB, critical levels in
/// dB (SINR) and dBm (RSRP).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub window: Duration,
    pub sinr_drop_5g: f64,
    pub sinr_drop_4g: f64,
    pub rsrp_drop_5g: f64,
    pub rsrp_drop_4g: f64,
    pub sinr_critical_5g: f64,
    pub sinr_critical_4g: f64,
    pub rsrp_critical_5g: f64,
    pub rsrp_critical_4g: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30),
            sinr_drop_5g: 10.0,
            sinr_drop_4g: 8.0,
            rsrp_drop_5g: 10.0,
            rsrp_drop_4g: 10.0,
            sinr_critical_5g: -5.0,
            sinr_critical_4g: -5.0,
            rsrp_critical_5g: -115.0,
            rsrp_critical_4g: -120.0,
        }
    }
}

/// Everything needed to monitor a single gateway.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Profile name, used as the metrics label and in logs.
    pub name: String,
    pub url: Url,
    pub model: ModelSelection,
    pub transport: TransportConfig,
    pub poller: PollerConfig,
    pub breaker: BreakerConfig,
    pub detection: DetectionConfig,
    /// Bounded queue depth for each collaborator consumer.
    pub queue_capacity: usize,
}

impl MonitorConfig {
    /// Library defaults for the gateway at `url`.
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            model: ModelSelection::Auto,
            transport: TransportConfig::default(),
            poller: PollerConfig::default(),
            breaker: BreakerConfig::default(),
            detection: DetectionConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}
