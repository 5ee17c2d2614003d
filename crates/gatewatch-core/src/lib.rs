//! Telemetry pipeline between `gatewatch-api` and the CLI / exporter.
//!
//! - **[`Monitor`]**: lifecycle facade. [`Monitor::start`] detects the
//!   gateway model, then spawns the poll task and one consumer task per
//!   collaborator. Snapshots ([`Monitor::stats`], [`Monitor::latest`],
//!   [`Monitor::staleness`]) are lock-free reads.
//!
//! - **[`Poller`]**: one tick at a time, gated by a [`CircuitBreaker`].
//!   A blocked or failed tick yields [`PollOutcome::NoData`], never a
//!   copy of the previous reading.
//!
//! - **[`DisruptionDetector`]**: windowed comparator that coalesces
//!   degraded samples into [`DisruptionEvent`]s.
//!
//! - **[`classify`]**: SINR to [`SignalQuality`] bucket.
//!
//! - **Sinks** ([`sink`]): `Repository`, `MetricsSink`, and `AlertSink`
//!   collaborators, each fed through its own bounded [`FanOut`] queue.

pub mod breaker;
pub mod config;
pub mod convert;
pub mod detector;
pub mod error;
pub mod fanout;
pub mod model;
pub mod monitor;
pub mod poller;
pub mod quality;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use breaker::CircuitBreaker;
pub use config::{BreakerConfig, DetectionConfig, MonitorConfig, PollerConfig};
pub use convert::sample_from_status;
pub use detector::DisruptionDetector;
pub use error::CoreError;
pub use fanout::{FanOut, Subscriber};
pub use model::{
    CircuitState, ConnectionMode, DisruptionEvent, EventTransition, EventType, EventUpdate,
    GatewayStats, Severity, SignalMetrics, SignalSample, Staleness,
};
pub use monitor::{Monitor, TickResult};
pub use poller::{NoDataReason, PollOutcome, Poller, Reading};
pub use quality::{SignalQuality, classify};
pub use sink::{
    AlertSink, LogAlertSink, MemoryRepository, MetricsSink, Repository, Sinks, WebhookAlertSink,
};
