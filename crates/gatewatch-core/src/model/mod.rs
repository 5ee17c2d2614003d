// ── Telemetry domain model ──
//
// Canonical types produced by the poll loop and consumed by every
// downstream collaborator. Measurements are `Option` end to end: `None`
// means "not measured" and is never folded into zero.

pub mod event;
pub mod sample;
pub mod stats;

// ── Re-exports ──────────────────────────────────────────────────────

pub use event::{DisruptionEvent, EventTransition, EventType, EventUpdate, Severity};
pub use sample::{ConnectionMode, SignalMetrics, SignalSample};
pub use stats::{CircuitState, GatewayStats, Staleness};
