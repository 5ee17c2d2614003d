// ── Disruption event domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample::SignalSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EventType {
    #[serde(rename = "5g-degradation")]
    #[strum(serialize = "5g-degradation")]
    NrDegradation,
    #[serde(rename = "4g-degradation")]
    #[strum(serialize = "4g-degradation")]
    LteDegradation,
    TowerHandoff,
    RegistrationLoss,
}

impl EventType {
    /// Handoffs are instantaneous; every other type is a sustained episode.
    pub fn is_point_in_time(self) -> bool {
        matches!(self, Self::TowerHandoff)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// A coalesced episode of degraded or interrupted signal.
///
/// `end_time`, `duration_seconds`, and `resolved` move together: an open
/// event has none of them, a resolved one has all three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisruptionEvent {
    /// Monotonic per-detector identifier.
    pub id: u64,
    pub event_type: EventType,
    pub severity: Severity,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    /// Degraded samples folded into this event. Always at least 1.
    pub error_count: u32,
    /// Description of the most recent trigger.
    pub last_error: Option<String>,
    pub resolved: bool,
    /// Last known-good sample before the episode, if one was seen.
    pub before_state: Option<SignalSample>,
    pub after_state: SignalSample,
}

impl DisruptionEvent {
    pub(crate) fn resolve_at(&mut self, end: DateTime<Utc>) {
        let millis = (end - self.start_time).num_milliseconds().max(0);
        #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
        let seconds = millis as f64 / 1000.0;
        self.end_time = Some(end);
        self.duration_seconds = Some(seconds);
        self.resolved = true;
    }
}

/// What happened to an event on a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventTransition {
    Started,
    Extended,
    Resolved,
    /// Created and resolved in the same step.
    PointInTime,
}

/// An event snapshot paired with the transition that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub transition: EventTransition,
    pub event: DisruptionEvent,
}

impl EventUpdate {
    /// Newly created or newly resolved critical events are worth an alert.
    pub fn is_alertable(&self) -> bool {
        self.event.severity == Severity::Critical
            && matches!(
                self.transition,
                EventTransition::Started | EventTransition::Resolved | EventTransition::PointInTime
            )
    }
}
