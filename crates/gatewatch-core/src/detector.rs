// ── Disruption detector ──
//
// Turns the sample stream into coalesced events. Drops are measured against
// the oldest sample still inside the detection window, so a slide that
// happens over several ticks is caught just like a cliff. Sustained types
// hold at most one open event each; tower handoffs are point-in-time and
// compare against the previous sample however long ago it arrived. Open
// events resolve only on a sample that meets no trigger at all.

use std::collections::{HashMap, VecDeque};

use chrono::TimeDelta;
use tracing::{info, warn};

use crate::config::DetectionConfig;
use crate::model::{
    ConnectionMode, DisruptionEvent, EventTransition, EventType, EventUpdate, Severity,
    SignalMetrics, SignalSample,
};

/// Registration states that mean the gateway lost the network.
const FAILED_REGISTRATION: &[&str] = &[
    "denied",
    "registration denied",
    "not registered",
    "unregistered",
    "deregistered",
    "searching",
    "not registered searching",
    "limited service",
    "no service",
    "emergency",
];

fn is_failed_registration(status: &str) -> bool {
    let normalized: String = status
        .trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    FAILED_REGISTRATION.contains(&normalized.as_str())
}

/// A single degradation trigger found on the current sample.
#[derive(Debug)]
struct Trigger {
    severity: Severity,
    reason: String,
}

/// Per-radio thresholds, picked from `DetectionConfig`.
struct RadioThresholds {
    label: &'static str,
    sinr_drop: f64,
    rsrp_drop: f64,
    sinr_critical: f64,
    rsrp_critical: f64,
}

#[derive(Debug)]
pub struct DisruptionDetector {
    config: DetectionConfig,
    window: VecDeque<SignalSample>,
    previous: Option<SignalSample>,
    last_good: Option<SignalSample>,
    open: HashMap<EventType, DisruptionEvent>,
    next_id: u64,
}

impl DisruptionDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            window: VecDeque::new(),
            previous: None,
            last_good: None,
            open: HashMap::new(),
            next_id: 1,
        }
    }

    /// Currently unresolved events.
    pub fn open_events(&self) -> impl Iterator<Item = &DisruptionEvent> {
        self.open.values()
    }

    /// Feed one sample; returns every event transition it caused.
    pub fn observe(&mut self, sample: &SignalSample) -> Vec<EventUpdate> {
        let mut updates: Vec<EventUpdate> = self.check_handoff(sample).into_iter().collect();
        self.evict(sample);

        let nr = self.nr_thresholds();
        let lte = self.lte_thresholds();
        let sustained = [
            (
                EventType::NrDegradation,
                self.radio_trigger(&nr, sample, |s| &s.nr),
            ),
            (
                EventType::LteDegradation,
                self.radio_trigger(&lte, sample, |s| &s.lte),
            ),
            (EventType::RegistrationLoss, registration_trigger(sample)),
        ];

        let degraded = sustained.iter().any(|(_, trigger)| trigger.is_some());
        let quiet = !degraded && updates.is_empty();
        for (event_type, trigger) in sustained {
            if let Some(trigger) = trigger {
                updates.push(self.open_or_extend(event_type, trigger, sample));
            } else if quiet {
                if let Some(update) = self.resolve(event_type, sample) {
                    updates.push(update);
                }
            }
        }

        if !degraded {
            self.last_good = Some(sample.clone());
        }
        self.window.push_back(sample.clone());
        self.previous = Some(sample.clone());
        updates
    }

    /// Drop samples older than the detection window, measured from `sample`.
    fn evict(&mut self, sample: &SignalSample) {
        let window = TimeDelta::from_std(self.config.window).unwrap_or(TimeDelta::MAX);
        let cutoff = sample.timestamp.checked_sub_signed(window);
        while let Some(front) = self.window.front() {
            if cutoff.is_some_and(|cutoff| front.timestamp < cutoff) {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn nr_thresholds(&self) -> RadioThresholds {
        RadioThresholds {
            label: "5G",
            sinr_drop: self.config.sinr_drop_5g,
            rsrp_drop: self.config.rsrp_drop_5g,
            sinr_critical: self.config.sinr_critical_5g,
            rsrp_critical: self.config.rsrp_critical_5g,
        }
    }

    fn lte_thresholds(&self) -> RadioThresholds {
        RadioThresholds {
            label: "4G",
            sinr_drop: self.config.sinr_drop_4g,
            rsrp_drop: self.config.rsrp_drop_4g,
            sinr_critical: self.config.sinr_critical_4g,
            rsrp_critical: self.config.rsrp_critical_4g,
        }
    }

    /// Degradation on one radio: a windowed drop or an absolute crossing.
    /// Critical crossings take precedence over drops.
    fn radio_trigger(
        &self,
        thresholds: &RadioThresholds,
        sample: &SignalSample,
        radio: fn(&SignalSample) -> &SignalMetrics,
    ) -> Option<Trigger> {
        let current = radio(sample);
        let label = thresholds.label;

        if let Some(sinr) = current.sinr {
            if sinr < thresholds.sinr_critical {
                return Some(Trigger {
                    severity: Severity::Critical,
                    reason: format!("{label} SINR {sinr:.1} dB below {:.1} dB", thresholds.sinr_critical),
                });
            }
        }
        if let Some(rsrp) = current.rsrp {
            if rsrp < thresholds.rsrp_critical {
                return Some(Trigger {
                    severity: Severity::Critical,
                    reason: format!("{label} RSRP {rsrp:.1} dBm below {:.1} dBm", thresholds.rsrp_critical),
                });
            }
        }

        let oldest_sinr = self.oldest_in_window(|s| radio(s).sinr);
        if let (Some(before), Some(now)) = (oldest_sinr, current.sinr) {
            if before - now >= thresholds.sinr_drop {
                return Some(Trigger {
                    severity: Severity::Warning,
                    reason: format!("{label} SINR dropped {:.1} dB ({before:.1} → {now:.1})", before - now),
                });
            }
        }
        let oldest_rsrp = self.oldest_in_window(|s| radio(s).rsrp);
        if let (Some(before), Some(now)) = (oldest_rsrp, current.rsrp) {
            if before - now >= thresholds.rsrp_drop {
                return Some(Trigger {
                    severity: Severity::Warning,
                    reason: format!("{label} RSRP dropped {:.1} dB ({before:.1} → {now:.1})", before - now),
                });
            }
        }
        None
    }

    /// The metric from the oldest in-window sample that measured it.
    fn oldest_in_window(&self, metric: impl Fn(&SignalSample) -> Option<f64>) -> Option<f64> {
        self.window.iter().find_map(metric)
    }

    fn check_handoff(&mut self, sample: &SignalSample) -> Option<EventUpdate> {
        let previous = self.previous.as_ref()?;
        let changes: Vec<String> = [
            ("gNB", previous.nr.tower_id, sample.nr.tower_id),
            ("5G cell", previous.nr.cell_id, sample.nr.cell_id),
            ("eNB", previous.lte.tower_id, sample.lte.tower_id),
            ("4G cell", previous.lte.cell_id, sample.lte.cell_id),
        ]
        .into_iter()
        .filter_map(|(what, before, after)| match (before, after) {
            (Some(b), Some(a)) if b != a => Some(format!("{what} {b} → {a}")),
            _ => None,
        })
        .collect();

        if changes.is_empty() {
            return None;
        }

        let reason = changes.join(", ");
        let before_state = Some(previous.clone());
        info!(%reason, "tower handoff");
        let mut event = DisruptionEvent {
            id: self.take_id(),
            event_type: EventType::TowerHandoff,
            severity: Severity::Warning,
            start_time: sample.timestamp,
            end_time: None,
            duration_seconds: None,
            error_count: 1,
            last_error: Some(reason),
            resolved: false,
            before_state,
            after_state: sample.clone(),
        };
        event.resolve_at(sample.timestamp);
        Some(EventUpdate {
            transition: EventTransition::PointInTime,
            event,
        })
    }

    fn open_or_extend(
        &mut self,
        event_type: EventType,
        trigger: Trigger,
        sample: &SignalSample,
    ) -> EventUpdate {
        if let Some(event) = self.open.get_mut(&event_type) {
            event.error_count = event.error_count.saturating_add(1);
            event.after_state = sample.clone();
            event.last_error = Some(trigger.reason);
            event.severity = event.severity.max(trigger.severity);
            return EventUpdate {
                transition: EventTransition::Extended,
                event: event.clone(),
            };
        }

        warn!(%event_type, severity = %trigger.severity, reason = %trigger.reason, "disruption started");
        let event = DisruptionEvent {
            id: self.take_id(),
            event_type,
            severity: trigger.severity,
            start_time: sample.timestamp,
            end_time: None,
            duration_seconds: None,
            error_count: 1,
            last_error: Some(trigger.reason),
            resolved: false,
            before_state: self.last_good.clone(),
            after_state: sample.clone(),
        };
        self.open.insert(event_type, event.clone());
        EventUpdate {
            transition: EventTransition::Started,
            event,
        }
    }

    fn resolve(&mut self, event_type: EventType, sample: &SignalSample) -> Option<EventUpdate> {
        let mut event = self.open.remove(&event_type)?;
        event.after_state = sample.clone();
        event.resolve_at(sample.timestamp);
        info!(
            %event_type,
            errors = event.error_count,
            duration_s = event.duration_seconds.unwrap_or_default(),
            "disruption resolved"
        );
        Some(EventUpdate {
            transition: EventTransition::Resolved,
            event,
        })
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn registration_trigger(sample: &SignalSample) -> Option<Trigger> {
    if sample.connection_mode == ConnectionMode::NoSignal {
        return Some(Trigger {
            severity: Severity::Critical,
            reason: "no radio reports a usable signal".into(),
        });
    }
    let status = sample.registration_status.as_deref()?;
    is_failed_registration(status).then(|| Trigger {
        severity: Severity::Critical,
        reason: format!("registration status '{status}'"),
    })
}
