// In-process bounded history. Oldest entries are evicted once a list is
// full; events are upserted by (gateway, id) so a resolved event replaces
// its open copy.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::{Repository, SinkFuture};
use crate::model::{DisruptionEvent, EventUpdate, SignalSample};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSample {
    pub gateway: String,
    #[serde(flatten)]
    pub sample: SignalSample,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredEvent {
    pub gateway: String,
    #[serde(flatten)]
    pub event: DisruptionEvent,
}

#[derive(Debug, Default)]
struct History {
    samples: VecDeque<StoredSample>,
    events: VecDeque<StoredEvent>,
}

#[derive(Debug)]
pub struct MemoryRepository {
    capacity: usize,
    history: Mutex<History>,
}

impl MemoryRepository {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            history: Mutex::new(History::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Most recent samples first, optionally for one gateway.
    pub fn samples(&self, gateway: Option<&str>, limit: usize) -> Vec<StoredSample> {
        self.lock()
            .samples
            .iter()
            .rev()
            .filter(|s| gateway.is_none_or(|g| s.gateway == g))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Most recently started events first, optionally for one gateway.
    pub fn events(&self, gateway: Option<&str>, limit: usize) -> Vec<StoredEvent> {
        self.lock()
            .events
            .iter()
            .rev()
            .filter(|e| gateway.is_none_or(|g| e.gateway == g))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn open_events(&self) -> Vec<StoredEvent> {
        self.lock()
            .events
            .iter()
            .filter(|e| !e.event.resolved)
            .cloned()
            .collect()
    }

    fn push_sample(&self, gateway: &str, sample: &SignalSample) {
        let mut history = self.lock();
        if history.samples.len() >= self.capacity {
            history.samples.pop_front();
        }
        history.samples.push_back(StoredSample {
            gateway: gateway.to_owned(),
            sample: sample.clone(),
        });
    }

    fn upsert_event(&self, gateway: &str, event: &DisruptionEvent) {
        let mut history = self.lock();
        let existing = history
            .events
            .iter_mut()
            .find(|e| e.gateway == gateway && e.event.id == event.id);
        if let Some(stored) = existing {
            stored.event = event.clone();
            return;
        }
        if history.events.len() >= self.capacity {
            history.events.pop_front();
        }
        history.events.push_back(StoredEvent {
            gateway: gateway.to_owned(),
            event: event.clone(),
        });
    }
}

impl Repository for MemoryRepository {
    fn append_sample<'a>(&'a self, gateway: &'a str, sample: &'a SignalSample) -> SinkFuture<'a> {
        self.push_sample(gateway, sample);
        Box::pin(std::future::ready(Ok(())))
    }

    fn record_event<'a>(&'a self, gateway: &'a str, update: &'a EventUpdate) -> SinkFuture<'a> {
        self.upsert_event(gateway, &update.event);
        Box::pin(std::future::ready(Ok(())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    use crate::model::{ConnectionMode, EventTransition, EventType, Severity, SignalMetrics};

    fn sample(secs: i64) -> SignalSample {
        SignalSample {
            timestamp: DateTime::<Utc>::from_timestamp(secs, 0).unwrap(),
            nr: SignalMetrics::default(),
            lte: SignalMetrics::default(),
            registration_status: None,
            connection_mode: ConnectionMode::NoSignal,
            device_uptime: None,
        }
    }

    fn update(id: u64, resolved: bool) -> EventUpdate {
        let mut event = DisruptionEvent {
            id,
            event_type: EventType::RegistrationLoss,
            severity: Severity::Critical,
            start_time: sample(0).timestamp,
            end_time: None,
            duration_seconds: None,
            error_count: 1,
            last_error: None,
            resolved: false,
            before_state: None,
            after_state: sample(0),
        };
        if resolved {
            event.resolve_at(sample(4).timestamp);
        }
        EventUpdate {
            transition: if resolved {
                EventTransition::Resolved
            } else {
                EventTransition::Started
            },
            event,
        }
    }

    #[tokio::test]
    async fn evicts_oldest_samples() {
        let repo = MemoryRepository::new(2);
        for t in 0..3 {
            repo.append_sample("home", &sample(t)).await.unwrap();
        }
        let kept = repo.samples(None, 10);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].sample.timestamp.timestamp(), 2);
        assert_eq!(kept[1].sample.timestamp.timestamp(), 1);
    }

    #[tokio::test]
    async fn resolving_replaces_open_event() {
        let repo = MemoryRepository::new(8);
        repo.record_event("home", &update(1, false)).await.unwrap();
        assert_eq!(repo.open_events().len(), 1);

        repo.record_event("home", &update(1, true)).await.unwrap();
        let events = repo.events(Some("home"), 10);
        assert_eq!(events.len(), 1);
        assert!(events[0].event.resolved);
        assert_eq!(events[0].event.duration_seconds, Some(4.0));
        assert!(repo.open_events().is_empty());
        assert!(repo.events(Some("office"), 10).is_empty());
    }
}
