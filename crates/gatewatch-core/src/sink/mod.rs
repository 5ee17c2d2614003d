// ── Downstream collaborators ──
//
// The poll loop never talks to a collaborator directly. Each configured
// sink gets a consumer task fed from its own bounded fan-out queue, so a
// slow repository or webhook cannot delay the next tick.

mod log;
mod memory;
mod webhook;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::fanout::Subscriber;
use crate::model::{EventUpdate, SignalSample};
use crate::monitor::TickResult;

pub use log::LogAlertSink;
pub use memory::{MemoryRepository, StoredEvent, StoredSample};
pub use webhook::WebhookAlertSink;

/// Boxed future returned by async sink methods.
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), CoreError>> + Send + 'a>>;

/// Durable history of samples and events.
pub trait Repository: Send + Sync {
    fn append_sample<'a>(&'a self, gateway: &'a str, sample: &'a SignalSample) -> SinkFuture<'a>;

    /// Insert a new event or replace the stored copy with the same id.
    fn record_event<'a>(&'a self, gateway: &'a str, update: &'a EventUpdate) -> SinkFuture<'a>;
}

/// Gauge-style consumer. Sees every tick, including `NoData` ticks.
pub trait MetricsSink: Send + Sync {
    fn observe(&self, tick: &TickResult);
}

/// Receives newly created and newly resolved critical events.
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &str;

    fn notify<'a>(&'a self, gateway: &'a str, update: &'a EventUpdate) -> SinkFuture<'a>;
}

/// The collaborators a monitor feeds.
#[derive(Clone, Default)]
pub struct Sinks {
    pub repository: Option<Arc<dyn Repository>>,
    pub metrics: Vec<Arc<dyn MetricsSink>>,
    pub alerts: Vec<Arc<dyn AlertSink>>,
}

impl Sinks {
    pub fn is_empty(&self) -> bool {
        self.repository.is_none() && self.metrics.is_empty() && self.alerts.is_empty()
    }
}

impl std::fmt::Debug for Sinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sinks")
            .field("repository", &self.repository.is_some())
            .field("metrics", &self.metrics.len())
            .field(
                "alerts",
                &self.alerts.iter().map(|a| a.name().to_owned()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ── Consumer tasks ──────────────────────────────────────────────────

type Tick = Arc<TickResult>;

/// Drive `handle` with every tick until cancelled or the feed closes.
async fn consume<F, Fut>(mut sub: Subscriber<Tick>, cancel: CancellationToken, mut handle: F)
where
    F: FnMut(Tick) -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            tick = sub.recv() => match tick {
                Some(tick) => handle(tick).await,
                None => break,
            },
        }
    }
    debug!(consumer = sub.name(), "consumer stopped");
}

pub(crate) async fn repository_task(
    sub: Subscriber<Tick>,
    repo: Arc<dyn Repository>,
    cancel: CancellationToken,
) {
    consume(sub, cancel, |tick| {
        let repo = Arc::clone(&repo);
        async move {
            if let Some(sample) = tick.outcome.sample() {
                if let Err(e) = repo.append_sample(&tick.gateway, sample).await {
                    warn!(error = %e, "failed to store sample");
                }
            }
            for update in &tick.events {
                if let Err(e) = repo.record_event(&tick.gateway, update).await {
                    warn!(error = %e, event_id = update.event.id, "failed to store event");
                }
            }
        }
    })
    .await;
}

pub(crate) async fn metrics_task(
    sub: Subscriber<Tick>,
    metrics: Arc<dyn MetricsSink>,
    cancel: CancellationToken,
) {
    consume(sub, cancel, |tick| {
        metrics.observe(&tick);
        std::future::ready(())
    })
    .await;
}

pub(crate) async fn alert_task(
    sub: Subscriber<Tick>,
    sink: Arc<dyn AlertSink>,
    cancel: CancellationToken,
) {
    consume(sub, cancel, |tick| {
        let sink = Arc::clone(&sink);
        async move {
            for update in tick.events.iter().filter(|u| u.is_alertable()) {
                if let Err(e) = sink.notify(&tick.gateway, update).await {
                    warn!(sink = sink.name(), error = %e, "alert delivery failed");
                }
            }
        }
    })
    .await;
}
