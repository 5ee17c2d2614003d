// ── Monitor ──
//
// Lifecycle facade for one gateway: detect the model, spawn the poll task
// and one consumer task per collaborator, expose lock-free snapshots, and
// shut everything down on request. A terminal tick stops the poll task and
// leaves its error in `fatal_error`.

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use arc_swap::{ArcSwap, ArcSwapOption};
use chrono::{DateTime, Utc};
use gatewatch_api::{GatewayClient, GatewayModel, VendorClient, detect};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use url::Url;

use crate::config::MonitorConfig;
use crate::detector::DisruptionDetector;
use crate::error::CoreError;
use crate::fanout::FanOut;
use crate::model::{EventUpdate, GatewayStats, SignalSample, Staleness};
use crate::poller::{NoDataReason, PollOutcome, Poller};
use crate::sink::{self, Sinks};

/// Everything one tick produced, as handed to collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct TickResult {
    /// Profile name of the gateway.
    pub gateway: String,
    pub timestamp: DateTime<Utc>,
    /// Wall time spent on the tick, including any request.
    pub duration_seconds: f64,
    #[serde(flatten)]
    pub outcome: PollOutcome,
    pub events: Vec<EventUpdate>,
    pub stats: GatewayStats,
    pub staleness: Staleness,
}

impl TickResult {
    pub fn is_success(&self) -> bool {
        self.outcome.reading().is_some()
    }
}

/// Handle to a running gateway monitor.
///
/// Cheaply cloneable via `Arc<MonitorInner>`.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    name: String,
    url: Url,
    model: GatewayModel,
    stale_threshold: Duration,
    stats: Arc<ArcSwap<GatewayStats>>,
    latest: Arc<ArcSwapOption<TickResult>>,
    fanout: Arc<FanOut<Arc<TickResult>>>,
    fatal: Arc<OnceLock<CoreError>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Detect the gateway model, then start polling.
    ///
    /// Detection failure is fatal and is not retried.
    pub async fn start(config: MonitorConfig, sinks: Sinks) -> Result<Self, CoreError> {
        let detected = detect(config.model, &config.url, &config.transport).await?;
        Ok(Self::start_with_client(config, detected.client, sinks))
    }

    /// Start polling with an already-selected client.
    pub fn start_with_client(config: MonitorConfig, client: VendorClient, sinks: Sinks) -> Self {
        let model = client.model();
        let mut poller = Poller::new(client, config.poller.clone(), config.breaker.clone());
        poller.set_running(true);

        let cancel = CancellationToken::new();
        let fanout = Arc::new(FanOut::new(config.queue_capacity));
        let latest = Arc::new(ArcSwapOption::empty());
        let stats = poller.stats_handle();
        let fatal = Arc::new(OnceLock::new());

        let mut handles = Vec::new();

        // Consumers subscribe before the first tick is published.
        if let Some(repo) = sinks.repository {
            let sub = fanout.subscribe("repository");
            handles.push(tokio::spawn(sink::repository_task(sub, repo, cancel.clone())));
        }
        for metrics in sinks.metrics {
            let sub = fanout.subscribe("metrics");
            handles.push(tokio::spawn(sink::metrics_task(sub, metrics, cancel.clone())));
        }
        for alert in sinks.alerts {
            let sub = fanout.subscribe(format!("alert:{}", alert.name()));
            handles.push(tokio::spawn(sink::alert_task(sub, alert, cancel.clone())));
        }

        let task = PollTask {
            name: config.name.clone(),
            stale_threshold: config.poller.stale_threshold,
            detector: DisruptionDetector::new(config.detection.clone()),
            latest: Arc::clone(&latest),
            fanout: Arc::clone(&fanout),
            fatal: Arc::clone(&fatal),
        };
        handles.push(tokio::spawn(task.run(poller, cancel.clone())));

        info!(
            gateway = %config.name,
            %model,
            url = %config.url,
            interval_ms = crate::poller::duration_ms(config.poller.interval),
            "monitor started"
        );

        Self {
            inner: Arc::new(MonitorInner {
                name: config.name,
                url: config.url,
                model,
                stale_threshold: config.poller.stale_threshold,
                stats,
                latest,
                fanout,
                fatal,
                cancel,
                task_handles: Mutex::new(handles),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn model(&self) -> GatewayModel {
        self.inner.model
    }

    /// Latest published stats snapshot.
    pub fn stats(&self) -> Arc<GatewayStats> {
        self.inner.stats.load_full()
    }

    /// Most recent tick, which may be an explicit `NoData`.
    pub fn latest(&self) -> Option<Arc<TickResult>> {
        self.inner.latest.load_full()
    }

    /// The sample from the most recent tick, only if that tick succeeded.
    pub fn latest_sample(&self) -> Option<SignalSample> {
        self.latest()
            .and_then(|tick| tick.outcome.sample().cloned())
    }

    /// Computed on demand, so it keeps growing while the breaker is open.
    pub fn staleness(&self) -> Staleness {
        self.stats().staleness(Utc::now(), self.inner.stale_threshold)
    }

    /// Why polling stopped on its own, if it did.
    ///
    /// Set once the client reports it cannot poll this model at all; the
    /// poll task has exited by then and no further ticks are published.
    pub fn fatal_error(&self) -> Option<&CoreError> {
        self.inner.fatal.get()
    }

    /// Items dropped by collaborators that fell behind.
    pub fn dropped(&self) -> u64 {
        self.inner.fanout.dropped()
    }

    /// Live feed of tick results.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TickResult>> {
        self.inner.fanout.receiver()
    }

    /// Stop polling, abandon any in-flight request, and join every task.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!(gateway = %self.inner.name, "monitor stopped");
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("name", &self.inner.name)
            .field("model", &self.inner.model)
            .field("url", &self.inner.url.as_str())
            .finish_non_exhaustive()
    }
}

// ── Poll task ───────────────────────────────────────────────────────

struct PollTask {
    name: String,
    stale_threshold: Duration,
    detector: DisruptionDetector,
    latest: Arc<ArcSwapOption<TickResult>>,
    fanout: Arc<FanOut<Arc<TickResult>>>,
    fatal: Arc<OnceLock<CoreError>>,
}

impl PollTask {
    async fn run<C: GatewayClient>(mut self, mut poller: Poller<C>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(poller.config().interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let started = Instant::now();
            // Cancellation drops the in-flight request; nothing is published.
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = poller.poll_once() => outcome,
            };
            if let PollOutcome::NoData(NoDataReason::Unsupported { model }) = &outcome {
                let err = CoreError::Unsupported {
                    model: model.clone(),
                };
                error!(gateway = %self.name, error = %err, "polling stopped");
                let _ = self.fatal.set(err);
                self.publish(outcome, poller.stats(), started.elapsed());
                break;
            }
            self.publish(outcome, poller.stats(), started.elapsed());
        }

        poller.set_running(false);
        debug!(gateway = %self.name, "poll task stopped");
    }

    fn publish(&mut self, outcome: PollOutcome, stats: &GatewayStats, elapsed: Duration) {
        let events = outcome
            .sample()
            .map(|sample| self.detector.observe(sample))
            .unwrap_or_default();
        let timestamp = Utc::now();

        let tick = Arc::new(TickResult {
            gateway: self.name.clone(),
            timestamp,
            duration_seconds: elapsed.as_secs_f64(),
            outcome,
            events,
            stats: stats.clone(),
            staleness: stats.staleness(timestamp, self.stale_threshold),
        });
        self.latest.store(Some(Arc::clone(&tick)));
        self.fanout.publish(tick);
    }
}
