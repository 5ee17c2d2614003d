#![allow(clippy::unwrap_used)]
// End-to-end tests for `Monitor` against a wiremock gateway.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatewatch_api::{GatewayModel, ModelSelection};
use gatewatch_core::{
    CircuitState, CoreError, MemoryRepository, MetricsSink, Monitor, MonitorConfig, NoDataReason,
    PollOutcome, Sinks, TickResult, WebhookAlertSink,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn arcadyan_body(rsrp: i64, sinr: i64) -> serde_json::Value {
    json!({
        "device": {"model": "TMO-G4AR"},
        "signal": {
            "5g": {"bands": ["n41"], "rsrp": rsrp, "sinr": sinr, "gNBID": 77, "cid": 1},
            "4g": {},
            "generic": {"registration": "registered"}
        }
    })
}

async fn gateway(rsrp: i64, sinr: i64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/TMI/v1/gateway"))
        .respond_with(ResponseTemplate::new(200).set_body_json(arcadyan_body(rsrp, sinr)))
        .mount(&server)
        .await;
    server
}

fn config(server: &MockServer) -> MonitorConfig {
    let mut config = MonitorConfig::new("home", Url::parse(&server.uri()).unwrap());
    config.poller.interval = Duration::from_millis(20);
    config.poller.timeout = Duration::from_secs(2);
    config.breaker.failure_threshold = 2;
    config.breaker.recovery_timeout = Duration::from_secs(60);
    config
}

/// Poll `check` until it passes or two seconds elapse.
async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}

#[derive(Default)]
struct RecordingMetrics {
    ticks: Mutex<Vec<bool>>,
}

impl MetricsSink for RecordingMetrics {
    fn observe(&self, tick: &TickResult) {
        self.ticks.lock().unwrap().push(tick.is_success());
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_monitor_detects_and_feeds_repository() {
    let server = gateway(-90, 18).await;
    let repo = Arc::new(MemoryRepository::new(64));
    let metrics = Arc::new(RecordingMetrics::default());
    let sinks = Sinks {
        repository: Some(repo.clone()),
        metrics: vec![metrics.clone()],
        alerts: Vec::new(),
    };

    let monitor = Monitor::start(config(&server), sinks).await.unwrap();
    assert_eq!(monitor.model(), GatewayModel::Arcadyan);

    eventually(|| repo.samples(Some("home"), 10).len() >= 3).await;
    eventually(|| metrics.ticks.lock().unwrap().len() >= 3).await;

    let stats = monitor.stats();
    assert!(stats.is_running);
    assert!(stats.success_count >= 3);
    assert_eq!(stats.circuit_state, CircuitState::Closed);
    assert!(!monitor.staleness().is_stale);

    let sample = monitor.latest_sample().unwrap();
    assert_eq!(sample.nr.rsrp, Some(-90.0));
    assert_eq!(sample.nr.tower_id, Some(77));

    monitor.shutdown().await;
    assert!(!monitor.stats().is_running);
}

#[tokio::test]
async fn test_detection_failure_is_fatal() {
    let server = MockServer::start().await;
    let err = Monitor::start(config(&server), Sinks::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DetectionFailed { .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_outage_publishes_no_data_and_opens_circuit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.model = ModelSelection::Fixed(GatewayModel::Arcadyan);
    let monitor = Monitor::start(cfg, Sinks::default()).await.unwrap();
    let mut feed = monitor.subscribe();

    let mut saw_circuit_open = false;
    for _ in 0..6 {
        let tick = feed.recv().await.unwrap();
        let PollOutcome::NoData(reason) = &tick.outcome else {
            panic!("failing gateway produced a reading");
        };
        if *reason == NoDataReason::CircuitOpen {
            saw_circuit_open = true;
        }
    }
    assert!(saw_circuit_open);
    assert_eq!(monitor.stats().circuit_state, CircuitState::Open);
    assert_eq!(monitor.stats().error_count, 2);
    assert!(monitor.latest_sample().is_none());

    let staleness = monitor.staleness();
    assert!(staleness.seconds_since_success.is_infinite());
    assert!(staleness.is_stale);

    monitor.shutdown().await;
}

#[tokio::test]
async fn test_critical_event_reaches_webhook() {
    // RSRP below the 5G critical level on the very first sample.
    let server = gateway(-121, 4).await;
    let hook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/alerts"))
        .and(body_partial_json(json!({
            "gateway": "home",
            "transition": "started",
            "event": {"eventType": "5g-degradation", "severity": "critical"}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&hook)
        .await;

    let webhook = WebhookAlertSink::new(
        Url::parse(&format!("{}/alerts", hook.uri())).unwrap(),
        Duration::from_secs(2),
    )
    .unwrap();
    let repo = Arc::new(MemoryRepository::new(16));
    let sinks = Sinks {
        repository: Some(repo.clone()),
        metrics: Vec::new(),
        alerts: vec![Arc::new(webhook)],
    };

    let monitor = Monitor::start(config(&server), sinks).await.unwrap();
    eventually(|| !repo.open_events().is_empty()).await;
    // Let a few extension ticks pass; they must not alert again.
    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.shutdown().await;

    let events = repo.events(Some("home"), 10);
    assert_eq!(events.len(), 1);
    assert!(events[0].event.error_count >= 1);
    hook.verify().await;
}

#[tokio::test]
async fn test_unsupported_model_stops_polling() {
    let server = MockServer::start().await;
    let mut cfg = config(&server);
    cfg.model = ModelSelection::Fixed(GatewayModel::Sagemcom);

    let monitor = Monitor::start(cfg, Sinks::default()).await.unwrap();
    eventually(|| !monitor.stats().is_running).await;

    assert!(matches!(
        monitor.fatal_error(),
        Some(CoreError::Unsupported { model }) if model == "sagemcom"
    ));
    let last = monitor.latest().unwrap();
    assert_eq!(
        last.outcome,
        PollOutcome::NoData(NoDataReason::Unsupported {
            model: "sagemcom".into()
        })
    );

    // The breaker is never cycled and no later tick replaces the last one.
    let stats = monitor.stats();
    assert_eq!(stats.circuit_state, CircuitState::Closed);
    assert_eq!(stats.error_count, 1);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(Arc::ptr_eq(&last, &monitor.latest().unwrap()));

    monitor.shutdown().await;
}
