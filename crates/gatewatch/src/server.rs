//! HTTP surface of `gatewatch export`.
//!
//! `/metrics` (Prometheus text), `/health`, `/status`, `/events` and
//! `/samples` (JSON, newest first).

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::warn;

use gatewatch_api::GatewayModel;
use gatewatch_core::{GatewayStats, MemoryRepository, Monitor, Staleness, TickResult};

use crate::metrics::PrometheusMetrics;

const DEFAULT_LIMIT: usize = 100;

pub struct AppState {
    pub monitors: Vec<Monitor>,
    pub metrics: PrometheusMetrics,
    pub repository: Arc<MemoryRepository>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/events", get(events_handler))
        .route("/samples", get(samples_handler))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

// ── Handlers ────────────────────────────────────────────────────────

async fn index_handler() -> &'static str {
    "gatewatch exporter\n\n\
     /metrics  Prometheus metrics\n\
     /health   200 when every gateway has fresh data, 503 otherwise\n\
     /status   per-gateway stats and latest tick (JSON)\n\
     /events   disruption events, newest first (?gateway=&limit=)\n\
     /samples  signal samples, newest first (?gateway=&limit=)\n"
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    for monitor in &state.monitors {
        state
            .metrics
            .refresh(monitor.name(), &monitor.staleness(), monitor.dropped());
    }
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        ),
        Err(e) => {
            warn!(error = %e, "failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                e.to_string(),
            )
        }
    }
}

#[derive(Debug, Serialize)]
struct GatewayHealth {
    gateway: String,
    stale: bool,
    circuit_state: gatewatch_core::CircuitState,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    healthy: bool,
    gateways: Vec<GatewayHealth>,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let gateways: Vec<GatewayHealth> = state
        .monitors
        .iter()
        .map(|m| GatewayHealth {
            gateway: m.name().to_owned(),
            stale: m.staleness().is_stale,
            circuit_state: m.stats().circuit_state,
        })
        .collect();
    let healthy = gateways.iter().all(|g| !g.stale);
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(HealthResponse { healthy, gateways }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayReport {
    gateway: String,
    url: String,
    model: GatewayModel,
    stats: GatewayStats,
    staleness: Staleness,
    fanout_dropped: u64,
    latest: Option<Arc<TickResult>>,
}

async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Vec<GatewayReport>> {
    Json(
        state
            .monitors
            .iter()
            .map(|m| GatewayReport {
                gateway: m.name().to_owned(),
                url: m.url().to_string(),
                model: m.model(),
                stats: GatewayStats::clone(&m.stats()),
                staleness: m.staleness(),
                fanout_dropped: m.dropped(),
                latest: m.latest(),
            })
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    gateway: Option<String>,
    limit: Option<usize>,
}

async fn events_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(
        state
            .repository
            .events(q.gateway.as_deref(), q.limit.unwrap_or(DEFAULT_LIMIT)),
    )
}

async fn samples_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(
        state
            .repository
            .samples(q.gateway.as_deref(), q.limit.unwrap_or(DEFAULT_LIMIT)),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use gatewatch_core::{MetricsSink, MonitorConfig, Sinks};
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn gateway() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/TMI/v1/gateway"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "device": {"model": "TMO-G4AR"},
                "signal": {
                    "5g": {"bands": ["n41"], "rsrp": -90, "sinr": 18, "gNBID": 77},
                    "generic": {"registration": "registered"}
                }
            })))
            .mount(&server)
            .await;
        server
    }

    async fn exporter(server: &MockServer) -> (String, Arc<AppState>) {
        let mut config = MonitorConfig::new("home", Url::parse(&server.uri()).unwrap());
        config.poller.interval = Duration::from_millis(20);

        let metrics = PrometheusMetrics::new().unwrap();
        let repository = Arc::new(MemoryRepository::new(32));
        let sinks = Sinks {
            repository: Some(repository.clone()),
            metrics: vec![Arc::new(metrics.clone()) as Arc<dyn MetricsSink>],
            alerts: Vec::new(),
        };
        let monitor = Monitor::start(config, sinks).await.unwrap();
        let state = Arc::new(AppState {
            monitors: vec![monitor],
            metrics,
            repository,
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(serve(listener, Arc::clone(&state), std::future::pending()));
        (base, state)
    }

    async fn wait_for_samples(state: &AppState) {
        for _ in 0..200 {
            if !state.repository.samples(None, 1).is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no samples recorded");
    }

    #[tokio::test]
    async fn endpoints_expose_monitor_state() {
        let server = gateway().await;
        let (base, state) = exporter(&server).await;
        wait_for_samples(&state).await;
        let http = reqwest::Client::new();

        let metrics = http.get(format!("{base}/metrics")).send().await.unwrap();
        assert_eq!(metrics.status(), 200);
        let text = metrics.text().await.unwrap();
        let rsrp = text
            .lines()
            .find_map(|l| l.strip_prefix("gatewatch_rsrp_dbm{gateway=\"home\",radio=\"5g\"} "))
            .unwrap();
        assert!((rsrp.parse::<f64>().unwrap() + 90.0).abs() < f64::EPSILON);
        assert!(text.contains("gatewatch_fanout_dropped_total{gateway=\"home\"}"));

        let health = http.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(health.status(), 200);

        let status: serde_json::Value = http
            .get(format!("{base}/status"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status[0]["gateway"], "home");
        assert_eq!(status[0]["model"], "arcadyan");
        assert_eq!(status[0]["latest"]["outcome"], "reading");

        let samples: serde_json::Value = http
            .get(format!("{base}/samples?gateway=home&limit=1"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(samples.as_array().unwrap().len(), 1);
        assert_eq!(samples[0]["nr"]["rsrp"], -90.0);

        let events: serde_json::Value = http
            .get(format!("{base}/events?gateway=elsewhere"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(events, json!([]));

        for monitor in &state.monitors {
            monitor.shutdown().await;
        }
    }
}
