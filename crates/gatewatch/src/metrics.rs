//! Prometheus gauges fed by monitor ticks.
//!
//! One registry per exporter process; every series is labelled by gateway
//! name. Signal gauges read NaN when the last tick failed or the gateway
//! did not report the field, so a stale value is never exported.

use chrono::{DateTime, Utc};
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

use gatewatch_api::RadioStats;
use gatewatch_core::{
    CircuitState, EventTransition, MetricsSink, NoDataReason, PollOutcome, SignalQuality,
    Staleness, TickResult,
};

const NAMESPACE: &str = "gatewatch";
const RADIOS: [&str; 2] = ["5g", "4g"];

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    scrape_success: GaugeVec,
    scrape_duration: GaugeVec,
    last_success: GaugeVec,
    since_success: GaugeVec,
    circuit_state: GaugeVec,
    consecutive_failures: GaugeVec,
    fanout_dropped: GaugeVec,
    polls: IntCounterVec,
    events: IntCounterVec,
    quality: GaugeVec,
    uptime: GaugeVec,
    rsrp: GaugeVec,
    rsrq: GaugeVec,
    sinr: GaugeVec,
    rssi: GaugeVec,
    tower: GaugeVec,
    cell: GaugeVec,
    pci: GaugeVec,
    tac: GaugeVec,
    band: GaugeVec,
}

fn gauge(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> prometheus::Result<GaugeVec> {
    let g = GaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(g.clone()))?;
    Ok(g)
}

fn counter(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> prometheus::Result<IntCounterVec> {
    let c = IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn to_f64(value: u64) -> f64 {
    value as f64
}

fn unix_seconds(ts: DateTime<Utc>) -> f64 {
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    let millis = ts.timestamp_millis() as f64;
    millis / 1000.0
}

fn circuit_value(state: CircuitState) -> f64 {
    match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    }
}

fn quality_value(quality: SignalQuality) -> f64 {
    match quality {
        SignalQuality::Critical => 0.0,
        SignalQuality::Poor => 1.0,
        SignalQuality::Fair => 2.0,
        SignalQuality::Good => 3.0,
        SignalQuality::Excellent => 4.0,
    }
}

impl PrometheusMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let gw = &["gateway"];
        let radio = &["gateway", "radio"];
        Ok(Self {
            scrape_success: gauge(&registry, "scrape_success", "1 if the last poll produced a reading", gw)?,
            scrape_duration: gauge(&registry, "scrape_duration_seconds", "Wall time of the last poll", gw)?,
            last_success: gauge(
                &registry,
                "last_success_timestamp_seconds",
                "Unix time of the last successful poll (NaN if none)",
                gw,
            )?,
            since_success: gauge(
                &registry,
                "seconds_since_success",
                "Seconds since the last successful poll (+Inf if none)",
                gw,
            )?,
            circuit_state: gauge(
                &registry,
                "circuit_state",
                "Circuit breaker state (0 closed, 1 half_open, 2 open)",
                gw,
            )?,
            consecutive_failures: gauge(
                &registry,
                "consecutive_failures",
                "Failed polls since the last success",
                gw,
            )?,
            fanout_dropped: gauge(
                &registry,
                "fanout_dropped_total",
                "Tick results dropped by collaborators that fell behind",
                gw,
            )?,
            polls: counter(&registry, "polls_total", "Polls by result", &["gateway", "result"])?,
            events: counter(
                &registry,
                "disruption_events_total",
                "Disruption events started, by type and severity",
                &["gateway", "type", "severity"],
            )?,
            quality: gauge(
                &registry,
                "signal_quality",
                "Quality of the active radio (0 critical .. 4 excellent, NaN on failure)",
                gw,
            )?,
            uptime: gauge(&registry, "device_uptime_seconds", "Gateway uptime", gw)?,
            rsrp: gauge(&registry, "rsrp_dbm", "Reference signal received power", radio)?,
            rsrq: gauge(&registry, "rsrq_db", "Reference signal received quality", radio)?,
            sinr: gauge(&registry, "sinr_db", "Signal to interference plus noise ratio", radio)?,
            rssi: gauge(&registry, "rssi_dbm", "Received signal strength indicator", radio)?,
            tower: gauge(&registry, "tower_id", "Serving gNB/eNB id", radio)?,
            cell: gauge(&registry, "cell_id", "Serving cell id", radio)?,
            pci: gauge(&registry, "pci", "Physical cell id", radio)?,
            tac: gauge(&registry, "tac", "Tracking area code", radio)?,
            band: gauge(&registry, "band", "Primary band number", radio)?,
            registry,
        })
    }

    /// Refresh the values that move between ticks. Called at scrape time.
    pub fn refresh(&self, gateway: &str, staleness: &Staleness, dropped: u64) {
        self.since_success
            .with_label_values(&[gateway])
            .set(staleness.seconds_since_success);
        self.fanout_dropped.with_label_values(&[gateway]).set(to_f64(dropped));
    }

    /// Text exposition of every registered series.
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn set_radio(&self, gateway: &str, radio: &str, stats: Option<&RadioStats>) {
        let labels = &[gateway, radio];
        let field = |get: fn(&RadioStats) -> Option<f64>| stats.and_then(get).unwrap_or(f64::NAN);
        self.rsrp.with_label_values(labels).set(field(|r| r.rsrp));
        self.rsrq.with_label_values(labels).set(field(|r| r.rsrq));
        self.sinr.with_label_values(labels).set(field(|r| r.sinr));
        self.rssi.with_label_values(labels).set(field(|r| r.rssi));
        self.tower.with_label_values(labels).set(field(|r| r.tower_id.map(to_f64)));
        self.cell.with_label_values(labels).set(field(|r| r.cell_id.map(to_f64)));
        self.pci.with_label_values(labels).set(field(|r| r.pci.map(f64::from)));
        self.tac.with_label_values(labels).set(field(|r| r.tac.map(f64::from)));
        self.band
            .with_label_values(labels)
            .set(field(|r| r.primary_band().map(f64::from)));
    }
}

impl MetricsSink for PrometheusMetrics {
    fn observe(&self, tick: &TickResult) {
        let gw = tick.gateway.as_str();
        let labels = &[gw];

        self.scrape_duration.with_label_values(labels).set(tick.duration_seconds);
        self.circuit_state
            .with_label_values(labels)
            .set(circuit_value(tick.stats.circuit_state));
        self.consecutive_failures
            .with_label_values(labels)
            .set(f64::from(tick.stats.consecutive_failures));
        self.last_success
            .with_label_values(labels)
            .set(tick.stats.last_success.map_or(f64::NAN, unix_seconds));
        self.since_success
            .with_label_values(labels)
            .set(tick.staleness.seconds_since_success);

        match &tick.outcome {
            PollOutcome::Reading(reading) => {
                self.scrape_success.with_label_values(labels).set(1.0);
                self.polls.with_label_values(&[gw, "success"]).inc();
                self.quality
                    .with_label_values(labels)
                    .set(quality_value(reading.quality));
                self.uptime
                    .with_label_values(labels)
                    .set(reading.sample.device_uptime.map_or(f64::NAN, to_f64));
                for (radio, stats) in RADIOS.iter().zip([&reading.status.nr, &reading.status.lte]) {
                    self.set_radio(gw, radio, Some(stats));
                }
            }
            PollOutcome::NoData(reason) => {
                let result = match reason {
                    NoDataReason::CircuitOpen => "circuit_open",
                    NoDataReason::Timeout { .. } => "timeout",
                    NoDataReason::RequestFailed { .. } | NoDataReason::Unsupported { .. } => "error",
                };
                self.scrape_success.with_label_values(labels).set(0.0);
                self.polls.with_label_values(&[gw, result]).inc();
                self.quality.with_label_values(labels).set(f64::NAN);
                self.uptime.with_label_values(labels).set(f64::NAN);
                for radio in RADIOS {
                    self.set_radio(gw, radio, None);
                }
            }
        }

        for update in &tick.events {
            if matches!(
                update.transition,
                EventTransition::Started | EventTransition::PointInTime
            ) {
                let kind = update.event.event_type.to_string();
                let severity = update.event.severity.to_string();
                self.events
                    .with_label_values(&[gw, kind.as_str(), severity.as_str()])
                    .inc();
            }
        }
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use gatewatch_api::{GatewayModel, GatewayStatus, RadioKind, RadioStats};
    use gatewatch_core::{GatewayStats, Reading, sample_from_status};

    use super::*;

    /// Value of the exposition line for `series`, parsed as f64.
    fn value(text: &str, series: &str) -> f64 {
        let line = text
            .lines()
            .find(|l| l.starts_with(series) && l[series.len()..].starts_with(' '))
            .unwrap_or_else(|| panic!("series {series} missing in:\n{text}"));
        line[series.len()..].trim().parse().unwrap()
    }

    fn tick(outcome: PollOutcome, stats: GatewayStats) -> TickResult {
        let now = Utc::now();
        TickResult {
            gateway: "home".into(),
            timestamp: now,
            duration_seconds: 0.25,
            staleness: stats.staleness(now, std::time::Duration::from_secs(30)),
            outcome,
            events: Vec::new(),
            stats,
        }
    }

    fn reading() -> PollOutcome {
        let nr = RadioStats {
            rsrp: Some(-95.0),
            sinr: Some(12.0),
            tower_id: Some(4242),
            pci: Some(301),
            bands: vec!["n41".into()],
            ..RadioStats::default()
        };
        let status = GatewayStatus::from_radios(GatewayModel::Arcadyan, RadioKind::Nr, nr, RadioStats::default());
        let sample = sample_from_status(&status, Utc::now());
        PollOutcome::Reading(Box::new(Reading {
            status,
            sample,
            quality: SignalQuality::Good,
        }))
    }

    #[test]
    fn reading_sets_signal_gauges() {
        let metrics = PrometheusMetrics::new().unwrap();
        let stats = GatewayStats {
            last_success: Some(Utc::now()),
            success_count: 1,
            ..GatewayStats::default()
        };
        metrics.observe(&tick(reading(), stats));

        let text = metrics.encode().unwrap();
        assert_eq!(value(&text, "gatewatch_scrape_success{gateway=\"home\"}"), 1.0);
        assert_eq!(value(&text, "gatewatch_rsrp_dbm{gateway=\"home\",radio=\"5g\"}"), -95.0);
        assert_eq!(value(&text, "gatewatch_tower_id{gateway=\"home\",radio=\"5g\"}"), 4242.0);
        assert_eq!(value(&text, "gatewatch_pci{gateway=\"home\",radio=\"5g\"}"), 301.0);
        assert_eq!(value(&text, "gatewatch_band{gateway=\"home\",radio=\"5g\"}"), 41.0);
        assert!(value(&text, "gatewatch_tac{gateway=\"home\",radio=\"5g\"}").is_nan());
        assert!(value(&text, "gatewatch_rsrp_dbm{gateway=\"home\",radio=\"4g\"}").is_nan());
        assert_eq!(
            value(&text, "gatewatch_polls_total{gateway=\"home\",result=\"success\"}"),
            1.0
        );
    }

    #[test]
    fn failure_blanks_gauges_and_reports_open_circuit() {
        let metrics = PrometheusMetrics::new().unwrap();
        metrics.observe(&tick(reading(), GatewayStats::default()));

        let stats = GatewayStats {
            circuit_state: CircuitState::Open,
            consecutive_failures: 3,
            ..GatewayStats::default()
        };
        metrics.observe(&tick(PollOutcome::NoData(NoDataReason::CircuitOpen), stats));

        let text = metrics.encode().unwrap();
        assert_eq!(value(&text, "gatewatch_scrape_success{gateway=\"home\"}"), 0.0);
        assert!(value(&text, "gatewatch_rsrp_dbm{gateway=\"home\",radio=\"5g\"}").is_nan());
        assert_eq!(value(&text, "gatewatch_circuit_state{gateway=\"home\"}"), 2.0);
        let since = value(&text, "gatewatch_seconds_since_success{gateway=\"home\"}");
        assert!(since.is_infinite() && since > 0.0);
        assert!(value(&text, "gatewatch_last_success_timestamp_seconds{gateway=\"home\"}").is_nan());
    }
}
