//! Output formatting: table, JSON, YAML.
//!
//! Renders data in the format selected by `--output`. Tables use `tabled`,
//! structured formats use serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use gatewatch_api::{GatewayStatus, RadioStats};
use gatewatch_core::{
    EventTransition, EventUpdate, PollOutcome, Severity, SignalQuality, TickResult,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Color when stdout is a terminal and `NO_COLOR` is unset.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

fn paint_quality(quality: SignalQuality, color: bool) -> String {
    let label = quality.to_string();
    if !color {
        return label;
    }
    match quality {
        SignalQuality::Excellent | SignalQuality::Good => label.green().to_string(),
        SignalQuality::Fair => label.yellow().to_string(),
        SignalQuality::Poor => label.bright_red().to_string(),
        SignalQuality::Critical => label.red().bold().to_string(),
    }
}

fn paint_severity(severity: Severity, color: bool) -> String {
    let label = severity.to_string();
    match (severity, color) {
        (_, false) => label,
        (Severity::Warning, true) => label.yellow().to_string(),
        (Severity::Critical, true) => label.red().bold().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render one serde-serializable item. Table output uses `detail_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
    })
}

/// Print rendered output to stdout.
pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Status detail ────────────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

fn row(field: impl Into<String>, value: impl Into<String>) -> FieldRow {
    FieldRow {
        field: field.into(),
        value: value.into(),
    }
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

fn db(value: Option<f64>) -> String {
    value.map_or_else(|| "-".into(), |v| format!("{v:.1}"))
}

fn radio_rows(rows: &mut Vec<FieldRow>, label: &str, radio: &RadioStats) {
    if radio == &RadioStats::default() {
        return;
    }
    let bands = if radio.bands.is_empty() {
        "-".to_owned()
    } else {
        radio.bands.join(", ")
    };
    rows.push(row(format!("{label} bands"), bands));
    rows.push(row(format!("{label} RSRP (dBm)"), db(radio.rsrp)));
    rows.push(row(format!("{label} RSRQ (dB)"), db(radio.rsrq)));
    rows.push(row(format!("{label} SINR (dB)"), db(radio.sinr)));
    rows.push(row(format!("{label} RSSI (dBm)"), db(radio.rssi)));
    rows.push(row(format!("{label} tower"), opt(radio.tower_id)));
    rows.push(row(format!("{label} cell"), opt(radio.cell_id)));
    rows.push(row(format!("{label} PCI"), opt(radio.pci)));
}

/// Key/value table for a single status reading.
pub fn status_detail(status: &GatewayStatus, quality: SignalQuality, color: bool) -> String {
    let mut rows = vec![
        row("Model", status.model.to_string()),
        row("Device", status.device_model.clone().unwrap_or_else(|| "-".into())),
        row("Connection", status.connection.kind.to_string()),
        row("Status", status.connection.status.clone().unwrap_or_else(|| "-".into())),
        row("Registration", status.registration.clone().unwrap_or_else(|| "-".into())),
        row(
            "Uptime",
            status.uptime_secs.map_or_else(
                || "-".into(),
                |secs| humantime::format_duration(std::time::Duration::from_secs(secs)).to_string(),
            ),
        ),
        row("Quality", paint_quality(quality, color)),
    ];
    radio_rows(&mut rows, "5G", &status.nr);
    radio_rows(&mut rows, "4G", &status.lte);
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Watch lines ──────────────────────────────────────────────────────

fn radio_summary(label: &str, radio: &gatewatch_core::SignalMetrics) -> Option<String> {
    if !radio.has_valid_signal() {
        return None;
    }
    let band = radio.bands.first().map_or("", String::as_str);
    Some(format!(
        "{label} {band} RSRP {} SINR {}",
        db(radio.rsrp),
        db(radio.sinr)
    ))
}

/// One human-readable line per tick, followed by one line per event update.
pub fn tick_line(tick: &TickResult, color: bool) -> String {
    let ts = tick.timestamp.format("%H:%M:%S");
    let mut out = match &tick.outcome {
        PollOutcome::Reading(reading) => {
            let sample = &reading.sample;
            let radios: Vec<String> = [
                radio_summary("5G", &sample.nr),
                radio_summary("4G", &sample.lte),
            ]
            .into_iter()
            .flatten()
            .collect();
            let radios = if radios.is_empty() {
                "no radio".to_owned()
            } else {
                radios.join(" | ")
            };
            format!(
                "{ts} {} {} [{}] {radios}",
                tick.gateway,
                sample.connection_mode,
                paint_quality(reading.quality, color),
            )
        }
        PollOutcome::NoData(reason) => {
            let since = if tick.staleness.seconds_since_success.is_finite() {
                format!("{:.0}s since success", tick.staleness.seconds_since_success)
            } else {
                "never succeeded".to_owned()
            };
            let line = format!("{ts} {} no data: {reason} ({since})", tick.gateway);
            if color { line.dimmed().to_string() } else { line }
        }
    };
    for update in &tick.events {
        out.push('\n');
        out.push_str(&event_line(update, color));
    }
    out
}

fn event_line(update: &EventUpdate, color: bool) -> String {
    let marker = match update.transition {
        EventTransition::Started => "+",
        EventTransition::Extended => "~",
        EventTransition::Resolved => "-",
        EventTransition::PointInTime => "*",
    };
    let event = &update.event;
    let mut line = format!(
        "  {marker} #{} {} {} {}",
        event.id,
        event.event_type,
        paint_severity(event.severity, color),
        update.transition,
    );
    if let Some(secs) = event.duration_seconds {
        line.push_str(&format!(" after {secs:.0}s"));
    }
    if let Some(ref err) = event.last_error {
        line.push_str(&format!(": {err}"));
    }
    line
}
