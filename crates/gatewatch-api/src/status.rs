// Normalized vendor-client output
//
// Every vendor client parses its own payload into `GatewayStatus`. Raw field
// ambiguity is resolved before these types are built: every measurement is
// `Option`, and `None` always means "not measured" (never zero).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── Models ──────────────────────────────────────────────────────────

/// Closed set of supported gateway firmware dialects.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GatewayModel {
    Arcadyan,
    Nokia,
    Sagemcom,
}

impl GatewayModel {
    /// Fixed probe order used by auto-detection.
    pub const DETECTION_ORDER: [Self; 3] = [Self::Arcadyan, Self::Nokia, Self::Sagemcom];
}

/// Configured model: either pinned, or auto-detected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelSelection {
    #[default]
    Auto,
    Fixed(GatewayModel),
}

impl FromStr for ModelSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        trimmed.parse::<GatewayModel>().map(Self::Fixed).map_err(|_| {
            format!("unknown gateway model '{trimmed}' (expected auto, arcadyan, nokia, or sagemcom)")
        })
    }
}

impl TryFrom<String> for ModelSelection {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ModelSelection> for String {
    fn from(value: ModelSelection) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Fixed(model) => write!(f, "{model}"),
        }
    }
}

// ── Radio statistics ────────────────────────────────────────────────

/// Per-radio measurements as reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioStats {
    pub sinr: Option<f64>,
    pub rsrp: Option<f64>,
    pub rsrq: Option<f64>,
    pub rssi: Option<f64>,
    /// Band labels in reporting order, verbatim (e.g. `"n41"`, `"B66"`).
    pub bands: Vec<String>,
    /// gNB id (5G) or eNB id (LTE).
    pub tower_id: Option<u64>,
    pub cell_id: Option<u64>,
    pub pci: Option<u32>,
    pub tac: Option<u32>,
    pub bandwidth: Option<String>,
}

impl RadioStats {
    /// A radio "has valid signal" when RSRP is present and physically
    /// plausible: not exactly zero and greater than −200 dBm.
    #[allow(clippy::float_cmp)]
    pub fn has_valid_signal(&self) -> bool {
        self.rsrp.is_some_and(|rsrp| rsrp != 0.0 && rsrp > -200.0)
    }

    /// First band parsed to its number.
    pub fn primary_band(&self) -> Option<u32> {
        self.bands.iter().find_map(|b| crate::raw::parse_band(b))
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Which radio is carrying the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RadioKind {
    #[serde(rename = "5g")]
    #[strum(serialize = "5g")]
    Nr,
    #[serde(rename = "4g")]
    #[strum(serialize = "4g")]
    Lte,
    None,
}

/// Signal readings of the active radio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub rsrp: Option<f64>,
    pub rsrq: Option<f64>,
    pub sinr: Option<f64>,
    pub rssi: Option<f64>,
}

/// Serving cell of the active radio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellInfo {
    pub pci: Option<u32>,
    pub enb_id: Option<u64>,
    pub gnb_id: Option<u64>,
    pub cell_id: Option<u64>,
    pub tac: Option<u32>,
    pub band: Option<u32>,
    pub bandwidth: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(rename = "type")]
    pub kind: RadioKind,
    pub status: Option<String>,
}

/// Normalized status returned by every vendor client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayStatus {
    /// Vendor dialect that produced this status.
    pub model: GatewayModel,
    /// Hardware model string reported by the device, if any.
    pub device_model: Option<String>,
    pub signal: Signal,
    pub cell: CellInfo,
    pub connection: ConnectionInfo,
    pub nr: RadioStats,
    pub lte: RadioStats,
    pub registration: Option<String>,
    pub uptime_secs: Option<u64>,
}

impl GatewayStatus {
    /// Assemble a status from both radios, projecting `signal`/`cell`
    /// from whichever radio `active` names.
    pub fn from_radios(
        model: GatewayModel,
        active: RadioKind,
        nr: RadioStats,
        lte: RadioStats,
    ) -> Self {
        let (signal, cell) = match active {
            RadioKind::Nr => (signal_of(&nr), cell_of(&nr, true)),
            RadioKind::Lte => (signal_of(&lte), cell_of(&lte, false)),
            RadioKind::None => (Signal::default(), CellInfo::default()),
        };
        Self {
            model,
            device_model: None,
            signal,
            cell,
            connection: ConnectionInfo {
                kind: active,
                status: None,
            },
            nr,
            lte,
            registration: None,
            uptime_secs: None,
        }
    }
}

fn signal_of(radio: &RadioStats) -> Signal {
    Signal {
        rsrp: radio.rsrp,
        rsrq: radio.rsrq,
        sinr: radio.sinr,
        rssi: radio.rssi,
    }
}

fn cell_of(radio: &RadioStats, is_nr: bool) -> CellInfo {
    CellInfo {
        pci: radio.pci,
        enb_id: if is_nr { None } else { radio.tower_id },
        gnb_id: if is_nr { radio.tower_id } else { None },
        cell_id: radio.cell_id,
        tac: radio.tac,
        band: radio.primary_band(),
        bandwidth: radio.bandwidth.clone(),
    }
}
