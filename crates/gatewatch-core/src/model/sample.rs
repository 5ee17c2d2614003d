// ── Signal samples ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Measurements from one radio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMetrics {
    pub sinr: Option<f64>,
    pub rsrp: Option<f64>,
    pub rsrq: Option<f64>,
    pub rssi: Option<f64>,
    pub bands: Vec<String>,
    /// gNB id (5G) or eNB id (LTE).
    pub tower_id: Option<u64>,
    pub cell_id: Option<u64>,
}

impl SignalMetrics {
    /// RSRP present, not exactly zero, and above −200 dBm.
    #[allow(clippy::float_cmp)]
    pub fn has_valid_signal(&self) -> bool {
        self.rsrp.is_some_and(|rsrp| rsrp != 0.0 && rsrp > -200.0)
    }
}

/// How the gateway is attached to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum ConnectionMode {
    /// 5G standalone.
    #[serde(rename = "SA")]
    #[strum(serialize = "SA")]
    Sa,
    /// 5G anchored on LTE.
    #[serde(rename = "NSA")]
    #[strum(serialize = "NSA")]
    Nsa,
    #[serde(rename = "LTE")]
    #[strum(serialize = "LTE")]
    Lte,
    NoSignal,
}

impl ConnectionMode {
    /// Derive the mode from which radios report a plausible signal.
    pub fn from_radios(nr: &SignalMetrics, lte: &SignalMetrics) -> Self {
        match (nr.has_valid_signal(), lte.has_valid_signal()) {
            (true, true) => Self::Nsa,
            (true, false) => Self::Sa,
            (false, true) => Self::Lte,
            (false, false) => Self::NoSignal,
        }
    }
}

/// One successful poll, normalized. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSample {
    pub timestamp: DateTime<Utc>,
    pub nr: SignalMetrics,
    pub lte: SignalMetrics,
    pub registration_status: Option<String>,
    pub connection_mode: ConnectionMode,
    /// Device uptime in seconds.
    pub device_uptime: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radio(rsrp: Option<f64>) -> SignalMetrics {
        SignalMetrics {
            rsrp,
            ..SignalMetrics::default()
        }
    }

    #[test]
    fn connection_mode_from_valid_radios() {
        let good = radio(Some(-90.0));
        let zero = radio(Some(0.0));
        let none = radio(None);

        assert_eq!(ConnectionMode::from_radios(&good, &good), ConnectionMode::Nsa);
        assert_eq!(ConnectionMode::from_radios(&good, &none), ConnectionMode::Sa);
        assert_eq!(ConnectionMode::from_radios(&zero, &good), ConnectionMode::Lte);
        assert_eq!(ConnectionMode::from_radios(&none, &zero), ConnectionMode::NoSignal);
        assert_eq!(ConnectionMode::Nsa.to_string(), "NSA");
    }
}
