// ── GatewayStatus → SignalSample ──
//
// The only bridge between vendor-client output and the domain model.
// Unset fields stay unset.

use chrono::{DateTime, Utc};
use gatewatch_api::{GatewayStatus, RadioStats};

use crate::model::{ConnectionMode, SignalMetrics, SignalSample};

impl From<&RadioStats> for SignalMetrics {
    fn from(radio: &RadioStats) -> Self {
        Self {
            sinr: radio.sinr,
            rsrp: radio.rsrp,
            rsrq: radio.rsrq,
            rssi: radio.rssi,
            bands: radio.bands.clone(),
            tower_id: radio.tower_id,
            cell_id: radio.cell_id,
        }
    }
}

/// Normalize a vendor status into a sample stamped at `timestamp`.
pub fn sample_from_status(status: &GatewayStatus, timestamp: DateTime<Utc>) -> SignalSample {
    let nr = SignalMetrics::from(&status.nr);
    let lte = SignalMetrics::from(&status.lte);
    let connection_mode = ConnectionMode::from_radios(&nr, &lte);
    SignalSample {
        timestamp,
        nr,
        lte,
        registration_status: status.registration.clone(),
        connection_mode,
        device_uptime: status.uptime_secs,
    }
}
