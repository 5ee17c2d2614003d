// ── Signal quality classifier ──

use serde::{Deserialize, Serialize};

/// Discrete quality bucket derived from SINR.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SignalQuality {
    Critical,
    Poor,
    Fair,
    Good,
    Excellent,
}

/// Classify a SINR reading (dB). Thresholds are checked high to low and
/// the first match wins; an unset reading is `Poor`.
pub fn classify(sinr: Option<f64>) -> SignalQuality {
    let Some(sinr) = sinr else {
        return SignalQuality::Poor;
    };
    if sinr >= 20.0 {
        SignalQuality::Excellent
    } else if sinr >= 10.0 {
        SignalQuality::Good
    } else if sinr >= 0.0 {
        SignalQuality::Fair
    } else if sinr >= -5.0 {
        SignalQuality::Poor
    } else {
        SignalQuality::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries() {
        let cases = [
            (Some(20.0), SignalQuality::Excellent),
            (Some(19.9), SignalQuality::Good),
            (Some(10.0), SignalQuality::Good),
            (Some(9.9), SignalQuality::Fair),
            (Some(0.0), SignalQuality::Fair),
            (Some(-0.1), SignalQuality::Poor),
            (Some(-5.0), SignalQuality::Poor),
            (Some(-5.1), SignalQuality::Critical),
            (None, SignalQuality::Poor),
        ];
        for (sinr, expected) in cases {
            assert_eq!(classify(sinr), expected, "sinr {sinr:?}");
        }
    }
}
