// Raw vendor field normalization
//
// Gateway firmware is inconsistent about field types: the same metric can
// arrive as a JSON number, a numeric string, or a string with a unit suffix
// ("-95 dBm"). Every such field is captured as a `RawField` and normalized
// through exactly one function per target type. Nothing outside this module
// sees the ambiguity.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A vendor field before normalization: `number | string | absent`.
///
/// Booleans, arrays, objects, and `null` are treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawField {
    Number(serde_json::Number),
    Text(String),
    #[default]
    Absent,
}

impl From<&Value> for RawField {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => Self::Number(n.clone()),
            Value::String(s) => Self::Text(s.clone()),
            _ => Self::Absent,
        }
    }
}

impl<'de> Deserialize<'de> for RawField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from(&value))
    }
}

impl RawField {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Normalize to a float reading. See [`parse_float`].
    pub fn as_f64(&self) -> Option<f64> {
        parse_float(self)
    }

    /// Normalize to an integer. See [`parse_int`].
    pub fn as_i64(&self) -> Option<i64> {
        parse_int(self)
    }

    /// Normalize to a non-negative identifier (cell ids, tower ids, PCI, TAC).
    pub fn as_u64(&self) -> Option<u64> {
        parse_int(self).and_then(|v| u64::try_from(v).ok())
    }

    /// Normalize to a band number. See [`parse_band`].
    pub fn as_band(&self) -> Option<u32> {
        match self {
            Self::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            Self::Text(s) => parse_band(s),
            Self::Absent => None,
        }
    }

    /// The field as display text, if present and meaningful.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(n.to_string()),
            Self::Text(s) => {
                let trimmed = s.trim();
                if is_null_token(trimmed) {
                    None
                } else {
                    Some(trimmed.to_owned())
                }
            }
            Self::Absent => None,
        }
    }
}

/// First whitespace-delimited token, or `None` for empty / `N/A` / `null`.
fn first_token(s: &str) -> Option<&str> {
    let token = s.split_whitespace().next()?;
    if is_null_token(token) {
        return None;
    }
    Some(token)
}

fn is_null_token(s: &str) -> bool {
    s.is_empty() || s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("null")
}

/// Parse a float reading.
///
/// Numbers pass through. Strings are parsed from their first
/// whitespace-delimited token only, so `"-95 dBm"` yields `-95.0`.
/// Empty, `"N/A"`, `"null"`, non-finite, and unparsable values are unset.
pub fn parse_float(field: &RawField) -> Option<f64> {
    let value = match field {
        RawField::Number(n) => n.as_f64()?,
        RawField::Text(s) => first_token(s)?.parse::<f64>().ok()?,
        RawField::Absent => return None,
    };
    value.is_finite().then_some(value)
}

/// Parse an integer.
///
/// Strings prefixed `0x`/`0X` are base-16, everything else base-10.
/// Only the first whitespace-delimited token is considered. Numbers with a
/// fractional part are rejected.
#[allow(clippy::float_cmp)]
pub fn parse_int(field: &RawField) -> Option<i64> {
    match field {
        RawField::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            if f.fract() == 0.0 && f.is_finite() && f.abs() < 9.0e15 {
                #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
                Some(f as i64)
            } else {
                None
            }
        }),
        RawField::Text(s) => parse_int_str(s),
        RawField::Absent => None,
    }
}

fn parse_int_str(s: &str) -> Option<i64> {
    let token = first_token(s)?;
    let (negative, digits) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a band identifier: a single leading `b`/`n` (any case) is
/// stripped before decimal parsing. `"B66"` → 66, `"n41"` → 41, `"66"` → 66.
pub fn parse_band(s: &str) -> Option<u32> {
    let token = first_token(s)?;
    let digits = token
        .strip_prefix(['b', 'B', 'n', 'N'])
        .unwrap_or(token);
    digits.parse::<u32>().ok()
}

/// Collect band labels from an array, a comma-separated string, or a
/// bare number. Empty and null-token entries are dropped; order is kept.
pub fn band_labels(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| RawField::from(item).as_text())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|label| !is_null_token(label))
            .map(str::to_owned)
            .collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}

/// Look up the first present key from `candidates` in a JSON object.
pub(crate) fn lookup<'a>(
    map: &'a serde_json::Map<String, Value>,
    candidates: &[&str],
) -> Option<&'a Value> {
    candidates
        .iter()
        .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
}

/// Like [`lookup`], but normalized into a [`RawField`].
pub(crate) fn lookup_field(map: &serde_json::Map<String, Value>, candidates: &[&str]) -> RawField {
    lookup(map, candidates).map_or(RawField::Absent, RawField::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> RawField {
        RawField::Text(s.into())
    }

    fn num(v: &Value) -> RawField {
        RawField::from(v)
    }

    #[test]
    fn float_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_float(&num(&json!(-95))), Some(-95.0));
        assert_eq!(parse_float(&num(&json!(12.5))), Some(12.5));
        assert_eq!(parse_float(&text("-11")), Some(-11.0));
        assert_eq!(parse_float(&text("  -95 dBm")), Some(-95.0));
        assert_eq!(parse_float(&text("3.5dB")), None);
    }

    #[test]
    fn float_unset_sentinels_are_not_zero() {
        for raw in ["", "   ", "N/A", "n/a", "null", "NULL", "abc"] {
            assert_eq!(parse_float(&text(raw)), None, "input {raw:?}");
        }
        assert_eq!(parse_float(&RawField::Absent), None);
        assert_eq!(parse_float(&num(&json!(null))), None);
        assert_eq!(parse_float(&num(&json!(true))), None);
        // A literal zero is a real reading.
        assert_eq!(parse_float(&text("0")), Some(0.0));
    }

    #[test]
    fn int_parses_hex_and_decimal() {
        assert_eq!(parse_int(&text("0x1A")), Some(26));
        assert_eq!(parse_int(&text("0X1a2B")), Some(0x1a2b));
        assert_eq!(parse_int(&text("310")), Some(310));
        assert_eq!(parse_int(&text("-7 units")), Some(-7));
        assert_eq!(parse_int(&num(&json!(42))), Some(42));
        assert_eq!(parse_int(&num(&json!(42.0))), Some(42));
        assert_eq!(parse_int(&num(&json!(42.5))), None);
        assert_eq!(parse_int(&text("0xZZ")), None);
        assert_eq!(parse_int(&text("N/A")), None);
        assert_eq!(parse_int(&text("")), None);
    }

    #[test]
    fn identifiers_reject_negative_values() {
        assert_eq!(text("123456").as_u64(), Some(123_456));
        assert_eq!(text("-1").as_u64(), None);
        assert_eq!(text("0").as_u64(), Some(0));
    }

    #[test]
    fn band_strips_single_prefix() {
        assert_eq!(parse_band("B66"), Some(66));
        assert_eq!(parse_band("b66"), Some(66));
        assert_eq!(parse_band("n41"), Some(41));
        assert_eq!(parse_band("N71"), Some(71));
        assert_eq!(parse_band("66"), Some(66));
        assert_eq!(parse_band(""), None);
        assert_eq!(parse_band("nn41"), None);
        assert_eq!(parse_band("band"), None);
        assert_eq!(num(&json!(2)).as_band(), Some(2));
    }

    #[test]
    fn deserializes_from_mixed_payload() {
        #[derive(Deserialize)]
        struct Stat {
            #[serde(default)]
            rsrp: RawField,
            #[serde(default)]
            sinr: RawField,
            #[serde(default)]
            rsrq: RawField,
        }

        let stat: Stat = serde_json::from_value(json!({"rsrp": "-97 dBm", "sinr": 14})).unwrap();
        assert_eq!(stat.rsrp.as_f64(), Some(-97.0));
        assert_eq!(stat.sinr.as_f64(), Some(14.0));
        assert!(stat.rsrq.is_absent());
    }

    #[test]
    fn band_labels_accept_lists_and_strings() {
        assert_eq!(band_labels(&json!(["n41", "", "n71"])), vec!["n41", "n71"]);
        assert_eq!(band_labels(&json!("B2, B66")), vec!["B2", "B66"]);
        assert_eq!(band_labels(&json!(66)), vec!["66"]);
        assert!(band_labels(&json!(null)).is_empty());
        assert!(band_labels(&json!("N/A")).is_empty());
    }

    #[test]
    fn lookup_prefers_first_present_candidate() {
        let map = json!({"snr": "9", "SNRCurrent": null, "RSRP": -101})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(lookup_field(&map, &["sinr", "SNRCurrent", "snr"]).as_f64(), Some(9.0));
        assert_eq!(lookup_field(&map, &["rsrp", "RSRP"]).as_f64(), Some(-101.0));
        assert!(lookup_field(&map, &["missing"]).is_absent());
    }
}
