//! Conversions from Nexia's raw encodings into normalized values.

use serde_json::Value;

/// Reads a JSON number or a numeric string. `"--"`, empty strings and
/// anything unparsable count as unavailable.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "--" {
                return None;
            }
            s.parse().ok()
        }
        _ => None,
    }
}

pub fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        other => number(other).map(|f| f.round() as i64),
    }
}

/// Reads a string, or the textual form of a number.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 0-100 percentage to a 0.0-1.0 fraction.
pub fn percent_to_fraction(percent: f64) -> f64 {
    percent / 100.0
}

/// Accepts either a fraction or a percentage; values above 1.0 are percent.
///
/// A lone reading of exactly 1 is ambiguous and is taken as the fraction 1.0
/// (full scale), not 1%.
pub fn to_fraction(value: f64) -> f64 {
    if value > 1.0 {
        percent_to_fraction(value)
    } else {
        value
    }
}

/// `(min, max)` of a set of choices, normalized to fractions.
///
/// The encoding is decided for the whole list: if any choice is above 1.0
/// every choice is a percentage.
pub fn fraction_limits(values: &[f64]) -> Option<(f64, f64)> {
    let percent = values.iter().any(|v| *v > 1.0);
    let mut iter = values
        .iter()
        .copied()
        .map(|v| if percent { percent_to_fraction(v) } else { v });
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

pub fn canonical_mode(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn canonical_lower(raw: &str) -> String {
    raw.trim().to_lowercase()
}

const AIR_MOVING_STATES: &[&str] = &[
    "cooling",
    "heating",
    "waiting",
    "fan running",
    "emergency heat",
    "defrosting",
    "dehumidifying",
    "humidifying",
];

/// Whether an equipment status string means the blower is moving air.
///
/// Statuses are matched by prefix so that "Heating - Stage 2" and "Waiting..."
/// classify like their base state.
pub fn status_moves_air(status: &str) -> bool {
    let status = status.trim().to_ascii_lowercase();
    AIR_MOVING_STATES
        .iter()
        .any(|state| status.starts_with(state))
}
