//! Lenient numeric decoding for result-store documents.
//!
//! Numeric fields may arrive as JSON numbers or as numeric strings. A value
//! that is present but decodes as neither falls back to zero; an absent value
//! stays `None` (or zero for required counters).

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or_else(|_| {
            debug!(raw = %s, "numeric string failed to parse; defaulting to zero");
            0.0
        }),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null | Value::Array(_) | Value::Object(_) => {
            debug!("non-numeric value in numeric field; defaulting to zero");
            0.0
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn value_to_u64(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f.max(0.0) as u64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.max(0.0) as u64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Deserialize an optional `f64` from a number or numeric string.
///
/// # Errors
///
/// Only fails if the underlying JSON is structurally invalid.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_to_f64(&v)),
    })
}

/// Deserialize a required counter from a number or numeric string.
///
/// # Errors
///
/// Only fails if the underlying JSON is structurally invalid.
pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map_or(0, value_to_u64))
}
