use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Field prefix every progress record starts with.
pub const DATA_PREFIX: &str = "data: ";

/// Blank line that ends a record.
pub const RECORD_SEPARATOR: &str = "\n\n";

/// Serialise a payload into one wire record.
///
/// `serde_json` escapes newlines inside strings, so the JSON body can never
/// contain the record separator.
pub fn encode_record<T: Serialize>(payload: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(payload)?;
    Ok(format!("{}{}{}", DATA_PREFIX, json, RECORD_SEPARATOR))
}

/// What the consumer makes of one complete record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseMessage {
    /// A decoded progress step. `id` is the display text of whatever value
    /// the payload carried; `progress` is already clamped to `0..=100`.
    Data {
        id: Option<String>,
        message: String,
        progress: Option<u8>,
    },
    /// The record carried an `error` field.
    Failure(String),
    /// The payload was not valid JSON; the text is passed through untouched.
    Raw(String),
}

/// Interpret one complete record (separator already removed).
///
/// Returns `None` for records that are not `data:` records, which are skipped.
pub fn parse_record(record: &str) -> Option<SseMessage> {
    let Some(payload) = record.strip_prefix(DATA_PREFIX) else {
        if !record.is_empty() {
            debug!("Skipping non-data record ({} bytes)", record.len());
        }
        return None;
    };

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            debug!("Failed to parse JSON payload: {}", e);
            return Some(SseMessage::Raw(payload.to_string()));
        }
    };

    if let Some(error) = value.get("error").filter(|e| is_truthy(e)) {
        return Some(SseMessage::Failure(display_text(error)));
    }

    Some(SseMessage::Data {
        id: value.get("id").filter(|id| !id.is_null()).map(display_text),
        message: value.get("message").map(display_text).unwrap_or_default(),
        progress: value
            .get("progress")
            .and_then(Value::as_f64)
            .map(clamp_progress),
    })
}

// `false`, `0`, `""` and `null` do not count as an error.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// Strings render without quotes; `null` as empty; everything else as JSON.
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn clamp_progress(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}
