// shared/src/types/progress.rs
// Payloads carried inside `data:` records of the progress stream

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// One step of a progress stream.
///
/// `progress` is a whole percentage in `0..=100` and never decreases across
/// a stream. Timestamps are kept at millisecond precision so that a record
/// decodes back to an identical value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: u64,
    pub message: String,
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub progress: u8,
}

impl ProgressEvent {
    /// Build the event for position `index` of a stream of `total` messages,
    /// stamped with the current time.
    pub fn new(index: usize, total: usize, message: impl Into<String>) -> Self {
        Self::at(index, total, message, Utc::now())
    }

    pub fn at(
        index: usize,
        total: usize,
        message: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: index as u64,
            message: message.into(),
            timestamp: timestamp.trunc_subsecs(3),
            progress: progress_for(index, total),
        }
    }
}

/// Percentage reached at `index` out of `total` steps, rounded half up.
///
/// A single-step stream reports 0.
pub fn progress_for(index: usize, total: usize) -> u8 {
    if total <= 1 {
        return 0;
    }
    let last = (total - 1) as f64;
    let ratio = index.min(total - 1) as f64 / last;
    (ratio * 100.0).round() as u8
}

/// Everything the emitter can put on the wire.
///
/// The failure form only ever carries `error`, so it is tried first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamPayload {
    Failure { error: String },
    Progress(ProgressEvent),
}

impl StreamPayload {
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }
}

impl From<ProgressEvent> for StreamPayload {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(event)
    }
}

/// ISO-8601 with milliseconds and a `Z` suffix, e.g. `2024-05-01T12:00:00.250Z`.
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
