//! SSE record framing for the progress stream.
//!
//! A record is `"data: " <json> "\n\n"`. The emitter side uses
//! [`encode_record`]; the consumer side feeds raw network chunks into an
//! [`SseDecoder`] and gets back one [`SseMessage`] per complete record.

mod decoder;
mod record;

pub use decoder::SseDecoder;
pub use record::{DATA_PREFIX, RECORD_SEPARATOR, SseMessage, encode_record, parse_record};
