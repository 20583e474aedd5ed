mod source;

pub use source::{EmitError, MessageSource, StaticMessages};

use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use shared::codec::encode_record;
use shared::types::{ProgressEvent, StreamPayload};
use tracing::{debug, error, info};

// Written when even the failure record cannot be encoded.
const FALLBACK_FAILURE_RECORD: &str = "data: {\"error\":\"internal error\"}\n\n";

/// Produce the records of one progress stream.
///
/// Yields one `data:` record per message, in order, pausing `delay` between
/// records (never after the last one). The stream ends after the last record.
/// If the source fails, a single `{"error": …}` record is yielded instead and
/// the stream ends there.
pub fn progress_stream<S: MessageSource>(mut source: S, delay: Duration) -> impl Stream<Item = Bytes> + Send {
    async_stream::stream! {
        let total = source.len();
        let mut failed = false;

        for index in 0..total {
            match next_record(&mut source, index, total) {
                Ok(record) => {
                    debug!("Emitting record {}/{}", index + 1, total);
                    yield Bytes::from(record);
                }
                Err(e) => {
                    error!("Streaming error at record {}: {}", index, e);
                    yield Bytes::from(failure_record(&e.to_string()));
                    failed = true;
                    break;
                }
            }

            if index + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        if !failed {
            info!("Progress stream finished after {} records", total);
        }
    }
}

fn next_record<S: MessageSource>(
    source: &mut S,
    index: usize,
    total: usize,
) -> Result<String, EmitError> {
    let message = source.message(index)?;
    let payload = StreamPayload::from(ProgressEvent::new(index, total, message));
    Ok(encode_record(&payload)?)
}

/// Serialise a `{"error": …}` record.
pub fn failure_record(error: &str) -> String {
    encode_record(&StreamPayload::failure(error))
        .unwrap_or_else(|_| FALLBACK_FAILURE_RECORD.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use shared::codec::{SseDecoder, SseMessage};
    use std::task::Poll;

    /// Fails on one index, succeeds everywhere else.
    struct FlakySource {
        messages: Vec<String>,
        fail_at: usize,
    }

    impl MessageSource for FlakySource {
        fn len(&self) -> usize {
            self.messages.len()
        }

        fn message(&mut self, index: usize) -> Result<String, EmitError> {
            if index == self.fail_at {
                return Err(EmitError::SourceFailed {
                    index,
                    reason: "backend went away".to_string(),
                });
            }
            Ok(self.messages[index].clone())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    async fn collect_records<S: MessageSource>(source: S) -> Vec<String> {
        progress_stream(source, Duration::ZERO)
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect()
            .await
    }

    #[tokio::test]
    async fn one_record_per_message() {
        let records = collect_records(StaticMessages::new(strings(&["a", "b", "c"]))).await;
        assert_eq!(records.len(), 3);
        for record in &records {
            assert!(record.starts_with("data: {"));
            assert!(record.ends_with("}\n\n"));
        }
    }

    #[tokio::test]
    async fn ids_and_progress_follow_order() {
        let records = collect_records(StaticMessages::new(strings(&["Starting", "Done"]))).await;

        let mut decoder = SseDecoder::new();
        let out = decoder.feed(records.concat().as_bytes());
        assert_eq!(
            out,
            vec![
                SseMessage::Data {
                    id: Some("0".into()),
                    message: "Starting".into(),
                    progress: Some(0),
                },
                SseMessage::Data {
                    id: Some("1".into()),
                    message: "Done".into(),
                    progress: Some(100),
                },
            ]
        );
    }

    #[tokio::test]
    async fn single_message_reports_zero_progress() {
        let records = collect_records(StaticMessages::new(strings(&["only"]))).await;
        let json: serde_json::Value =
            serde_json::from_str(records[0].trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["progress"], 0);
    }

    #[tokio::test]
    async fn empty_source_closes_immediately() {
        let records = collect_records(StaticMessages::new(Vec::new())).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn failure_emits_one_error_record_and_stops() {
        let source = FlakySource {
            messages: strings(&["a", "b", "c", "d"]),
            fail_at: 2,
        };
        let records = collect_records(source).await;

        assert_eq!(records.len(), 3);
        let last: serde_json::Value =
            serde_json::from_str(records[2].trim_start_matches("data: ").trim_end()).unwrap();
        assert_eq!(
            last,
            serde_json::json!({ "error": "message 2 unavailable: backend went away" })
        );
    }

    #[tokio::test]
    async fn pauses_between_records_but_not_after_last() {
        let delay = Duration::from_millis(20);
        let started = tokio::time::Instant::now();
        let records: Vec<Bytes> = progress_stream(StaticMessages::new(strings(&["a", "b"])), delay)
            .collect()
            .await;
        let elapsed = started.elapsed();

        assert_eq!(records.len(), 2);
        assert!(elapsed >= delay);
        assert!(elapsed < delay * 50);
    }

    #[tokio::test]
    async fn next_record_waits_for_the_pause() {
        let mut stream = tokio_test::task::spawn(progress_stream(
            StaticMessages::new(strings(&["a", "b"])),
            Duration::from_secs(60),
        ));

        assert!(matches!(stream.poll_next(), Poll::Ready(Some(_))));
        tokio_test::assert_pending!(stream.poll_next());
    }

    #[test]
    fn failure_record_is_well_formed() {
        assert_eq!(failure_record("x"), "data: {\"error\":\"x\"}\n\n");
    }
}
