use tracing::debug;

use super::record::{RECORD_SEPARATOR, SseMessage, parse_record};

/// Incremental record splitter for a progress stream.
///
/// Owns the receive buffer: bytes are appended as chunks arrive and every
/// complete record is removed as soon as it is parsed, so after [`feed`]
/// returns the buffer only holds the unfinished tail.
///
/// UTF-8 sequences cut by a chunk boundary are held back until the rest of
/// the sequence arrives. Invalid bytes decode to U+FFFD.
///
/// [`feed`]: SseDecoder::feed
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence.
    pending: Vec<u8>,
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the messages of every record it completed,
    /// in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.decode_utf8(chunk);

        let mut messages = Vec::new();
        while let Some(end) = self.buffer.find(RECORD_SEPARATOR) {
            let record: String = self.buffer.drain(..end + RECORD_SEPARATOR.len()).collect();
            if let Some(message) = parse_record(&record[..end]) {
                messages.push(message);
            }
        }
        messages
    }

    /// Text received but not yet terminated by a record separator.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// End of input. Whatever is left is an incomplete record and is dropped;
    /// the dropped text is returned for callers that want to report it.
    pub fn finish(&mut self) -> Option<String> {
        let pending = std::mem::take(&mut self.pending);
        let leftover = std::mem::take(&mut self.buffer);

        if leftover.is_empty() && pending.is_empty() {
            return None;
        }
        debug!(
            "Discarding {} unterminated bytes at end of stream",
            leftover.len() + pending.len()
        );
        Some(leftover)
    }

    fn decode_utf8(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut input: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(input) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    input = &[];
                    break;
                }
                Err(err) => {
                    let (valid, rest) = input.split_at(err.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(bad) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            input = &rest[bad..];
                        }
                        // Sequence continues in the next chunk.
                        None => {
                            input = rest;
                            break;
                        }
                    }
                }
            }
        }

        let rest = input.to_vec();
        self.pending = rest;
    }
}
