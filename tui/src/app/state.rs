use chrono::{DateTime, Local};
use http::Uri;
use shared::codec::{SseDecoder, SseMessage};
use tracing::{debug, info, warn};

use crate::client::StreamUpdate;
use crate::endpoint::validate_endpoint;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle of the one stream a controller can run at a time.
///
/// `Idle → Connecting → Streaming → Complete | Error`. `Complete`, `Error`
/// and `Idle` all allow a new start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamStatus {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Complete,
    Error(String),
}

impl StreamStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Streaming)
    }

    pub fn label(&self) -> String {
        match self {
            Self::Idle => "Status: Ready".to_string(),
            Self::Connecting | Self::Streaming => "Status: Streaming data...".to_string(),
            Self::Complete => "Status: Complete".to_string(),
            Self::Error(reason) => format!("Status: Error - {}", reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Display log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Data,
    Error,
    Success,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Data => "data",
            Self::Error => "error",
            Self::Success => "success",
        }
    }
}

/// One line of the display log. `at` is when the line was surfaced, not the
/// timestamp carried by the event.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub kind: MessageKind,
    pub text: String,
    pub at: DateTime<Local>,
}

// ---------------------------------------------------------------------------
// StreamController
// ---------------------------------------------------------------------------

/// Owns the stream status, the receive buffer, the display log and the
/// progress value. All changes go through the transition methods; updates
/// that arrive while no stream is active are ignored.
#[derive(Debug, Default)]
pub struct StreamController {
    status: StreamStatus,
    decoder: SseDecoder,
    log: Vec<LogEntry>,
    progress: u8,
}

impl StreamController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Latest progress percentage, `0..=100`.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn can_start(&self) -> bool {
        !self.status.is_active()
    }

    /// Validate `endpoint` and enter `Connecting`.
    ///
    /// Returns the URI to request, or `None` when a stream is already active
    /// or the endpoint is rejected. A rejected endpoint only adds one error
    /// line and changes the status; the previous log is kept.
    pub fn start(&mut self, endpoint: &str) -> Option<Uri> {
        if self.status.is_active() {
            warn!("Start ignored: a stream is already active");
            return None;
        }

        let uri = match validate_endpoint(endpoint) {
            Ok(uri) => uri,
            Err(e) => {
                warn!("Endpoint rejected: {:?}", e);
                self.status = StreamStatus::Error(e.status_reason().to_string());
                self.push(MessageKind::Error, format!("Error: {}", e));
                return None;
            }
        };

        self.log.clear();
        self.progress = 0;
        self.decoder = SseDecoder::new();
        self.status = StreamStatus::Connecting;

        info!("Starting stream from {}", uri);
        self.push(MessageKind::Info, "Connecting to stream endpoint...");
        self.push(MessageKind::Info, format!("URL: {}", endpoint.trim()));
        Some(uri)
    }

    /// Apply one update from the reader task.
    pub fn handle(&mut self, update: StreamUpdate) {
        match update {
            StreamUpdate::Connected => self.connected(),
            StreamUpdate::Chunk(chunk) => self.chunk_received(&chunk),
            StreamUpdate::Closed => self.stream_closed(),
            StreamUpdate::Failed(reason) => self.fail(reason),
        }
    }

    pub fn connected(&mut self) {
        if self.status != StreamStatus::Connecting {
            debug!("Ignoring connect in state {:?}", self.status);
            return;
        }
        self.status = StreamStatus::Streaming;
        self.push(MessageKind::Info, "Connection established. Receiving data...");
    }

    pub fn chunk_received(&mut self, chunk: &[u8]) {
        if self.status != StreamStatus::Streaming {
            debug!("Ignoring {} bytes in state {:?}", chunk.len(), self.status);
            return;
        }
        for message in self.decoder.feed(chunk) {
            self.apply(message);
        }
    }

    /// Normal end of input. Any unterminated record is dropped.
    pub fn stream_closed(&mut self) {
        if self.status != StreamStatus::Streaming {
            debug!("Ignoring close in state {:?}", self.status);
            return;
        }
        self.decoder.finish();
        self.status = StreamStatus::Complete;
        self.push(MessageKind::Success, "Stream completed successfully!");
    }

    /// Transport failure: terminal for the active stream.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if !self.status.is_active() {
            return;
        }
        let reason = reason.into();
        self.decoder = SseDecoder::new();
        self.push(MessageKind::Error, format!("Error: {}", reason));
        self.status = StreamStatus::Error(reason);
    }

    /// The user closed the connection.
    pub fn cancel(&mut self) {
        self.fail("Stream cancelled");
    }

    /// The reader went away without reporting how the stream ended.
    pub fn channel_closed(&mut self) {
        self.fail("Connection closed unexpectedly");
    }

    /// Empty the log and reset progress. The status only returns to `Idle`
    /// when no stream is running.
    pub fn clear(&mut self) {
        self.log.clear();
        self.progress = 0;
        if !self.status.is_active() {
            self.status = StreamStatus::Idle;
        }
    }

    fn apply(&mut self, message: SseMessage) {
        match message {
            SseMessage::Data {
                id,
                message,
                progress,
            } => {
                let id = id.unwrap_or_else(|| "?".to_string());
                self.push(MessageKind::Data, format!("[{}] {}", id, message));
                if let Some(progress) = progress {
                    self.progress = progress.min(100);
                }
            }
            SseMessage::Failure(error) => {
                self.push(MessageKind::Error, format!("Error: {}", error));
            }
            SseMessage::Raw(raw) => {
                self.push(MessageKind::Data, format!("Received: {}", raw));
            }
        }
    }

    fn push(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.log.push(LogEntry {
            kind,
            text: text.into(),
            at: Local::now(),
        });
    }
}
