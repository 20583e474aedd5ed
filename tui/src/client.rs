use std::error::Error as StdError;

use bytes::Bytes;
use http::{Request, Uri, header};
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const UPDATE_BUFFER: usize = 64;

/// What the reader task reports, in arrival order.
///
/// Every stream ends with exactly one of `Closed` or `Failed` unless it is
/// cancelled first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamUpdate {
    /// Response headers arrived with a success status.
    Connected,
    /// Raw body bytes. Boundaries are whatever the network delivered.
    Chunk(Bytes),
    /// The server closed the body normally.
    Closed,
    /// Non-success status, connect failure or read failure.
    Failed(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("failed to build request: {0}")]
    Request(#[from] http::Error),

    #[error("connection failed")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("stream read failed")]
    Read(#[from] hyper::Error),
}

impl TransportError {
    /// The error and every underlying cause, joined with `: `.
    pub fn describe(&self) -> String {
        let mut text = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        text
    }
}

/// A stream being read on a background task.
///
/// Dropping the handle or calling [`cancel`](StreamHandle::cancel) aborts the
/// task, which closes the connection and ends [`next`](StreamHandle::next).
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<()>,
    updates: mpsc::Receiver<StreamUpdate>,
}

impl StreamHandle {
    /// Issue `GET uri` with `Accept: text/event-stream` and start reading.
    pub fn spawn(uri: Uri) -> Self {
        let (tx, updates) = mpsc::channel(UPDATE_BUFFER);
        let task = tokio::spawn(async move {
            let last = match read_stream(uri, &tx).await {
                Ok(()) => StreamUpdate::Closed,
                Err(e) => {
                    let reason = e.describe();
                    warn!("Streaming error: {}", reason);
                    StreamUpdate::Failed(reason)
                }
            };
            let _ = tx.send(last).await;
        });
        Self { task, updates }
    }

    /// Wait for the next update. `None` once the task is gone.
    pub async fn next(&mut self) -> Option<StreamUpdate> {
        self.updates.recv().await
    }

    pub fn cancel(&self) {
        if !self.task.is_finished() {
            info!("Cancelling active stream");
        }
        self.task.abort();
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_stream(uri: Uri, tx: &mpsc::Sender<StreamUpdate>) -> Result<(), TransportError> {
    let client: Client<HttpConnector, Empty<Bytes>> =
        Client::builder(TokioExecutor::new()).build_http();

    let req = Request::get(uri.clone())
        .header(header::ACCEPT, "text/event-stream")
        .body(Empty::new())?;

    info!("Connecting to {}", uri);
    let res = client.request(req).await?;

    let status = res.status();
    if !status.is_success() {
        return Err(TransportError::Status(status.as_u16()));
    }

    if tx.send(StreamUpdate::Connected).await.is_err() {
        return Ok(());
    }

    let mut body = res.into_body();
    while let Some(frame) = body.frame().await {
        let frame = frame?;
        if let Ok(chunk) = frame.into_data() {
            debug!("Received chunk of {} bytes", chunk.len());
            if tx.send(StreamUpdate::Chunk(chunk)).await.is_err() {
                debug!("Update receiver dropped, stopping reader");
                return Ok(());
            }
        }
    }

    info!("Stream from {} closed by peer", uri);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_text() {
        assert_eq!(
            TransportError::Status(503).to_string(),
            "HTTP error! status: 503"
        );
        assert_eq!(
            TransportError::Status(404).describe(),
            "HTTP error! status: 404"
        );
    }

    #[tokio::test]
    async fn unreachable_host_fails_without_data() {
        // Port 9 on loopback is almost never listening.
        let mut handle = StreamHandle::spawn("http://127.0.0.1:9/stream".parse().unwrap());
        match handle.next().await {
            Some(StreamUpdate::Failed(reason)) => assert!(reason.starts_with("connection failed")),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(handle.next().await, None);
    }

    #[tokio::test]
    async fn unsupported_scheme_fails() {
        let mut handle = StreamHandle::spawn("https://127.0.0.1:9/stream".parse().unwrap());
        assert!(matches!(handle.next().await, Some(StreamUpdate::Failed(_))));
    }
}
