use anyhow::{Result, anyhow};
use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyExt, StreamBody, combinators::BoxBody};
use hyper::{Request, Response, StatusCode, body::Frame, header, header::HeaderValue};
use std::convert::Infallible;
use tracing::{info, warn};

use crate::AppState;
use crate::emitter::{StaticMessages, progress_stream};
use crate::handlers::utils::{accepts_content_type, add_cors_headers, deliver_error_json};

pub const EVENT_STREAM: &str = "text/event-stream";

// ---------------------------------------------------------------------------
// SseStreamBuilder
// ---------------------------------------------------------------------------

/// Helpers for the SSE response envelope
pub struct SseStreamBuilder;

impl SseStreamBuilder {
    /// Standard SSE response headers
    pub fn response_headers() -> (HeaderValue, HeaderValue) {
        (
            HeaderValue::from_static(EVENT_STREAM),
            HeaderValue::from_static("no-cache"),
        )
    }

    /// Start a `200 OK` response carrying every streaming header.
    ///
    /// `x-accel-buffering: no` keeps nginx-style proxies from holding records back.
    pub fn response() -> hyper::http::response::Builder {
        let (content_type, cache_control) = Self::response_headers();
        add_cors_headers(Response::builder())
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, cache_control)
            .header(header::CONNECTION, "keep-alive")
            .header("x-accel-buffering", "no")
    }
}

// ---------------------------------------------------------------------------
// Progress stream handler
// ---------------------------------------------------------------------------

/// Stream the configured progress messages as `data:` records.
///
/// The message list and delay are copied out of the live config when the
/// request arrives, so a reload never changes a stream that is already running.
pub async fn handle_progress_stream(
    req: Request<hyper::body::Incoming>,
    state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    if !accepts_content_type(req.headers(), EVENT_STREAM) {
        warn!("Progress stream rejected: client does not accept {}", EVENT_STREAM);
        return deliver_error_json(
            "NOT_ACCEPTABLE",
            "This endpoint only produces text/event-stream",
            StatusCode::NOT_ACCEPTABLE,
        );
    }

    let (messages, delay) = {
        let cfg = state.config.read().await;
        (cfg.stream.messages.clone(), cfg.stream.delay())
    };

    info!(
        "Progress stream opened: {} messages, {:?} between records",
        messages.len(),
        delay
    );

    let stream = progress_stream(StaticMessages::new(messages), delay);
    let body = BodyExt::boxed(StreamBody::new(
        stream.map(|bytes| Ok::<_, Infallible>(Frame::data(bytes))),
    ));

    SseStreamBuilder::response()
        .body(body)
        .map_err(|e| anyhow!("Failed to build SSE response: {}", e))
}
