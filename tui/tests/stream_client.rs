/// Client-side tests against real listeners: the progress server from this
/// workspace, plus small hand-rolled hyper services for failure cases.
use std::convert::Infallible;
use std::net::SocketAddr;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Response, StatusCode};
use hyper_util::rt::TokioIo;
use progress_server::{AppState, serve};
use progress_tui::app::{MessageKind, StreamController, StreamStatus, follow_stream};
use progress_tui::client::{StreamHandle, StreamUpdate};
use shared::types::AppConfig;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn progress_server(messages: &[&str], delay_ms: u64) -> (SocketAddr, oneshot::Sender<()>) {
    let mut config = AppConfig::default();
    config.stream.messages = messages.iter().map(|m| m.to_string()).collect();
    config.stream.delay_ms = delay_ms;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(serve(listener, AppState::new(config), async {
        let _ = rx.await;
    }));
    (addr, tx)
}

/// Serves one fixed response to every request.
async fn fixed_server(status: StatusCode, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let service = service_fn(move |_req| async move {
                    let mut res = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
                    *res.status_mut() = status;
                    res.headers_mut()
                        .insert("content-type", "text/event-stream".parse().unwrap());
                    Ok::<_, Infallible>(res)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    addr
}

fn kinds(controller: &StreamController) -> Vec<MessageKind> {
    controller.log().iter().map(|e| e.kind).collect()
}

fn texts(controller: &StreamController) -> Vec<String> {
    controller.log().iter().map(|e| e.text.clone()).collect()
}

#[tokio::test]
async fn starting_done_stream_completes_at_full_progress() {
    let (addr, _shutdown) = progress_server(&["Starting", "Done"], 0).await;
    let endpoint = format!("http://{}/stream", addr);

    let mut controller = StreamController::new();
    let uri = controller.start(&endpoint).unwrap();
    let mut handle = StreamHandle::spawn(uri);

    let mut seen = Vec::new();
    follow_stream(&mut controller, &mut handle, |entry| seen.push(entry.text.clone())).await;

    assert_eq!(controller.status(), &StreamStatus::Complete);
    assert_eq!(controller.progress(), 100);
    assert_eq!(
        texts(&controller),
        vec![
            "Connecting to stream endpoint...".to_string(),
            format!("URL: {}", endpoint),
            "Connection established. Receiving data...".to_string(),
            "[0] Starting".to_string(),
            "[1] Done".to_string(),
            "Stream completed successfully!".to_string(),
        ]
    );
    // The callback sees everything after the start lines.
    assert_eq!(seen.len(), 4);
}

#[tokio::test]
async fn default_twelve_message_stream_is_ordered() {
    let config = AppConfig::default();
    let messages: Vec<&str> = config.stream.messages.iter().map(String::as_str).collect();
    let (addr, _shutdown) = progress_server(&messages, 0).await;

    let mut controller = StreamController::new();
    let uri = controller.start(&format!("http://{}/", addr)).unwrap();
    let mut handle = StreamHandle::spawn(uri);
    follow_stream(&mut controller, &mut handle, |_| {}).await;

    let data: Vec<String> = controller
        .log()
        .iter()
        .filter(|e| e.kind == MessageKind::Data)
        .map(|e| e.text.clone())
        .collect();
    assert_eq!(data.len(), 12);
    assert_eq!(data[0], "[0] Starting data stream...");
    assert_eq!(data[11], "[11] Stream complete!");
    assert_eq!(controller.progress(), 100);
}

#[tokio::test]
async fn non_success_status_yields_one_error_and_is_restartable() {
    let addr = fixed_server(StatusCode::SERVICE_UNAVAILABLE, "data: {\"id\":0}\n\n").await;

    let mut controller = StreamController::new();
    let uri = controller.start(&format!("http://{}/stream", addr)).unwrap();
    let mut handle = StreamHandle::spawn(uri);
    follow_stream(&mut controller, &mut handle, |_| {}).await;

    assert_eq!(
        controller.status(),
        &StreamStatus::Error("HTTP error! status: 503".into())
    );
    assert_eq!(
        kinds(&controller),
        vec![MessageKind::Info, MessageKind::Info, MessageKind::Error]
    );
    assert_eq!(
        controller.log().last().unwrap().text,
        "Error: HTTP error! status: 503"
    );
    assert!(controller.can_start());
    assert_eq!(controller.progress(), 0);
}

#[tokio::test]
async fn error_record_then_close_is_not_a_transport_error() {
    let addr = fixed_server(
        StatusCode::OK,
        "data: {\"id\":0,\"message\":\"a\",\"progress\":0}\n\ndata: {\"error\":\"backend went away\"}\n\n",
    )
    .await;

    let mut controller = StreamController::new();
    let uri = controller.start(&format!("http://{}/", addr)).unwrap();
    let mut handle = StreamHandle::spawn(uri);
    follow_stream(&mut controller, &mut handle, |_| {}).await;

    assert_eq!(controller.status(), &StreamStatus::Complete);
    let log = texts(&controller);
    assert!(log.contains(&"Error: backend went away".to_string()));
    assert_eq!(log.last().unwrap(), "Stream completed successfully!");
}

#[tokio::test]
async fn trailing_partial_record_is_dropped_silently() {
    let addr = fixed_server(
        StatusCode::OK,
        "data: {\"id\":0,\"message\":\"a\",\"progress\":0}\n\ndata: {\"id\":1,\"mess",
    )
    .await;

    let mut controller = StreamController::new();
    let uri = controller.start(&format!("http://{}/", addr)).unwrap();
    let mut handle = StreamHandle::spawn(uri);
    follow_stream(&mut controller, &mut handle, |_| {}).await;

    assert_eq!(controller.status(), &StreamStatus::Complete);
    assert_eq!(
        kinds(&controller),
        vec![
            MessageKind::Info,
            MessageKind::Info,
            MessageKind::Info,
            MessageKind::Data,
            MessageKind::Success,
        ]
    );
}

#[tokio::test]
async fn cancel_mid_stream_is_terminal() {
    let (addr, _shutdown) = progress_server(&["first", "second"], 30_000).await;

    let mut controller = StreamController::new();
    let uri = controller.start(&format!("http://{}/stream", addr)).unwrap();
    let mut handle = StreamHandle::spawn(uri);

    // Read until the first record has been applied.
    while !controller.log().iter().any(|e| e.text == "[0] first") {
        let update = handle.next().await.unwrap();
        controller.handle(update);
    }

    handle.cancel();
    controller.cancel();
    assert_eq!(
        controller.status(),
        &StreamStatus::Error("Stream cancelled".into())
    );

    // Anything still queued is ignored once the controller is terminal.
    let before = controller.log().len();
    while let Some(update) = handle.next().await {
        controller.handle(update);
    }
    assert_eq!(controller.log().len(), before);
    assert!(controller.can_start());
}

#[tokio::test]
async fn invalid_endpoint_never_touches_the_network() {
    let mut controller = StreamController::new();
    assert!(controller.start("not a url").is_none());
    assert_eq!(texts(&controller), vec!["Error: Please enter a valid URL"]);
    assert_eq!(
        controller.status(),
        &StreamStatus::Error("Invalid URL format".into())
    );

    // No stream exists, so updates are ignored.
    controller.handle(StreamUpdate::Chunk(Bytes::from_static(
        b"data: {\"id\":0,\"message\":\"x\",\"progress\":50}\n\n",
    )));
    assert_eq!(controller.log().len(), 1);
    assert_eq!(controller.progress(), 0);
}
