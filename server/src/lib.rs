//! Progress stream server.
//!
//! Serves a fixed sequence of progress messages as Server-Sent Events over
//! HTTP/1.1. See [`handlers::sse::handle_progress_stream`] for the stream
//! itself and [`emitter`] for how records are produced.

pub mod emitter;
pub mod handlers;

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use shared::config::{LiveConfig, load_config, validate_config};
use shared::types::AppConfig;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// State handed to every request handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: LiveConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: LiveConfig::new(config),
        }
    }
}

/// Accept connections on `listener` until `shutdown` resolves.
///
/// Each connection is served on its own task; open streams are not cut short
/// by shutdown, only the accept loop stops.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let router = Arc::new(handlers::build_router());
    let local = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!("Listening on http://{}", local);

    tokio::pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections on {}", local);
                return Ok(());
            }
        };

        let io = TokioIo::new(stream);
        let router = router.clone();
        let state = state.clone();

        tokio::task::spawn(async move {
            let service = service_fn(move |req| {
                let router = router.clone();
                let state = state.clone();
                async move { Ok::<_, Infallible>(router.dispatch(req, state).await) }
            });

            if let Err(err) = http1::Builder::new()
                .timer(TokioTimer::new())
                .serve_connection(io, service)
                .await
            {
                error!("Error serving connection from {}: {:?}", peer, err);
            }
        });
    }
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn run<F>(addr: &str, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    serve(listener, state, shutdown).await
}

/// Re-read `path` and swap it into the live config.
///
/// The listener keeps its current `[server]` section; stream settings apply
/// from the next request. On error the running config is left untouched.
pub async fn reload_config(state: &AppState, path: &str, delay_override: Option<u64>) -> Result<()> {
    let mut next = load_config(path).with_context(|| format!("Failed to load {}", path))?;
    next.server = state.config.read().await.server.clone();
    if let Some(delay_ms) = delay_override {
        next.stream.delay_ms = delay_ms;
    }
    validate_config(&next).context("Invalid configuration")?;

    state.config.reload(next).await;
    info!("Configuration reloaded from {}", path);
    Ok(())
}

/// Reload the config file every time the process receives SIGHUP.
#[cfg(unix)]
pub fn reload_on_hangup(state: AppState, path: String, delay_override: Option<u64>) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!("Failed to listen for SIGHUP, config reload disabled: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            info!("SIGHUP received, reloading {}", path);
            if let Err(e) = reload_config(&state, &path, delay_override).await {
                error!("Config reload failed, keeping current settings: {:#}", e);
            }
        }
    });
}

#[cfg(not(unix))]
pub fn reload_on_hangup(_state: AppState, path: String, _delay_override: Option<u64>) {
    warn!("SIGHUP is not available on this platform, {} will not be reloaded", path);
}
