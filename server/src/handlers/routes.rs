use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Method, Request, Response, StatusCode};
use shared::types::ErrorResponse;
use tracing::{debug, error};

use crate::AppState;
use crate::handlers::utils::{deliver_error_response, internal_error, preflight_response};
use crate::handlers::{health, sse};

// ---------------------------------------------------------------------------
// Handler type alias
// ---------------------------------------------------------------------------

type RouteHandler = Box<
    dyn Fn(
            Request<hyper::body::Incoming>,
            AppState,
        )
            -> Pin<Box<dyn Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send>>
        + Send
        + Sync,
>;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

struct Route {
    method: Method,
    path: String,
    handler: RouteHandler,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_count", &self.routes.len())
            .finish()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Register a GET handler for an exact path.
    pub fn get<F, Fut>(mut self, path: &str, handler: F) -> Self
    where
        F: Fn(Request<hyper::body::Incoming>, AppState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<BoxBody<Bytes, Infallible>>>> + Send + 'static,
    {
        self.routes.push(Route {
            method: Method::GET,
            path: path.to_string(),
            handler: Box::new(move |req, state| Box::pin(handler(req, state))),
        });
        self
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    /// Route a request. Never fails: handler errors become a JSON 500.
    pub async fn dispatch(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Response<BoxBody<Bytes, Infallible>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        debug!("{} {}", method, path);

        match self.route(req, state).await {
            Ok(response) => response,
            Err(e) => {
                error!("Handler for {} {} failed: {:#}", method, path, e);
                internal_error()
            }
        }
    }

    pub async fn route(
        &self,
        req: Request<hyper::body::Incoming>,
        state: AppState,
    ) -> Result<Response<BoxBody<Bytes, Infallible>>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        if method == Method::OPTIONS {
            return preflight_response();
        }

        if let Some(route) = self
            .routes
            .iter()
            .find(|r| r.method == method && r.path == path)
        {
            return (route.handler)(req, state).await;
        }

        if self.routes.iter().any(|r| r.path == path) {
            return deliver_error_response(
                &ErrorResponse::method_not_allowed(method.as_str(), &path),
                StatusCode::METHOD_NOT_ALLOWED,
            )
            .context("Failed to deliver 405 response");
        }

        deliver_error_response(&ErrorResponse::not_found(&path), StatusCode::NOT_FOUND)
            .context("Failed to deliver 404 response")
    }
}

/// Every endpoint the server exposes.
pub fn build_router() -> Router {
    Router::new()
        .get("/", sse::handle_progress_stream)
        .get("/stream", sse::handle_progress_stream)
        .get("/health", health::handle_health)
}
