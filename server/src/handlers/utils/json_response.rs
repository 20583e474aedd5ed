use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode, header};
use serde::Serialize;
use serde_json::json;
use shared::types::ErrorResponse;
use std::convert::Infallible;
use tracing::{debug, error};

use super::headers::ALLOW_ORIGIN;

/// Serialize any `Serialize` type and deliver it as a JSON response.
pub fn deliver_serialized_json<T: Serialize>(
    data: &T,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let json = serde_json::to_string(data).context("Failed to serialize response")?;

    debug!("Delivering serialized JSON response, size: {} bytes", json.len());

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN)
        .body(Full::new(Bytes::from(json)).boxed())
        .map_err(|e| anyhow!("Failed to build JSON response: {}", e))
}

/// Delivers a JSON error response with the specified error code, message, and status.
pub fn deliver_error_json(
    error_code: &str,
    message: &str,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    error!(
        "Delivering error JSON: {} - {} ({})",
        status.as_u16(),
        error_code,
        message
    );

    deliver_serialized_json(&ErrorResponse::new(error_code, message), status)
}

/// Deliver a prebuilt [`ErrorResponse`].
pub fn deliver_error_response(
    body: &ErrorResponse,
    status: StatusCode,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_error_json(&body.code, &body.message, status)
}

/// `200 {"status":"success"}`.
pub fn deliver_success_json() -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_serialized_json(&json!({ "status": "success" }), StatusCode::OK)
}

/// Last-resort 500 used when even the JSON error response cannot be built.
pub fn internal_error() -> Response<BoxBody<Bytes, Infallible>> {
    let mut response = Response::new(
        Full::new(Bytes::from_static(
            br#"{"status":"error","code":"INTERNAL_ERROR","message":"An internal error occurred"}"#,
        ))
        .boxed(),
    );
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
