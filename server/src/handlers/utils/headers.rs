use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty};
use hyper::header::{self, HeaderMap};
use hyper::{Response, StatusCode};
use std::convert::Infallible;
use tracing::debug;

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_HEADERS: &str = "Content-Type";
pub const ALLOW_METHODS: &str = "GET, OPTIONS";

/// Extract a header value as a string
pub fn get_header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(|s| {
        debug!("Retrieved header: {}", name);
        s.to_string()
    })
}

/// True when the `Accept` header is absent or lists `content_type`, its
/// `type/*` range, or `*/*`.
pub fn accepts_content_type(headers: &HeaderMap, content_type: &str) -> bool {
    let Some(accept) = get_header_value(headers, header::ACCEPT.as_str()) else {
        return true;
    };
    let main_type = content_type.split('/').next().unwrap_or(content_type);

    accept.split(',').any(|part| {
        let media = part.split(';').next().unwrap_or("").trim();
        if media == "*/*" || media.eq_ignore_ascii_case(content_type) {
            return true;
        }
        media
            .strip_suffix("/*")
            .is_some_and(|range| range.eq_ignore_ascii_case(main_type))
    })
}

/// Apply the cross-origin headers every response carries.
pub fn add_cors_headers(builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
    builder
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW_ORIGIN)
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS)
}

/// `204 No Content` answer to a CORS preflight.
pub fn preflight_response() -> anyhow::Result<Response<BoxBody<Bytes, Infallible>>> {
    add_cors_headers(Response::builder())
        .status(StatusCode::NO_CONTENT)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOW_METHODS)
        .header(header::ACCESS_CONTROL_MAX_AGE, "86400")
        .body(Empty::<Bytes>::new().boxed())
        .map_err(|e| anyhow::anyhow!("Failed to build preflight response: {}", e))
}
