use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response};
use std::convert::Infallible;

use crate::AppState;
use crate::handlers::utils::deliver_success_json;

pub async fn handle_health(
    _req: Request<hyper::body::Incoming>,
    _state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    deliver_success_json()
}
