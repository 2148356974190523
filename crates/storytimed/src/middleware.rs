//! Request middleware: body limits and panic recovery

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use crate::routes::ApiError;
use std::any::Any;
use storytime_common::{ErrorBody, StoryError};
use tracing::warn;

/// Maximum accepted body size in bytes
#[derive(Debug, Clone, Copy)]
pub struct BodyLimit(pub usize);

/// Body size limit middleware
///
/// Checks the Content-Length header and rejects requests above the limit
/// before any handler runs. Bodies without the header are capped by the
/// extractor limit instead.
pub async fn body_size_limit(
    State(BodyLimit(max)): State<BodyLimit>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(length) = content_length(&request) {
        if length > max {
            warn!("Request body too large: {} bytes (max: {})", length, max);
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorBody::new("Request body too large")),
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Turn a handler panic into a 500 `{"message": ...}` reply.
pub fn internal_error_for_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    ApiError(StoryError::Internal(detail)).into_response()
}

fn content_length(request: &Request) -> Option<usize> {
    request
        .headers()
        .get("content-length")?
        .to_str()
        .ok()?
        .parse::<usize>()
        .ok()
}
