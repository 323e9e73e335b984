use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::error_kinds::ErrorKind;
use tracing::debug;

use crate::axum_http::error_responses::error_response;

pub async fn not_found(uri: Uri) -> Response {
    debug!(path = %uri.path(), "router: no route matched");
    error_response(
        StatusCode::NOT_FOUND,
        ErrorKind::Validation,
        format!("No route for {}", uri.path()),
    )
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}
