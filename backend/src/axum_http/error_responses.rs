use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use crates::domain::value_objects::error_kinds::ErrorKind;
use serde::Serialize;
use thiserror::Error;

use crate::usecases::{
    booking_lifecycle::LifecycleError, guest_merge::MergeError, memberships::MembershipError,
    notifications::NotificationError, reservations::ReservationError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub kind: ErrorKind,
    pub message: String,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Storage failures never leak their cause to the client.
pub fn error_response(status: StatusCode, kind: ErrorKind, message: String) -> Response {
    let message = if kind == ErrorKind::StorageFailure {
        INTERNAL_MESSAGE.to_string()
    } else {
        message
    };

    let body = Json(ErrorResponse {
        code: status.as_u16(),
        kind,
        message,
    });

    (status, body).into_response()
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => error_response(
                StatusCode::UNAUTHORIZED,
                ErrorKind::Forbidden,
                self.to_string(),
            ),
            AppError::BadRequest(msg) => {
                error_response(StatusCode::BAD_REQUEST, ErrorKind::Validation, msg)
            }
            AppError::Internal(_) => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorKind::StorageFailure,
                String::new(),
            ),
        }
    }
}

impl IntoResponse for ReservationError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.kind(), self.to_string())
    }
}

impl IntoResponse for LifecycleError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.kind(), self.to_string())
    }
}

impl IntoResponse for MergeError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.kind(), self.to_string())
    }
}

impl IntoResponse for MembershipError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.kind(), self.to_string())
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        error_response(self.status_code(), self.kind(), self.to_string())
    }
}
