use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

/// Failures of the booking core: availability, reservation, and status
/// transitions. Every variant is returned to the caller; none are retried here.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BookingError {
    #[error("invalid interval: {0}")]
    InvalidInterval(String),

    #[error("workspace is not available for the requested time")]
    Conflict,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("booking is already cancelled")]
    AlreadyCancelled,

    #[error("booking is already checked in")]
    AlreadyCheckedIn,

    #[error("booking has already started")]
    PastStartTime,

    #[error("booking has not started yet")]
    NotStarted,

    #[error("payment declined: {0}")]
    PaymentDeclined(String),

    #[error("payment provider unavailable: {0}")]
    PaymentUnavailable(String),

    #[error("booking store unavailable: {0}")]
    StoreUnavailable(String),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
            BookingError::Conflict => StatusCode::CONFLICT,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::InvalidTransition { .. }
            | BookingError::AlreadyCancelled
            | BookingError::AlreadyCheckedIn
            | BookingError::PastStartTime
            | BookingError::NotStarted => StatusCode::CONFLICT,
            BookingError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            BookingError::PaymentUnavailable(_) | BookingError::StoreUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Booking(e) => e.status_code(),
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
