//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::services::BookingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request (bad date/time syntax and the like)
    BadRequest(String),
    /// Typed engine failure
    Booking(BookingError),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Booking(err) => booking_error_response(err),
        };

        (status, Json(error)).into_response()
    }
}

fn booking_error_response(err: BookingError) -> (StatusCode, ApiError) {
    let message = err.to_string();
    match err {
        BookingError::InvalidInterval(_) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_INTERVAL", message),
        ),
        BookingError::InvalidScore(_) => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_SCORE", message),
        ),
        BookingError::OutOfHours => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("OUT_OF_HOURS", message),
        ),
        BookingError::SlotInPast => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("SLOT_IN_PAST", message),
        ),
        BookingError::SlotTaken { conflicting } => (
            StatusCode::CONFLICT,
            ApiError::new("SLOT_TAKEN", message)
                .with_details(format!("conflicting_booking_id={conflicting}")),
        ),
        BookingError::IllegalTransition { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("ILLEGAL_TRANSITION", message),
        ),
        BookingError::NotFound(_) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message)),
        BookingError::Forbidden => (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", message)),
        BookingError::TooLateToCancel => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("TOO_LATE_TO_CANCEL", message),
        ),
        BookingError::AlreadyRated => {
            (StatusCode::CONFLICT, ApiError::new("ALREADY_RATED", message))
        }
        BookingError::NotYetCompleted => (
            StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::new("NOT_YET_COMPLETED", message),
        ),
        BookingError::StoreUnavailable => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new("STORE_UNAVAILABLE", message),
        ),
        BookingError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("REPOSITORY_ERROR", message),
        ),
    }
}
