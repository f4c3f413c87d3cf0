// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::TransitionError;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authorized, no token")]
    Unauthorized,

    #[error("Not authorized, token invalid")]
    InvalidToken,

    #[error("{0}")]
    NotFound(String),

    /// Caller lacks the role the action requires.
    #[error("{0}")]
    Forbidden(String),

    /// Action is not legal in the trip's current state.
    #[error("{0}")]
    Conflict(String),

    /// Malformed parameters.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error envelope, the failure half of `{ success, data, error, message }`.
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = ErrorResponse {
            success: false,
            error: reason.clone(),
            message: reason,
        };

        (status, Json(body)).into_response()
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let message = err.to_string();
        match err {
            TransitionError::DriverOwnTrip
            | TransitionError::CancelByNonDriver
            | TransitionError::CompleteByNonDriver
            | TransitionError::RateByNonPassenger => AppError::Forbidden(message),

            TransitionError::RatingOutOfRange => AppError::InvalidInput(message),

            TransitionError::TripInPast
            | TransitionError::NotBookable(_)
            | TransitionError::AlreadyBooked
            | TransitionError::NoSeatsLeft
            | TransitionError::BookingNotCancellable(_)
            | TransitionError::NotBooked
            | TransitionError::AlreadyTerminal(_)
            | TransitionError::CompleteTerminal(_)
            | TransitionError::RateBeforeCompletion
            | TransitionError::AlreadyRated => AppError::Conflict(message),
        }
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_errors_map_to_the_right_kind() {
        assert!(matches!(
            AppError::from(TransitionError::DriverOwnTrip),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            AppError::from(TransitionError::NoSeatsLeft),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(TransitionError::RatingOutOfRange),
            AppError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_guard_reasons_stay_specific() {
        let err = AppError::from(TransitionError::AlreadyBooked);
        assert_eq!(err.to_string(), "Already booked");

        let err = AppError::from(TransitionError::NotBookable(
            crate::models::TripStatus::Full,
        ));
        assert_eq!(err.to_string(), "Trip not bookable (status: full)");
    }
}
