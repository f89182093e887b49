use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::state_machine::InvalidTransition};

/// Errors that can occur in room coordinator operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing required input (e.g. blank player name).
    #[error("validation failed: {0}")]
    Validation(String),
    /// Requested question count outside `1..=available`.
    #[error("question count {requested} out of range (1..={available})")]
    InvalidCount {
        /// Count asked for by the client.
        requested: usize,
        /// Number of questions in the bank.
        available: usize,
    },
    /// Referenced room id has no live room.
    #[error("room `{0}` not found")]
    RoomNotFound(String),
    /// Join attempted while the room is at capacity.
    #[error("room `{room_id}` is full ({capacity} players)")]
    RoomFull {
        /// Room that rejected the join.
        room_id: String,
        /// Configured capacity.
        capacity: usize,
    },
    /// Referenced player is not part of the room.
    #[error("player `{player_id}` not found in room `{room_id}`")]
    PlayerNotFound {
        /// Room that was searched.
        room_id: String,
        /// Unknown player id.
        player_id: String,
    },
    /// A non-host attempted a host-only action.
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    /// Answers submitted before the host started the game.
    #[error("game in room `{0}` has not started")]
    GameNotStarted(String),
    /// Results requested before every player submitted.
    #[error("room `{0}` has not finished yet")]
    NotFinished(String),
    /// The room state machine rejected a transition.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    /// Too many concurrent writers raced on the same room.
    #[error("room is under heavy contention; retry later")]
    Contention,
    /// No free room code could be found.
    #[error("could not allocate a free room code")]
    RoomCodesExhausted,
    /// Room store backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Operation exceeded its timeout limit.
    #[error("operation timed out")]
    Timeout,
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller is not allowed to perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::Validation(_) | ServiceError::InvalidCount { .. } => {
                AppError::BadRequest(message)
            }
            ServiceError::RoomNotFound(_) | ServiceError::PlayerNotFound { .. } => {
                AppError::NotFound(message)
            }
            ServiceError::RoomFull { .. }
            | ServiceError::GameNotStarted(_)
            | ServiceError::NotFinished(_)
            | ServiceError::InvalidTransition(_) => AppError::Conflict(message),
            ServiceError::NotAuthorized(_) => AppError::Forbidden(message),
            ServiceError::Contention
            | ServiceError::Unavailable(_)
            | ServiceError::Timeout => AppError::ServiceUnavailable(message),
            ServiceError::RoomCodesExhausted => AppError::Internal(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
