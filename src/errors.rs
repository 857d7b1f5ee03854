use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error body mirrored on every failed request: the same status /
/// message / data envelope the success path uses, with `data` absent.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// An order, item, table, menu item, waiter or category id that does
    /// not resolve to a stored record.
    #[error("{0}")]
    InvalidReference(String),

    /// The referenced records exist but are not in a state that permits
    /// the operation (occupied table, inactive menu item, unserved items
    /// at payment, overlapping discount window).
    #[error("{0}")]
    PreconditionFailed(String),

    /// The requested transition is not in the state machine's table.
    #[error("{0}")]
    InvalidState(String),

    /// Malformed request input.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The record store rejected a read or write.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(#[from] sea_orm::error::DbErr),

    /// A queue snapshot could not be encoded or decoded. During queue
    /// reads this is swallowed per entry and logged; anywhere else it
    /// aborts the operation.
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// The preparation queue backend is unavailable.
    #[error("Queue failure: {0}")]
    QueueFailure(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidReference(_) => StatusCode::NOT_FOUND,
            Self::PreconditionFailed(_) | Self::InvalidState(_) | Self::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::PersistenceFailure(_) | Self::SerializationFailure(_) | Self::QueueFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message carried to the client. Internal failures return a generic
    /// message so store and queue details never leak.
    pub fn response_message(&self) -> String {
        match self {
            Self::PersistenceFailure(_) | Self::SerializationFailure(_) | Self::QueueFailure(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status: status.as_u16(),
            message: self.response_message(),
        };
        (status, Json(body)).into_response()
    }
}
