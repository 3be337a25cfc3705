use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Unified error type for room operations
#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Salle introuvable: {room_id}")]
    NotFound { room_id: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Storage operation failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for room operations
pub type RoomResult<T> = Result<T, RoomError>;

impl RoomError {
    pub fn not_found(room_id: impl Into<String>) -> Self {
        Self::NotFound {
            room_id: room_id.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Serialization(_))
    }
}

impl ResponseError for RoomError {
    fn status_code(&self) -> StatusCode {
        match self {
            RoomError::NotFound { .. } => StatusCode::NOT_FOUND,
            RoomError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
