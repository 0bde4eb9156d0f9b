use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seatline_core::CoreError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    /// Seat already reserved; clients should pick another seat.
    SeatTakenError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::SeatTakenError(msg) => (StatusCode::CONFLICT, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Invalid(_) => AppError::ValidationError(message),
            CoreError::NotFound(_) => AppError::NotFoundError(message),
            CoreError::SeatTaken { .. } => AppError::SeatTakenError(message),
            CoreError::Conflict(_) => AppError::ConflictError(message),
            CoreError::Storage(_) | CoreError::Internal(_) => AppError::InternalServerError(message),
        }
    }
}
