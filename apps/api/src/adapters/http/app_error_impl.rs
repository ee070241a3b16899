use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error before it gets converted into a status response.
        match &self {
            AppError::Database(_) | AppError::Internal(_) | AppError::InvariantViolation(_) => {
                tracing::error!(error = ?self, "Request failed");
            }
            _ => tracing::debug!(error = ?self, "Request rejected"),
        }

        match self {
            AppError::Database(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DatabaseError, None)
            }
            AppError::InvalidCredentials => {
                error_resp(StatusCode::UNAUTHORIZED, ErrorCode::InvalidCredentials, None)
            }
            AppError::Forbidden => error_resp(StatusCode::FORBIDDEN, ErrorCode::Forbidden, None),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::InvariantViolation(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InvariantViolation,
                None,
            ),
            AppError::Cancelled => error_resp(StatusCode::CONFLICT, ErrorCode::Cancelled, None),
            AppError::PartialBatch { added, source } => {
                let body = serde_json::json!({
                    "code": ErrorCode::PartialBatch.as_str(),
                    "message": source.to_string(),
                    "added": added,
                });
                (StatusCode::CONFLICT, Json(body)).into_response()
            }
            AppError::Internal(_) => {
                error_resp(StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::InternalError, None)
            }
        }
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
