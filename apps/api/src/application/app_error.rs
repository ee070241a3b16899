pub use gymflow_types::ErrorCode;
use thiserror::Error;

use crate::domain::entitlement::EntitlementError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found")]
    NotFound,

    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] EntitlementError),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Batch stopped after {added} item(s): {source}")]
    PartialBatch {
        added: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::InvariantViolation(_) => ErrorCode::InvariantViolation,
            AppError::Cancelled => ErrorCode::Cancelled,
            AppError::PartialBatch { .. } => ErrorCode::PartialBatch,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn test_entitlement_error_converts_to_invariant_violation() {
        let err: AppError = EntitlementError::MultipleActiveItems(vec![Uuid::nil()]).into();
        assert!(matches!(err, AppError::InvariantViolation(_)));
        assert_eq!(err.code(), ErrorCode::InvariantViolation);
    }

    #[test]
    fn test_partial_batch_message_includes_cause() {
        let err = AppError::PartialBatch {
            added: 2,
            source: Box::new(AppError::NotFound),
        };
        assert_eq!(err.to_string(), "Batch stopped after 2 item(s): Not found");
        assert_eq!(err.code(), ErrorCode::PartialBatch);
    }
}
