use sqlx::PgPool;

use crate::app_error::AppError;

pub mod membership_plan;
pub mod subscription;

/// Partial unique index allowing one active item per subscription.
pub(crate) const ONE_ACTIVE_ITEM_INDEX: &str = "subscription_items_one_active_idx";

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if db_err.constraint() == Some(ONE_ACTIVE_ITEM_INDEX) {
                    tracing::error!(error = ?err, "Second active item rejected by the database");
                    AppError::Internal("Subscription already has an active item".into())
                }
                // PostgreSQL unique violation
                else if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::InvalidInput("A record with this value already exists".into())
                }
                // PostgreSQL foreign key violation
                else if msg.contains("foreign key") || msg.contains("violates foreign key") {
                    AppError::InvalidInput("Referenced record not found".into())
                }
                // PostgreSQL not-null violation
                else if msg.contains("null value") && msg.contains("violates not-null") {
                    AppError::InvalidInput("Required field is missing".into())
                } else {
                    // Log the actual error for debugging, but don't expose details
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound
        ));
    }

    #[test]
    fn pool_errors_are_hidden_behind_database_error() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        match err {
            AppError::Database(msg) => assert_eq!(msg, "Database operation failed"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
