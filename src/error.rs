use thiserror::Error as ThisError;

/// Failure taxonomy shared by the game engine, the stores and the services.
#[derive(Debug, ThisError)]
pub enum GameError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Transaction failure: {0}")]
    TransactionFailure(String),
}

impl GameError {
    pub fn validation(message: impl Into<String>) -> Self {
        GameError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        GameError::NotFound(message.into())
    }

    pub fn consistency(message: impl Into<String>) -> Self {
        GameError::Consistency(message.into())
    }
}

impl From<sqlx::Error> for GameError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => GameError::NotFound("Requested row does not exist".into()),
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                GameError::Validation(format!("Duplicate entry: {}", db_error.message()))
            }
            sqlx::Error::Database(db_error) if db_error.is_foreign_key_violation() => {
                GameError::NotFound(format!("Referenced entity missing: {}", db_error.message()))
            }
            _ => GameError::TransactionFailure(error.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for GameError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        GameError::TransactionFailure(format!("Migration failed: {error}"))
    }
}
