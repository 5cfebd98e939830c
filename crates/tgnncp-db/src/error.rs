use thiserror::Error;
use tgnncp_core::ValidationError;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Invalid message: {0}")]
    Validation(#[from] ValidationError),

    #[error("Message not found: {0}")]
    MessageNotFound(i64),

    #[error("Message {id} has unknown status code {code}")]
    UnknownStatus { id: i64, code: i64 },
}

impl DbError {
    pub fn is_validation(&self) -> bool {
        matches!(self, DbError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
