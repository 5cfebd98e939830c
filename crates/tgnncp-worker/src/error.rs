use thiserror::Error;
use tgnncp_core::ValidationError;
use tgnncp_db::DbError;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Invalid message: {0}")]
    Validation(ValidationError),

    #[error("Storage error: {0}")]
    Storage(DbError),
}

impl From<DbError> for WorkerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(e) => WorkerError::Validation(e),
            other => WorkerError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
