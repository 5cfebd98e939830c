use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("Database error: {0}")]
    Db(#[from] tgnncp_db::DbError),
}

pub type Result<T> = std::result::Result<T, TelegramError>;
