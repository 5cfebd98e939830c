mod error;
mod models;
mod repository;
mod schema;

pub use error::DbError;
pub use repository::QueueDb;
pub use tgnncp_core::{Message, MessageStatus, NewMessage};
