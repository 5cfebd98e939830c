use tgnncp_core::{Message, MessageStatus};

use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct MessageRow {
    pub id: i64,
    pub timestamp: String,
    pub chat_id: i64,
    pub username: String,
    pub contents: String,
    pub status: i64,
}

impl TryFrom<MessageRow> for Message {
    type Error = DbError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let status = MessageStatus::from_code(row.status).ok_or(DbError::UnknownStatus {
            id: row.id,
            code: row.status,
        })?;

        Ok(Message {
            id: row.id,
            timestamp: row.timestamp,
            chat_id: row.chat_id,
            username: row.username,
            contents: row.contents,
            status,
        })
    }
}
