use tgnncp_core::NewMessage;
use tgnncp_db::QueueDb;

use crate::error::Result;

/// The ingress side's only way into the relay: durably queue one message.
#[derive(Clone)]
pub struct Submitter {
    db: QueueDb,
}

impl Submitter {
    pub fn new(db: QueueDb) -> Self {
        Self { db }
    }

    pub async fn submit(&self, timestamp: &str, chat_id: i64, username: &str, contents: &str) -> Result<i64> {
        let message = NewMessage::new(timestamp, chat_id, username, contents);
        let id = self.db.enqueue(&message).await?;
        tracing::debug!(id, chat_id, "Message queued");
        Ok(id)
    }
}
