use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};

use tgnncp_core::{Message, MessageStatus, NewMessage};

use crate::error::{DbError, Result};
use crate::models::MessageRow;
use crate::schema::{RESET, SCHEMA};

/// Durable message queue backed by SQLite.
///
/// The queue is the only thing shared between the ingress side and the relay
/// loop; every coordination relies on per-statement atomicity.
#[derive(Clone)]
pub struct QueueDb {
    pool: Pool<Sqlite>,
}

impl QueueDb {
    /// Opens (creating if needed) the database file at `path` and applies the schema.
    pub async fn open(path: &str) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", path);
        let pool = SqlitePool::connect(&db_url).await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        tracing::info!("Database opened at: {}", path);

        Ok(Self { pool })
    }

    /// Private in-memory database. Limited to a single connection that never
    /// expires, otherwise every pooled connection would see its own empty database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect("sqlite::memory:")
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Drops every queued message and welcome record.
    pub async fn reset(&self) -> Result<()> {
        sqlx::raw_sql(RESET).execute(&self.pool).await?;
        tracing::info!("Database reset");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn enqueue(&self, message: &NewMessage) -> Result<i64> {
        message.validate()?;

        let result = sqlx::query(
            "INSERT INTO messages (timestamp, chat_id, username, contents, status) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&message.timestamp)
        .bind(message.chat_id)
        .bind(&message.username)
        .bind(&message.contents)
        .bind(MessageStatus::Unsent.code())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Snapshot of every unsent message in insertion order.
    pub async fn fetch_pending(&self) -> Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT rowid AS id, timestamp, chat_id, username, contents, status FROM messages WHERE status = ? ORDER BY rowid ASC",
        )
        .bind(MessageStatus::Unsent.code())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Message::try_from).collect()
    }

    /// Applies each status update on its own. A failed update is logged and
    /// skipped; the rest of the batch still goes through.
    ///
    /// Only unsent rows are touched, so a finalized status is never overwritten.
    /// Returns how many rows were actually updated.
    pub async fn apply_status_updates(&self, updates: &[(i64, MessageStatus)]) -> usize {
        let mut applied = 0;

        for &(id, status) in updates {
            tracing::debug!(id, status = ?status, "Updating message status");

            match self.set_status(id, status).await {
                Ok(true) => applied += 1,
                Ok(false) => {
                    tracing::warn!(id, status = ?status, "Message missing or already finalized, status not updated");
                }
                Err(e) => {
                    tracing::error!(id, error = %e, "Error updating message status");
                }
            }
        }

        applied
    }

    async fn set_status(&self, id: i64, status: MessageStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE messages SET status = ? WHERE rowid = ? AND status = ?")
            .bind(status.code())
            .bind(id)
            .bind(MessageStatus::Unsent.code())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn get_message(&self, id: i64) -> Result<Message> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT rowid AS id, timestamp, chat_id, username, contents, status FROM messages WHERE rowid = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::MessageNotFound(id))?;

        Message::try_from(row)
    }

    pub async fn count_by_status(&self, status: MessageStatus) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE status = ?")
            .bind(status.code())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Records that `chat_id` got its welcome reply. Returns `true` the first time.
    pub async fn mark_welcomed(&self, chat_id: i64) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO welcomed_chats (chat_id) VALUES (?)")
            .bind(chat_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn is_welcomed(&self, chat_id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT chat_id FROM welcomed_chats WHERE chat_id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(chat_id: i64, contents: &str) -> NewMessage {
        NewMessage::new("2023-01-01T00:00:00Z", chat_id, "alice", contents)
    }

    #[tokio::test]
    async fn enqueue_returns_id_of_unsent_row() {
        let db = QueueDb::open_in_memory().await.unwrap();

        let id = db.enqueue(&sample(42, "hello")).await.unwrap();
        let msg = db.get_message(id).await.unwrap();

        assert_eq!(msg.id, id);
        assert_eq!(msg.chat_id, 42);
        assert_eq!(msg.username, "alice");
        assert_eq!(msg.contents, "hello");
        assert_eq!(msg.status, MessageStatus::Unsent);
    }

    #[tokio::test]
    async fn enqueue_rejects_missing_fields_without_persisting() {
        let db = QueueDb::open_in_memory().await.unwrap();
        let ok = sample(42, "hello");

        let invalid = [
            NewMessage { timestamp: String::new(), ..ok.clone() },
            NewMessage { chat_id: 0, ..ok.clone() },
            NewMessage { username: String::new(), ..ok.clone() },
            NewMessage { contents: String::new(), ..ok.clone() },
        ];

        for msg in &invalid {
            let err = db.enqueue(msg).await.unwrap_err();
            assert!(err.is_validation(), "unexpected error: {err}");
        }

        assert_eq!(db.count_by_status(MessageStatus::Unsent).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fetch_pending_only_returns_unsent_in_id_order() {
        let db = QueueDb::open_in_memory().await.unwrap();

        let first = db.enqueue(&sample(1, "one")).await.unwrap();
        let second = db.enqueue(&sample(-2, "two")).await.unwrap();
        let third = db.enqueue(&sample(3, "three")).await.unwrap();

        db.apply_status_updates(&[(second, MessageStatus::Sent)]).await;

        let pending = db.fetch_pending().await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first, third]);
        assert!(pending.iter().all(|m| m.status == MessageStatus::Unsent));
    }

    #[tokio::test]
    async fn status_updates_are_independent_and_final() {
        let db = QueueDb::open_in_memory().await.unwrap();

        let a = db.enqueue(&sample(1, "a")).await.unwrap();
        let b = db.enqueue(&sample(1, "b")).await.unwrap();
        db.apply_status_updates(&[(a, MessageStatus::Failed)]).await;

        // `a` is already final and 999 does not exist; `b` must still be applied.
        let applied = db
            .apply_status_updates(&[(a, MessageStatus::Sent), (999, MessageStatus::Sent), (b, MessageStatus::Sent)])
            .await;

        assert_eq!(applied, 1);
        assert_eq!(db.get_message(a).await.unwrap().status, MessageStatus::Failed);
        assert_eq!(db.get_message(b).await.unwrap().status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn closed_pool_surfaces_storage_errors() {
        let db = QueueDb::open_in_memory().await.unwrap();
        db.close().await;

        let err = db.enqueue(&sample(1, "lost")).await.unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)));
        assert!(db.fetch_pending().await.is_err());
    }

    #[tokio::test]
    async fn missing_message_lookup() {
        let db = QueueDb::open_in_memory().await.unwrap();
        assert!(matches!(db.get_message(7).await, Err(DbError::MessageNotFound(7))));
    }

    #[tokio::test]
    async fn file_database_survives_reopen_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.db");
        let path = path.to_str().unwrap();

        let id = {
            let db = QueueDb::open(path).await.unwrap();
            let id = db.enqueue(&sample(9, "persisted")).await.unwrap();
            assert!(db.mark_welcomed(9).await.unwrap());
            db.close().await;
            id
        };

        let db = QueueDb::open(path).await.unwrap();
        assert_eq!(db.get_message(id).await.unwrap().contents, "persisted");
        assert!(db.is_welcomed(9).await.unwrap());

        db.reset().await.unwrap();
        assert!(db.fetch_pending().await.unwrap().is_empty());
        assert!(!db.is_welcomed(9).await.unwrap());

        // ids are never handed out twice, even after a reset
        let next = db.enqueue(&sample(9, "again")).await.unwrap();
        assert!(next > id);
    }

    #[tokio::test]
    async fn works_with_tables_created_without_id_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");
        let path = path.to_str().unwrap();

        let legacy = SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path)).await.unwrap();
        sqlx::raw_sql(
            "CREATE TABLE messages (timestamp TEXT, chat_id INTEGER, username TEXT, contents TEXT, status INTEGER);
             INSERT INTO messages VALUES ('2023-01-01T00:00:00Z', -5, 'bob', 'old', 0);",
        )
        .execute(&legacy)
        .await
        .unwrap();
        legacy.close().await;

        let db = QueueDb::open(path).await.unwrap();
        let id = db.enqueue(&sample(6, "new")).await.unwrap();

        let pending = db.fetch_pending().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].contents, "old");
        assert_eq!(pending[1].id, id);

        assert_eq!(db.apply_status_updates(&[(pending[0].id, MessageStatus::Sent)]).await, 1);
        assert_eq!(db.get_message(pending[0].id).await.unwrap().status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn welcome_is_recorded_once() {
        let db = QueueDb::open_in_memory().await.unwrap();

        assert!(!db.is_welcomed(-100).await.unwrap());
        assert!(db.mark_welcomed(-100).await.unwrap());
        assert!(!db.mark_welcomed(-100).await.unwrap());
        assert!(db.is_welcomed(-100).await.unwrap());
    }
}
