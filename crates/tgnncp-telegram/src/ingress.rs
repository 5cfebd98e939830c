use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use tgnncp_core::{NewMessage, display_name, iso_timestamp};
use tgnncp_db::QueueDb;
use tgnncp_worker::Submitter;

use crate::client::ChatApi;
use crate::types::{TgMessage, Update};

pub const WELCOME_TEXT: &str = "Hi! I'm an NNCP relay bot!";

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Normalizes a Telegram message into a queue record.
///
/// The edit time wins over the send time. Missing text or sender yield empty
/// fields, which the queue then rejects.
pub fn to_new_message(message: &TgMessage) -> NewMessage {
    let unix = match message.edit_date {
        Some(edited) if edited != 0 => edited,
        _ => message.date,
    };
    let timestamp = iso_timestamp(unix).unwrap_or_default();

    let username = message
        .from
        .as_ref()
        .map(|user| display_name(user.username.as_deref(), &user.first_name, user.last_name.as_deref()))
        .unwrap_or_default();

    NewMessage::new(
        timestamp,
        message.chat.id,
        username,
        message.text.clone().unwrap_or_default(),
    )
}

/// Polls the bot for updates and queues every incoming message.
pub struct Ingress {
    api: Arc<dyn ChatApi>,
    db: QueueDb,
    submitter: Submitter,
    bot_debug: bool,
}

impl Ingress {
    pub fn new(api: Arc<dyn ChatApi>, db: QueueDb, bot_debug: bool) -> Self {
        let submitter = Submitter::new(db.clone());
        Self {
            api,
            db,
            submitter,
            bot_debug,
        }
    }

    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut offset = 0;

        while !*shutdown.borrow() {
            tokio::select! {
                _ = shutdown.changed() => {}
                result = self.api.get_updates(offset) => match result {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            self.handle_update(update).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Could not fetch Telegram updates, retrying");
                        tokio::select! {
                            _ = shutdown.changed() => {}
                            _ = tokio::time::sleep(RETRY_DELAY) => {}
                        }
                    }
                },
            }

            if shutdown.has_changed().is_err() {
                break;
            }
        }

        tracing::info!("Telegram ingress stopped");
    }

    pub async fn handle_update(&self, update: Update) {
        if self.bot_debug {
            tracing::debug!(?update, "Telegram update");
        }

        // only plain messages are relayed
        let Some(message) = update.message else {
            return;
        };

        self.welcome(message.chat.id).await;

        let record = to_new_message(&message);
        tracing::info!(
            chat_id = record.chat_id,
            username = %record.username,
            "{}",
            record.contents
        );

        if let Err(e) = self
            .submitter
            .submit(&record.timestamp, record.chat_id, &record.username, &record.contents)
            .await
        {
            tracing::error!(chat_id = record.chat_id, error = %e, "Error inserting message to database");
        }
    }

    async fn welcome(&self, chat_id: i64) {
        match self.db.mark_welcomed(chat_id).await {
            Ok(true) => {
                tracing::debug!(chat_id, "Encountered previously unseen chat");
                if let Err(e) = self.api.send_message(chat_id, WELCOME_TEXT).await {
                    tracing::warn!(chat_id, error = %e, "Could not send welcome message");
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "Could not record welcomed chat");
            }
        }
    }
}
