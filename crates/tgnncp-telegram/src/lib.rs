mod client;
mod error;
mod ingress;
mod types;

pub use client::{BotClient, ChatApi, POLL_TIMEOUT_SECS};
pub use error::TelegramError;
pub use ingress::{Ingress, WELCOME_TEXT, to_new_message};
pub use types::{Chat, TgMessage, Update, User};
