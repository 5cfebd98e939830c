use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery state of a queued message.
///
/// The discriminants are the integer codes stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageStatus {
    Unsent = 0,
    Failed = 1,
    Sent = 2,
}

impl MessageStatus {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unsent),
            1 => Some(Self::Failed),
            2 => Some(Self::Sent),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Unsent)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("message {0} must be provided")]
    Missing(&'static str),
}

/// A message as handed over by the ingress side, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    pub timestamp: String,
    pub chat_id: i64,
    pub username: String,
    pub contents: String,
}

impl NewMessage {
    pub fn new(
        timestamp: impl Into<String>,
        chat_id: i64,
        username: impl Into<String>,
        contents: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            chat_id,
            username: username.into(),
            contents: contents.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timestamp.is_empty() {
            return Err(ValidationError::Missing("timestamp"));
        }
        if self.chat_id == 0 {
            return Err(ValidationError::Missing("chat id"));
        }
        if self.username.is_empty() {
            return Err(ValidationError::Missing("username"));
        }
        if self.contents.is_empty() {
            return Err(ValidationError::Missing("contents"));
        }
        Ok(())
    }
}

/// A persisted message row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub timestamp: String,
    pub chat_id: i64,
    pub username: String,
    pub contents: String,
    pub status: MessageStatus,
}

impl Message {
    /// The line handed to the transport on stdin, newline included.
    pub fn payload_line(&self) -> String {
        format!("[{}] <{}> {}\n", self.timestamp, self.username, self.contents)
    }
}

/// Formats unix seconds as an RFC 3339 UTC instant, e.g. `2023-01-01T00:00:00Z`.
pub fn iso_timestamp(unix_secs: i64) -> Option<String> {
    DateTime::from_timestamp(unix_secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Picks the platform handle, falling back to first name + last name.
pub fn display_name(handle: Option<&str>, first_name: &str, last_name: Option<&str>) -> String {
    match handle {
        Some(handle) if !handle.is_empty() => handle.to_string(),
        _ => format!("{}{}", first_name, last_name.unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_the_stored_schema() {
        assert_eq!(MessageStatus::Unsent.code(), 0);
        assert_eq!(MessageStatus::Failed.code(), 1);
        assert_eq!(MessageStatus::Sent.code(), 2);
        assert_eq!(MessageStatus::from_code(2), Some(MessageStatus::Sent));
        assert_eq!(MessageStatus::from_code(7), None);
        assert!(!MessageStatus::Unsent.is_terminal());
        assert!(MessageStatus::Failed.is_terminal());
    }

    #[test]
    fn validate_rejects_each_missing_field() {
        let ok = NewMessage::new("2023-01-01T00:00:00Z", 42, "alice", "hello");
        assert!(ok.validate().is_ok());

        let cases = [
            (NewMessage { timestamp: String::new(), ..ok.clone() }, "timestamp"),
            (NewMessage { chat_id: 0, ..ok.clone() }, "chat id"),
            (NewMessage { username: String::new(), ..ok.clone() }, "username"),
            (NewMessage { contents: String::new(), ..ok.clone() }, "contents"),
        ];
        for (msg, field) in cases {
            assert_eq!(msg.validate(), Err(ValidationError::Missing(field)));
        }
    }

    #[test]
    fn negative_chat_ids_are_valid() {
        let msg = NewMessage::new("2023-01-01T00:00:00Z", -100123, "group", "hi");
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn payload_line_format() {
        let msg = Message {
            id: 1,
            timestamp: "2023-01-01T00:00:00Z".into(),
            chat_id: 42,
            username: "alice".into(),
            contents: "hello".into(),
            status: MessageStatus::Unsent,
        };
        assert_eq!(msg.payload_line(), "[2023-01-01T00:00:00Z] <alice> hello\n");
    }

    #[test]
    fn iso_timestamp_is_utc_seconds() {
        assert_eq!(iso_timestamp(1_672_531_200).as_deref(), Some("2023-01-01T00:00:00Z"));
        assert_eq!(iso_timestamp(i64::MAX), None);
    }

    #[test]
    fn display_name_falls_back_to_full_name() {
        assert_eq!(display_name(Some("alice"), "Alice", Some("Liddell")), "alice");
        assert_eq!(display_name(None, "Alice", Some("Liddell")), "AliceLiddell");
        assert_eq!(display_name(Some(""), "Alice", None), "Alice");
    }
}
