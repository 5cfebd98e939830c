use thiserror::Error;
use uuid::Uuid;

/// Path prefix under which every relayed chat lands on the peer node.
pub const CHAT_DIR: &str = "tgchat";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("could not generate unique suffix: {0}")]
    Suffix(String),
}

/// Source of the per-attempt unique suffix.
pub type SuffixGenerator = fn() -> Result<String, AddressError>;

pub fn random_suffix() -> Result<String, AddressError> {
    Ok(Uuid::new_v4().hyphenated().to_string())
}

/// Builds `<node>:tgchat/<abs(chat_id)>/<timestamp>[-<suffix>].txt`.
pub fn destination_address(node: &str, chat_id: i64, timestamp: &str, suffix: Option<&str>) -> String {
    let mut dest = format!("{}:{}/{}/{}", node, CHAT_DIR, chat_id.unsigned_abs(), timestamp);
    if let Some(suffix) = suffix {
        dest.push('-');
        dest.push_str(suffix);
    }
    dest.push_str(".txt");
    dest
}
