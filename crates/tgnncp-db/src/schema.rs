pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    chat_id INTEGER NOT NULL,
    username TEXT NOT NULL,
    contents TEXT NOT NULL,
    status INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_messages_status ON messages(status);

CREATE TABLE IF NOT EXISTS welcomed_chats (
    chat_id INTEGER PRIMARY KEY NOT NULL,
    welcomed_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
"#;

pub const RESET: &str = r#"
DELETE FROM messages;
DELETE FROM welcomed_chats;
"#;
