use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TgMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TgMessage {
    pub message_id: i64,
    /// Unix seconds.
    pub date: i64,
    #[serde(default)]
    pub edit_date: Option<i64>,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_get_updates_response() {
        let body = r#"{
            "ok": true,
            "result": [
                {
                    "update_id": 10,
                    "message": {
                        "message_id": 1,
                        "date": 1672531200,
                        "chat": {"id": -1001, "type": "supergroup", "title": "mesh"},
                        "from": {"id": 7, "is_bot": false, "first_name": "Alice", "username": "alice"},
                        "text": "hello"
                    }
                },
                {"update_id": 11, "my_chat_member": {}}
            ]
        }"#;

        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
        assert!(resp.ok);
        let updates = resp.result.unwrap();
        assert_eq!(updates.len(), 2);

        let msg = updates[0].message.as_ref().unwrap();
        assert_eq!(msg.chat.id, -1001);
        assert_eq!(msg.edit_date, None);
        assert_eq!(msg.from.as_ref().unwrap().username.as_deref(), Some("alice"));
        assert!(updates[1].message.is_none());
    }

    #[test]
    fn decodes_api_error() {
        let body = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let resp: ApiResponse<User> = serde_json::from_str(body).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
    }
}
