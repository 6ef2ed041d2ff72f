//! Subset of the Telegram Bot API object model used by the bot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
        }
    }
}

/// Envelope of every Bot API response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<u16>,
}

/// Status shown in the chat header while a reply is prepared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    RecordVoice,
    UploadVoice,
}

impl ChatAction {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typing => "typing",
            Self::RecordVoice => "record_voice",
            Self::UploadVoice => "upload_voice",
        }
    }
}

impl std::fmt::Display for ChatAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_text_message() {
        let json = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "from": {"id": 42, "is_bot": false, "first_name": "Лена", "language_code": "ru"},
                "chat": {"id": 42, "type": "private"},
                "date": 1700000000,
                "text": "Привет"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.from.unwrap().id, 42);
        assert_eq!(message.chat.kind, "private");
        assert_eq!(message.text.as_deref(), Some("Привет"));
        assert!(update.callback_query.is_none());
    }

    #[test]
    fn test_deserialize_callback_query() {
        let json = r#"{
            "update_id": 11,
            "callback_query": {
                "id": "cb1",
                "from": {"id": 42, "first_name": "Лена"},
                "message": {"message_id": 7, "chat": {"id": 42}},
                "data": "voice:jane"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        let query = update.callback_query.unwrap();
        assert_eq!(query.data.as_deref(), Some("voice:jane"));
        assert_eq!(query.message.unwrap().message_id, 7);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"update_id": 1, "edited_message": {"message_id": 1}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_keyboard_serialization() {
        let markup = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![InlineKeyboardButton::callback("Алёна", "voice:alena")]],
        };
        let json = serde_json::to_value(&markup).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inline_keyboard": [[{"text": "Алёна", "callback_data": "voice:alena"}]]
            })
        );
    }

    #[test]
    fn test_error_envelope() {
        let json = r#"{"ok": false, "error_code": 400, "description": "Bad Request: chat not found"}"#;
        let response: ApiResponse<Message> = serde_json::from_str(json).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(400));
    }
}
