use serde::{Deserialize, Serialize};

/// A message to deliver through the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Platform-specific delivery target (e.g. Telegram chat_id).
    pub chat_id: i64,
    pub text: String,
    /// Markup dialect of `text` (e.g. "HTML").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

impl OutgoingMessage {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn with_parse_mode(mut self, parse_mode: impl Into<String>) -> Self {
        self.parse_mode = Some(parse_mode.into());
        self
    }

    /// Same content addressed to another chat.
    pub fn for_recipient(&self, chat_id: i64) -> Self {
        Self {
            chat_id,
            ..self.clone()
        }
    }
}
