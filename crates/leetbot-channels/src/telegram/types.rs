//! Telegram Bot API response envelope.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TgResponse {
    pub ok: bool,
    pub description: Option<String>,
}
