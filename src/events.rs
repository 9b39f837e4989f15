use serde::Deserialize;

pub const UNKNOWN_USER: &str = "unknown_user";

/// Body of a LINE webhook call.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub reply_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventMessage {
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A text message ready for the conversation flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub user_id: String,
    pub text: String,
    pub reply_token: Option<String>,
}

impl WebhookEvent {
    /// Returns the trimmed text of a text-message event; `None` for anything else.
    pub fn into_text_message(self) -> Option<InboundText> {
        if self.event_type != "message" {
            return None;
        }
        let message = self.message?;
        if message.message_type != "text" {
            return None;
        }

        Some(InboundText {
            user_id: self
                .source
                .and_then(|source| source.user_id)
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
            text: message.text.unwrap_or_default().trim().to_string(),
            reply_token: self.reply_token,
        })
    }
}
