use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::communication_channel::CommunicationChannel;
use crate::error::ChannelError;

const LINE_REPLY_URL: &str = "https://api.line.me/v2/bot/message/reply";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [TextMessage<'a>; 1],
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

/// LINE Messaging API reply client.
pub struct LineManager {
    client: Client,
    access_token: String,
    reply_url: String,
}

impl LineManager {
    pub fn new(access_token: String) -> Self {
        Self::with_reply_url(access_token, LINE_REPLY_URL.to_string())
    }

    pub fn with_reply_url(access_token: String, reply_url: String) -> Self {
        LineManager {
            client: Client::new(),
            access_token,
            reply_url,
        }
    }
}

#[async_trait]
impl CommunicationChannel for LineManager {
    async fn send_reply(&self, reply_token: &str, message: &str) -> Result<(), ChannelError> {
        let body = ReplyRequest {
            reply_token,
            messages: [TextMessage {
                kind: "text",
                text: message,
            }],
        };

        let response = self
            .client
            .post(&self.reply_url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        // Expired or reused reply tokens land here as 400s.
        let body = response.text().await.unwrap_or_default();
        Err(ChannelError::Api {
            status: status.as_u16(),
            body,
        })
    }
}
