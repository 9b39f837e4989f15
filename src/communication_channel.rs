use async_trait::async_trait;

use crate::error::ChannelError;

/// Outbound side of a messaging platform.
#[async_trait]
pub trait CommunicationChannel: Send + Sync {
    /// Sends `message` as the answer to the event that issued `reply_token`.
    async fn send_reply(&self, reply_token: &str, message: &str) -> Result<(), ChannelError>;
}
