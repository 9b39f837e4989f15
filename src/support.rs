use std::sync::Arc;

use chrono::Utc;
use tokio::task::{JoinError, JoinSet};

use crate::advice::AdviceGenerator;
use crate::communication_channel::CommunicationChannel;
use crate::conversation_manager::ConversationManager;
use crate::events::WebhookEvent;
use crate::sheet_logger::{ActivityLog, ActivityRow};

/// Ties the conversation flow to the outbound services.
pub struct Support {
    conversations: ConversationManager,
    communication_channel: Arc<dyn CommunicationChannel>,
    advisor: Arc<dyn AdviceGenerator>,
    activity_log: Option<Arc<dyn ActivityLog>>,
}

impl Support {
    pub fn new(
        communication_channel: Arc<dyn CommunicationChannel>,
        advisor: Arc<dyn AdviceGenerator>,
        activity_log: Option<Arc<dyn ActivityLog>>,
    ) -> Self {
        Self {
            conversations: ConversationManager::new(),
            communication_channel,
            advisor,
            activity_log,
        }
    }

    #[cfg(test)]
    pub fn conversations(&self) -> &ConversationManager {
        &self.conversations
    }

    /// Processes every event of a webhook batch concurrently.
    ///
    /// All tasks run to completion; the first task that panicked is reported.
    pub async fn handle_batch(self: &Arc<Self>, events: Vec<WebhookEvent>) -> Result<(), JoinError> {
        let mut tasks = JoinSet::new();
        for event in events {
            let support = Arc::clone(self);
            tasks.spawn(async move {
                support.handle_event(event).await;
            });
        }

        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Event task failed");
                failure.get_or_insert(e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Replies to one event. Returns the text sent, or `None` if the event was skipped.
    pub async fn handle_event(&self, event: WebhookEvent) -> Option<String> {
        let Some(inbound) = event.into_text_message() else {
            tracing::debug!("Skipping non-text event");
            return None;
        };

        tracing::info!(user = %inbound.user_id, text = %inbound.text, "Message received");

        let reply = self
            .conversations
            .respond(&inbound.user_id, &inbound.text, self.advisor.as_ref())
            .await;

        self.dispatch(inbound.reply_token.as_deref(), &reply).await;
        self.log_activity(&inbound.text, &reply);

        Some(reply)
    }

    async fn dispatch(&self, reply_token: Option<&str>, reply: &str) {
        let Some(reply_token) = reply_token else {
            tracing::warn!("Event has no reply token, reply not sent");
            return;
        };

        if let Err(why) = self
            .communication_channel
            .send_reply(reply_token, reply)
            .await
        {
            tracing::error!(error = %why, "Error sending reply");
        }
    }

    /// Spawns the spreadsheet append and returns without waiting for it.
    fn log_activity(&self, user_message: &str, reply: &str) {
        let Some(activity_log) = self.activity_log.clone() else {
            return;
        };

        let row = ActivityRow::new(Utc::now(), user_message, reply);
        tokio::spawn(async move {
            if let Err(e) = activity_log.append(&row).await {
                tracing::error!(error = %e, "Google Sheet error");
            }
        });
    }
}
