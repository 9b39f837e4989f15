use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;

use crate::advice::{advise, AdviceGenerator};
use crate::keywords::{classify, reply_category, Category};
use crate::replies::{
    pick, ASK_CAUSE_PROMPTS, BYE_REPLIES, CONTINUE_PROMPT, GREETING_REPLIES, REPEAT_SUFFIX,
    SAFETY_MESSAGE, THANKS_REPLIES,
};

/// Everything remembered about one user for the lifetime of the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationRecord {
    /// Every message from the user, newline-joined.
    pub accumulated_text: String,
    pub cause_collected: bool,
    pub last_reply: String,
    pub advice_given: bool,
    pub flagged_serious: bool,
}

/// Where a user stands in the ask-cause / advise progression.
///
/// Derived from the record's flags; `flagged_serious` is tracked alongside
/// and does not change the stage on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStage {
    Fresh,
    AwaitingCause,
    Advised,
}

/// What to do with one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Greet,
    Thank,
    Farewell,
    Safety,
    AskCause,
    SeekAdvice,
    /// Advice was already given and nothing else matched.
    Continue,
}

impl ConversationRecord {
    pub fn stage(&self) -> ConversationStage {
        match (self.cause_collected, self.advice_given) {
            (false, _) => ConversationStage::Fresh,
            (true, false) => ConversationStage::AwaitingCause,
            (true, true) => ConversationStage::Advised,
        }
    }

    fn remember(&mut self, message: &str) {
        if !self.accumulated_text.is_empty() {
            self.accumulated_text.push('\n');
        }
        self.accumulated_text.push_str(message);
    }

    /// Applies repeat suppression and records the text about to be sent.
    fn settle_reply(&mut self, resolved: String) -> String {
        let mut reply = resolved;
        if reply == self.last_reply {
            reply.push_str(REPEAT_SUFFIX);
        }
        self.last_reply.clone_from(&reply);
        reply
    }
}

/// Transition table: reply category first, then the user's stage.
///
/// `category` comes from [`reply_category`], so small talk is answered ahead
/// of the safety message.
pub fn next_action(stage: ConversationStage, category: Category) -> Action {
    match (category, stage) {
        (Category::Greeting, _) => Action::Greet,
        (Category::Thanks, _) => Action::Thank,
        (Category::Bye, _) => Action::Farewell,
        (Category::Distress, _) => Action::Safety,
        (Category::StressCause | Category::None, ConversationStage::Fresh) => Action::AskCause,
        (Category::StressCause | Category::None, ConversationStage::AwaitingCause) => {
            Action::SeekAdvice
        }
        (Category::StressCause | Category::None, ConversationStage::Advised) => Action::Continue,
    }
}

/// Per-user conversation records.
///
/// Each record sits behind its own async lock, held for the whole of
/// [`ConversationManager::respond`], so messages from one user are resolved
/// one at a time while different users proceed in parallel.
#[derive(Default)]
pub struct ConversationManager {
    conversations: Mutex<HashMap<String, Arc<AsyncMutex<ConversationRecord>>>>,
}

impl ConversationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, user_id: &str) -> Arc<AsyncMutex<ConversationRecord>> {
        let mut conversations = self
            .conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        conversations
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    #[cfg(test)]
    pub async fn snapshot(&self, user_id: &str) -> Option<ConversationRecord> {
        let entry = {
            let conversations = self
                .conversations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            conversations.get(user_id).cloned()
        }?;
        let record = entry.lock().await;
        Some(record.clone())
    }

    /// Resolves the reply for `message` and updates the user's record.
    pub async fn respond(
        &self,
        user_id: &str,
        message: &str,
        advisor: &dyn AdviceGenerator,
    ) -> String {
        let entry = self.get_or_create(user_id);
        let mut record = entry.lock().await;

        record.remember(message);
        let category = classify(message);
        let stage = record.stage();
        let action = next_action(stage, reply_category(message));

        tracing::debug!(
            user = %user_id,
            category = category.as_str(),
            ?stage,
            flagged = record.flagged_serious,
            ?action,
            "Resolved conversation action"
        );

        let resolved = match action {
            Action::Greet => pick(GREETING_REPLIES),
            Action::Thank => pick(THANKS_REPLIES),
            Action::Farewell => pick(BYE_REPLIES),
            Action::Safety => {
                tracing::warn!(user = %user_id, "Distress keyword detected");
                record.flagged_serious = true;
                record.advice_given = true;
                SAFETY_MESSAGE.to_string()
            }
            Action::AskCause => {
                record.cause_collected = true;
                pick(ASK_CAUSE_PROMPTS)
            }
            Action::SeekAdvice => {
                let advice = advise(advisor, &record.accumulated_text).await;
                // Set even when the generator failed; advice is not retried.
                record.advice_given = true;
                advice
            }
            Action::Continue => CONTINUE_PROMPT.to_string(),
        };

        record.settle_reply(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdviceError;
    use crate::replies::{ADVICE_APOLOGY, SAFETY_MESSAGE};
    use async_trait::async_trait;

    struct Unreachable;

    #[async_trait]
    impl AdviceGenerator for Unreachable {
        async fn generate(&self, _prompt: &str) -> Result<Option<String>, AdviceError> {
            Err(AdviceError::Status {
                status: 502,
                body: String::new(),
            })
        }
    }

    struct Echo;

    #[async_trait]
    impl AdviceGenerator for Echo {
        async fn generate(&self, _prompt: &str) -> Result<Option<String>, AdviceError> {
            Ok(Some("พักสักครู่".to_string()))
        }
    }

    #[test]
    fn transition_table() {
        use Action::*;
        use ConversationStage::*;

        let cases = vec![
            (Fresh, Category::Greeting, Greet),
            (Advised, Category::Thanks, Thank),
            (AwaitingCause, Category::Bye, Farewell),
            (Fresh, Category::Distress, Safety),
            (Advised, Category::Distress, Safety),
            (Fresh, Category::None, AskCause),
            (Fresh, Category::StressCause, AskCause),
            (AwaitingCause, Category::None, SeekAdvice),
            (AwaitingCause, Category::StressCause, SeekAdvice),
            (Advised, Category::None, Continue),
        ];

        for (stage, category, expected) in cases {
            assert_eq!(next_action(stage, category), expected, "{stage:?} + {category:?}");
        }
    }

    #[test]
    fn stage_follows_flags() {
        let mut record = ConversationRecord::default();
        assert_eq!(record.stage(), ConversationStage::Fresh);

        // Flagged users who never gave a cause are still asked for one.
        record.advice_given = true;
        assert_eq!(record.stage(), ConversationStage::Fresh);

        record.advice_given = false;
        record.cause_collected = true;
        assert_eq!(record.stage(), ConversationStage::AwaitingCause);

        record.advice_given = true;
        assert_eq!(record.stage(), ConversationStage::Advised);
    }

    #[test]
    fn repeated_reply_gets_suffix() {
        let mut record = ConversationRecord::default();
        assert_eq!(record.settle_reply("a".into()), "a");
        let second = record.settle_reply("a".into());
        assert_eq!(second, format!("a{REPEAT_SUFFIX}"));
        assert_eq!(record.last_reply, second);
        // The suffixed text is now the one to compare against.
        assert_eq!(record.settle_reply("a".into()), "a");
    }

    #[tokio::test]
    async fn record_created_lazily_with_defaults() {
        let manager = ConversationManager::new();
        assert!(manager.snapshot("u1").await.is_none());

        manager.get_or_create("u1");
        assert_eq!(
            manager.snapshot("u1").await,
            Some(ConversationRecord::default())
        );
    }

    #[tokio::test]
    async fn messages_accumulate_newline_joined() {
        let manager = ConversationManager::new();
        manager.respond("u1", "สวัสดี", &Echo).await;
        manager.respond("u1", "เครียดมาก", &Echo).await;

        let record = manager.snapshot("u1").await.unwrap();
        assert_eq!(record.accumulated_text, "สวัสดี\nเครียดมาก");
    }

    #[tokio::test]
    async fn distress_sets_flags_from_any_state() {
        let manager = ConversationManager::new();
        let reply = manager.respond("u1", "เขาตบผม", &Echo).await;

        assert_eq!(reply, SAFETY_MESSAGE);
        let record = manager.snapshot("u1").await.unwrap();
        assert!(record.flagged_serious);
        assert!(record.advice_given);
        assert!(!record.cause_collected);
    }

    #[tokio::test]
    async fn greeting_with_distress_word_is_answered_as_greeting() {
        let manager = ConversationManager::new();
        let reply = manager.respond("u1", "สวัสดี เขาทำร้ายผม", &Echo).await;

        assert!(GREETING_REPLIES.contains(&reply.as_str()));
        let record = manager.snapshot("u1").await.unwrap();
        assert!(!record.flagged_serious);
        assert!(!record.advice_given);
    }

    #[tokio::test]
    async fn generator_failure_still_marks_advice_given() {
        let manager = ConversationManager::new();
        manager.respond("u1", "เหนื่อย", &Unreachable).await;
        let reply = manager.respond("u1", "งานเยอะ", &Unreachable).await;

        assert_eq!(reply, ADVICE_APOLOGY);
        let record = manager.snapshot("u1").await.unwrap();
        assert!(record.advice_given);

        // No retry: the next plain message continues instead.
        let next = manager.respond("u1", "ยังเหนื่อย", &Unreachable).await;
        assert_eq!(next, CONTINUE_PROMPT);
    }

    #[tokio::test]
    async fn continue_prompt_is_suffixed_when_repeated() {
        let manager = ConversationManager::new();
        for message in ["a", "b"] {
            manager.respond("u1", message, &Echo).await;
        }
        assert_eq!(manager.respond("u1", "c", &Echo).await, CONTINUE_PROMPT);
        assert_eq!(
            manager.respond("u1", "d", &Echo).await,
            format!("{CONTINUE_PROMPT}{REPEAT_SUFFIX}")
        );
    }

    #[tokio::test]
    async fn users_are_independent() {
        let manager = ConversationManager::new();
        manager.respond("u1", "เหนื่อย", &Echo).await;
        let reply = manager.respond("u2", "เหนื่อย", &Echo).await;

        assert!(ASK_CAUSE_PROMPTS.contains(&reply.as_str()));
        assert!(manager.snapshot("u1").await.unwrap().cause_collected);
    }
}
