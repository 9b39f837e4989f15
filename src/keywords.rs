//! Keyword classification of inbound messages.
//!
//! Matching is plain case-sensitive substring containment. The first
//! category in precedence order wins. [`classify`] ranks
//! distress > greeting > thanks > bye > stress cause > none;
//! [`reply_category`] answers small talk before distress.

const DISTRESS_KEYWORDS: &[&str] = &["ตบ", "ตี", "ทำร้าย"];
const GREETING_KEYWORDS: &[&str] = &["สวัสดี", "hi", "hello"];
const THANKS_KEYWORDS: &[&str] = &["ขอบคุณ", "thanks"];
const BYE_KEYWORDS: &[&str] = &["ลาก่อน", "bye"];
const STRESS_CAUSE_KEYWORDS: &[&str] = &["เครียด", "เรียนหนัก", "การบ้าน", "งานเยอะ", "นอนไม่พอ"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Distress,
    Greeting,
    Thanks,
    Bye,
    StressCause,
    None,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Distress => "distress",
            Category::Greeting => "greeting",
            Category::Thanks => "thanks",
            Category::Bye => "bye",
            Category::StressCause => "stress_cause",
            Category::None => "none",
        }
    }
}

type Precedence = &'static [(Category, &'static [&'static str])];

const PRECEDENCE: Precedence = &[
    (Category::Distress, DISTRESS_KEYWORDS),
    (Category::Greeting, GREETING_KEYWORDS),
    (Category::Thanks, THANKS_KEYWORDS),
    (Category::Bye, BYE_KEYWORDS),
    (Category::StressCause, STRESS_CAUSE_KEYWORDS),
];

const REPLY_PRECEDENCE: Precedence = &[
    (Category::Greeting, GREETING_KEYWORDS),
    (Category::Thanks, THANKS_KEYWORDS),
    (Category::Bye, BYE_KEYWORDS),
    (Category::Distress, DISTRESS_KEYWORDS),
    (Category::StressCause, STRESS_CAUSE_KEYWORDS),
];

fn first_match(precedence: Precedence, message: &str) -> Category {
    precedence
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| message.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::None)
}

/// The message's category, most severe first.
pub fn classify(message: &str) -> Category {
    first_match(PRECEDENCE, message)
}

/// The category that picks the reply: greeting, thanks and bye are answered
/// even when the message also carries a distress keyword.
pub fn reply_category(message: &str) -> Category {
    first_match(REPLY_PRECEDENCE, message)
}
