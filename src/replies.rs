use rand::seq::SliceRandom;

pub const GREETING_REPLIES: &[&str] = &[
    "🌸 สวัสดีครับ/ค่ะ มีอะไรให้ผมช่วยคุณมั้ย?",
    "😊 สวัสดีครับ/ค่ะ ยินดีต้อนรับครับ!",
];

pub const THANKS_REPLIES: &[&str] = &[
    "😄 ด้วยความยินดีครับ/ค่ะ",
    "😊 ยินดีครับ/ค่ะ มีอะไรให้ช่วยต่อไหม?",
];

pub const BYE_REPLIES: &[&str] = &[
    "🌞 ขอให้คุณมีวันที่ดีครับ/ค่ะ แล้วเจอกันใหม่!",
    "😊 ดูแลตัวเองด้วยนะครับ/ค่ะ",
];

pub const ASK_CAUSE_PROMPTS: &[&str] = &[
    "ขอโทษครับ/ค่ะ ช่วยบอกสั้น ๆ ว่าอะไรทำให้คุณเครียดตอนนี้?",
    "ช่วยบอกหน่อยครับ/ค่ะ ปัญหาหลักของคุณคืออะไร?",
];

pub const SAFETY_MESSAGE: &str = "ผมเข้าใจว่าคุณเสียใจและกังวลมากครับ/ค่ะ
หากใครได้รับบาดเจ็บ รีบติดต่อฉุกเฉินทันที
หากมีความเสี่ยงต่อความปลอดภัย ควรติดต่อเจ้าหน้าที่
หากคุณอยากทำร้ายตัวเองหรือผู้อื่น โปรดโทรฉุกเฉินเดี๋ยวนั้นครับ/ค่ะ";

/// Sent once advice has been given and nothing else matches.
pub const CONTINUE_PROMPT: &str = "ผมยังอยู่ตรงนี้ครับ/ค่ะ เล่าเพิ่มเติมได้เลยนะครับ/ค่ะ";

/// Appended when a reply would repeat the previous one verbatim.
pub const REPEAT_SUFFIX: &str = " (ผมพร้อมฟังต่อครับ/ค่ะ)";

/// Generator answered without a usable `response` field.
pub const ADVICE_EMPTY_FALLBACK: &str = "ขอโทษครับ เกิดปัญหาในการประมวลผล";

/// Generator could not be reached or returned an error.
pub const ADVICE_APOLOGY: &str = "ขอโทษครับ เกิดข้อผิดพลาดในการประมวลผลข้อความของคุณ";

pub fn pick(pool: &[&str]) -> String {
    pool.choose(&mut rand::thread_rng())
        .map(|s| s.to_string())
        .unwrap_or_default()
}
