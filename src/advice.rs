use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::AdviceError;
use crate::replies::{ADVICE_APOLOGY, ADVICE_EMPTY_FALLBACK};

const PROMPT_HEADER: &str = "คุณคือจิตแพทย์ออนไลน์
ผู้ใช้ได้ระบุปัญหาแล้ว ให้คำแนะนำเชิงปฏิบัติที่เหมาะสมและสั้น (3-5 ข้อความ)
เน้นสิ่งที่ผู้ใช้ทำได้ทันที เช่น การจัดเวลา เทคนิคการพักผ่อน วิธีผ่อนคลาย
ตอบเป็นภาษาไทยเท่านั้น
ห้ามขึ้นต้นด้วยสวัสดีหรือ emoji

บริบทผู้ใช้:
";

const PROMPT_FOOTER: &str = "\n\nให้คำแนะนำสั้น ๆ และกำลังใจสั้น ๆ";

/// Source of free-text advice for a prompt.
#[async_trait]
pub trait AdviceGenerator: Send + Sync {
    /// Returns `Ok(None)` when the service answered without any text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, AdviceError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Client for an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl OllamaClient {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            url,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl AdviceGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<Option<String>, AdviceError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdviceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response.filter(|text| !text.is_empty()))
    }
}

pub fn build_prompt(conversation: &str) -> String {
    format!("{PROMPT_HEADER}{conversation}{PROMPT_FOOTER}")
}

fn greeting_prefix() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(สวัสดี|🌸|😊|🌞)\s*").expect("greeting pattern is valid"))
}

/// Removes one leading greeting word or emoji, then trims.
pub fn strip_greeting(text: &str) -> String {
    greeting_prefix().replace(text, "").trim().to_string()
}

/// Asks the generator for advice on `conversation`.
///
/// Never fails: an empty answer, or one that is nothing but a greeting,
/// becomes [`ADVICE_EMPTY_FALLBACK`] and any
/// request error becomes [`ADVICE_APOLOGY`].
pub async fn advise(generator: &dyn AdviceGenerator, conversation: &str) -> String {
    let prompt = build_prompt(conversation);

    match generator.generate(&prompt).await {
        Ok(Some(text)) => {
            let advice = strip_greeting(&text);
            if advice.is_empty() {
                tracing::warn!("Advice generator returned only a greeting");
                return ADVICE_EMPTY_FALLBACK.to_string();
            }
            advice
        }
        Ok(None) => {
            tracing::warn!("Advice generator returned no text");
            ADVICE_EMPTY_FALLBACK.to_string()
        }
        Err(e) => {
            tracing::error!(error = %e, "Advice generator failed");
            ADVICE_APOLOGY.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Option<String>, u16>);

    #[async_trait]
    impl AdviceGenerator for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<Option<String>, AdviceError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(AdviceError::Status {
                    status: *status,
                    body: "boom".into(),
                }),
            }
        }
    }

    #[test]
    fn prompt_embeds_conversation() {
        let prompt = build_prompt("เครียดมาก\nงานเยอะ");
        assert!(prompt.starts_with("คุณคือจิตแพทย์ออนไลน์"));
        assert!(prompt.contains("บริบทผู้ใช้:\nเครียดมาก\nงานเยอะ\n\n"));
        assert!(prompt.ends_with("ให้คำแนะนำสั้น ๆ และกำลังใจสั้น ๆ"));
    }

    #[test]
    fn strips_leading_greeting_only_once() {
        assert_eq!(strip_greeting("สวัสดี ลองพักสายตา"), "ลองพักสายตา");
        assert_eq!(strip_greeting("🌸  หายใจลึก ๆ "), "หายใจลึก ๆ");
        assert_eq!(strip_greeting("😊😊 ok"), "😊 ok");
        assert_eq!(strip_greeting("ลองเดินเล่น สวัสดี"), "ลองเดินเล่น สวัสดี");
    }

    #[test]
    fn request_is_not_streamed() {
        let body = GenerateRequest {
            model: "llama3:8b",
            prompt: "p",
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "llama3:8b", "prompt": "p", "stream": false})
        );
    }

    #[test]
    fn response_without_text_field_parses() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert!(parsed.response.is_none());
    }

    #[tokio::test]
    async fn advise_uses_generator_text() {
        let generator = Fixed(Ok(Some("😊 นอนให้พอ".into())));
        assert_eq!(advise(&generator, "งานเยอะ").await, "นอนให้พอ");
    }

    #[tokio::test]
    async fn advise_falls_back_on_empty_answer() {
        let generator = Fixed(Ok(None));
        assert_eq!(advise(&generator, "x").await, ADVICE_EMPTY_FALLBACK);
    }

    #[tokio::test]
    async fn advise_falls_back_when_only_a_greeting_remains() {
        for answer in ["สวัสดี", "🌞   ", "😊\n"] {
            let generator = Fixed(Ok(Some(answer.into())));
            assert_eq!(advise(&generator, "x").await, ADVICE_EMPTY_FALLBACK, "answer: {answer:?}");
        }
    }

    #[tokio::test]
    async fn advise_apologises_on_error() {
        let generator = Fixed(Err(503));
        assert_eq!(advise(&generator, "x").await, ADVICE_APOLOGY);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let client = OllamaClient::new("http://127.0.0.1:9/api/generate".into(), "m".into(), None);
        let err = client.generate("p").await.unwrap_err();
        assert!(matches!(err, AdviceError::Transport(_)));
    }
}
