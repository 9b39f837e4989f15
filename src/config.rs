use std::env;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3:8b";
pub const DEFAULT_SHEET_RANGE: &str = "Sheet1!A1";

/// Service-account credentials for the activity spreadsheet.
#[derive(Debug, Clone)]
pub struct SheetCredentials {
    pub service_account_email: String,
    pub private_key: String,
    pub sheet_id: String,
    pub range: String,
}

pub struct SupportNetConfig {
    pub line_access_token: String,
    pub line_channel_secret: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_api_key: Option<String>,
    /// `None` when any of the three Google keys is absent; logging is then skipped.
    pub sheet: Option<SheetCredentials>,
    pub port: u16,
}

impl SupportNetConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let line_access_token =
            get("LINE_ACCESS_TOKEN").ok_or(ConfigError::Missing("LINE_ACCESS_TOKEN"))?;
        let line_channel_secret =
            get("LINE_CHANNEL_SECRET").ok_or(ConfigError::Missing("LINE_CHANNEL_SECRET"))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let sheet = match (
            get("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
            get("GOOGLE_PRIVATE_KEY"),
            get("GOOGLE_SHEET_ID"),
        ) {
            (Some(service_account_email), Some(private_key), Some(sheet_id)) => {
                Some(SheetCredentials {
                    service_account_email,
                    // Keys pasted into .env files carry escaped newlines.
                    private_key: private_key.replace("\\n", "\n"),
                    sheet_id,
                    range: get("GOOGLE_SHEET_RANGE")
                        .unwrap_or_else(|| DEFAULT_SHEET_RANGE.to_string()),
                })
            }
            _ => None,
        };

        Ok(Self {
            line_access_token,
            line_channel_secret,
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            ollama_api_key: get("OLLAMA_API_KEY"),
            sheet,
            port,
        })
    }
}
