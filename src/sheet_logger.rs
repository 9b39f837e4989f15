use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::config::SheetCredentials;
use crate::error::SheetError;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh the cached access token this long before Google says it expires.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// One exchanged message, as written to the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    pub timestamp: String,
    pub user_message: String,
    pub reply: String,
}

impl ActivityRow {
    pub fn new(at: DateTime<Utc>, user_message: &str, reply: &str) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            user_message: user_message.to_string(),
            reply: reply.to_string(),
        }
    }
}

#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn append(&self, row: &ActivityRow) -> Result<(), SheetError>;
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS as u64
}

#[derive(Serialize)]
struct AppendRequest<'a> {
    values: [[&'a str; 3]; 1],
}

struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Appends activity rows to a Google Sheet as a service account.
pub struct GoogleSheetsLogger {
    client: Client,
    credentials: SheetCredentials,
    key: EncodingKey,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleSheetsLogger {
    /// Fails if the private key is not a valid RSA PEM.
    pub fn new(credentials: SheetCredentials) -> Result<Self, SheetError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())?;
        Ok(Self {
            client: Client::new(),
            credentials,
            key,
            token: Mutex::new(None),
        })
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetError> {
        let iat = now.timestamp();
        let claims = Claims {
            iss: &self.credentials.service_account_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URL,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &self.key)?)
    }

    async fn access_token(&self) -> Result<String, SheetError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.access_token.clone());
            }
        }

        let assertion = self.signed_assertion(Utc::now())?;
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Api {
                what: "token endpoint",
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        tracing::debug!(expires_in = token.expires_in, "Refreshed Google access token");

        Ok(token.access_token)
    }

    fn append_url(&self) -> String {
        format!(
            "{SHEETS_API}/{}/values/{}:append",
            self.credentials.sheet_id, self.credentials.range
        )
    }
}

#[async_trait]
impl ActivityLog for GoogleSheetsLogger {
    async fn append(&self, row: &ActivityRow) -> Result<(), SheetError> {
        let token = self.access_token().await?;
        let body = AppendRequest {
            values: [[
                row.timestamp.as_str(),
                row.user_message.as_str(),
                row.reply.as_str(),
            ]],
        };

        let response = self
            .client
            .post(self.append_url())
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Api {
                what: "sheets append",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
