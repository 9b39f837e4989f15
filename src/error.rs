use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Expected {0} in the environment")]
    Missing(&'static str),
    #[error("Invalid {key} value: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Failures talking to the messaging platform.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("reply request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("messaging API returned {status}: {body}")]
    Api { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum AdviceError {
    #[error("generator request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generator returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("invalid service account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
    #[error("sheets request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{what} returned {status}: {body}")]
    Api {
        what: &'static str,
        status: u16,
        body: String,
    },
}
