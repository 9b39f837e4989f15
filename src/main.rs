
mod advice;
mod communication_channel;
mod config;
mod conversation_manager;
mod error;
mod events;
mod keywords;
mod line_manager;
mod replies;
mod server;
mod sheet_logger;
mod signature;
mod support;

use std::sync::Arc;

use dotenvy::dotenv;

use crate::advice::OllamaClient;
use crate::config::SupportNetConfig;
use crate::line_manager::LineManager;
use crate::server::AppState;
use crate::sheet_logger::{ActivityLog, GoogleSheetsLogger};
use crate::support::Support;

fn activity_log_from(config: &SupportNetConfig) -> Option<Arc<dyn ActivityLog>> {
    let Some(credentials) = config.sheet.clone() else {
        tracing::warn!("Google Sheet credentials not set, activity logging disabled");
        return None;
    };

    match GoogleSheetsLogger::new(credentials) {
        Ok(logger) => Some(Arc::new(logger)),
        Err(e) => {
            tracing::error!(error = %e, "Activity logging disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if dotenv().is_err() {
        eprintln!(".env file not found, using process environment");
    }

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SupportNetConfig::from_env()?;

    let line = LineManager::new(config.line_access_token.clone());
    let advisor = OllamaClient::new(
        config.ollama_url.clone(),
        config.ollama_model.clone(),
        config.ollama_api_key.clone(),
    );
    tracing::info!(model = %config.ollama_model, url = %config.ollama_url, "Advice generator configured");

    let support = Support::new(Arc::new(line), Arc::new(advisor), activity_log_from(&config));
    let state = AppState {
        support: Arc::new(support),
        channel_secret: config.line_channel_secret.as_str().into(),
    };

    server::serve(state, config.port).await
}
