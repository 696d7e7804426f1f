//! Sahayak application binary - composition root.
//!
//! Ties together the Sahayak crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite database and run migrations
//! 3. Load the knowledge base (built-in entries or a configured TOML file)
//! 4. Construct the generative client from config + environment
//! 5. Start the axum REST API server

mod cli;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;

use sahayak_api::{routes, AppState};
use sahayak_core::config::SahayakConfig;
use sahayak_engine::{GeminiClient, KnowledgeBase};
use sahayak_storage::Database;

use cli::CliArgs;

/// Load the knowledge base from the configured path, or fall back to the
/// built-in entries.
fn load_knowledge_base(config: &SahayakConfig) -> KnowledgeBase {
    match config.chat.knowledge_base_path.as_deref() {
        Some(path) => match KnowledgeBase::load(Path::new(path)) {
            Ok(kb) => {
                tracing::info!(path, "Knowledge base loaded");
                kb
            }
            Err(e) => {
                tracing::warn!(path, error = %e, "Failed to load knowledge base; using built-in entries");
                KnowledgeBase::default()
            }
        },
        None => KnowledgeBase::default(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let default_level = args.log_level.clone().unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    tracing::info!("Starting Sahayak v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = SahayakConfig::load_or_default(&config_file);
    config.server.port = args.resolve_port(config.server.port);

    // Storage.
    let db_path = args.resolve_db_path(&config.database.path);
    let database = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Knowledge base.
    let kb = load_knowledge_base(&config);

    // Generative client. The API key comes from the environment variable
    // named in config, never from the config file itself.
    let api_key = std::env::var(&config.generative.api_key_env).unwrap_or_else(|_| {
        tracing::warn!(
            var = %config.generative.api_key_env,
            "API key variable not set; generation requests will be rejected upstream"
        );
        String::new()
    });
    let client = Arc::new(GeminiClient::new(&config.generative, api_key)?);
    tracing::info!(model = %config.generative.model, "Generative client ready");

    // API state and server.
    let state = AppState::new(database, client, kb, config.chat.clone());

    routes::start_server(&config, state).await?;

    Ok(())
}
