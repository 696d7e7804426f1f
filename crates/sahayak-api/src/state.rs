//! Application state shared across all route handlers.
//!
//! AppState holds references to the database, the chat pipeline, and the
//! generative client. It is passed to handlers via axum's State extractor.

use std::sync::Arc;

use sahayak_core::config::ChatConfig;
use sahayak_engine::{ChatPipeline, GenerativeClient, KnowledgeBase};
use sahayak_storage::Database;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// SQLite database for persistent storage.
    pub database: Arc<Database>,
    /// The per-message chat pipeline.
    pub pipeline: Arc<ChatPipeline>,
    /// Generative client, used directly by the follow-up endpoint.
    pub client: Arc<dyn GenerativeClient>,
}

impl AppState {
    /// Create a new AppState wiring the pipeline over the given components.
    pub fn new(
        database: Arc<Database>,
        client: Arc<dyn GenerativeClient>,
        kb: KnowledgeBase,
        chat_config: ChatConfig,
    ) -> Self {
        let pipeline = Arc::new(ChatPipeline::new(
            Arc::clone(&database),
            Arc::clone(&client),
            kb,
            chat_config,
        ));
        Self {
            database,
            pipeline,
            client,
        }
    }
}
