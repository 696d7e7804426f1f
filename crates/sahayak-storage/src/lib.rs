//! Sahayak storage crate - SQLite persistence for users, conversations,
//! messages, and aggregated analytics.
//!
//! Provides a WAL-mode SQLite database with migrations, repository
//! implementations for the chat data model, and the analytics query service.

pub mod db;
pub mod migrations;
pub mod queries;
pub mod repository;

pub use db::Database;
pub use queries::{AnalyticsService, UserStats};
pub use repository::{ConversationRepository, StoredTurn, UserRepository};
