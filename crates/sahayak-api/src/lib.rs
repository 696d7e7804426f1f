//! Sahayak API crate - axum HTTP server and route handlers.
//!
//! Provides the REST API for the customer-service backend: the chat
//! endpoint, per-user analytics, follow-up survey generation, and health
//! checks.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
