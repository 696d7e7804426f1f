use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Which side of a conversation turn a stored message belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Message written by the customer.
    User,
    /// Reply produced by the service.
    Bot,
}

impl Sender {
    /// Database/display representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    /// Parse a stored sender string. Unknown values map to `User`.
    pub fn parse(s: &str) -> Self {
        match s {
            "bot" => Sender::Bot,
            _ => Sender::User,
        }
    }

    /// Capitalized label used when rendering history fragments.
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Bot => "Bot",
        }
    }
}

/// Coarse classification of a message's purpose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Information request ("what is my balance?").
    Query,
    /// Problem report ("account locked", "failed payment").
    Complaint,
    /// Explicit request for a human, or too complex to auto-handle.
    Escalate,
    /// Anything else, and the default before classification.
    #[default]
    Unknown,
}

impl Intent {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Query => "query",
            Intent::Complaint => "complaint",
            Intent::Escalate => "escalate",
            Intent::Unknown => "unknown",
        }
    }

    /// Parse a stored or model-reported intent. Unrecognized values map to
    /// `Unknown` rather than failing, matching the classifier's fallback.
    pub fn parse(s: &str) -> Self {
        match s {
            "query" => Intent::Query,
            "complaint" => Intent::Complaint,
            "escalate" => Intent::Escalate,
            _ => Intent::Unknown,
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// A customer profile.
///
/// `preferred_language` and `industry` are mutable labels updated as a side
/// effect of message handling (last write wins under concurrency).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub preferred_language: String,
    pub industry: String,
    pub created_at: DateTime<Utc>,
}

/// One user-turn summary: the incoming message plus its classification.
///
/// Owns exactly two [`Message`] rows (user + bot) created in the same turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub intent: Intent,
    pub sentiment_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// One side of a conversation turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender: Sender,
    pub text: String,
    pub language: String,
    pub timestamp: DateTime<Utc>,
}

/// Persisted per-user aggregate metrics, refreshed on each analytics call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub user_id: i64,
    pub avg_sentiment: f64,
    pub escalation_count: i64,
    pub total_conversations: i64,
    pub last_updated: DateTime<Utc>,
}
