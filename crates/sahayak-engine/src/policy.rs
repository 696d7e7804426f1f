//! Resolution and escalation policy.
//!
//! Deterministic post-processing of a generated reply. Rules are mutually
//! exclusive and evaluated in order: a KB-eligible, high-sentiment message
//! never escalates even when the intent says so.

use sahayak_core::types::{Intent, User};

use crate::history::truncate_chars;
use crate::knowledge::KnowledgeBase;

/// Decision applied on top of the generated reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The reply is replaced with a trusted canned resolution.
    Resolved { reply: String },
    /// The conversation is handed off to a human agent.
    Escalated {
        reply: String,
        /// Context bundle for downstream agent tooling.
        context_summary: String,
    },
    /// The generated reply stands unmodified.
    Unchanged,
}

/// Sentiment above which a KB match overrides the generated reply.
const RESOLUTION_SENTIMENT_FLOOR: f64 = 0.5;

/// Sentiment below which a turn escalates regardless of intent.
const ESCALATION_SENTIMENT_CEILING: f64 = 0.3;

/// Decide whether to auto-resolve, escalate, or keep the generated reply.
pub fn decide(
    kb: &KnowledgeBase,
    user: &User,
    intent: Intent,
    sentiment_score: f64,
    user_text: &str,
    history: &str,
) -> Outcome {
    if let Some(resolution) = kb.find_resolution(intent.as_str(), user_text, &user.industry) {
        if sentiment_score > RESOLUTION_SENTIMENT_FLOOR {
            return Outcome::Resolved {
                reply: resolution.to_string(),
            };
        }
    }

    if intent == Intent::Escalate || sentiment_score < ESCALATION_SENTIMENT_CEILING {
        return Outcome::Escalated {
            reply: format!(
                "Escalating to human agent with context. Hold tight, {}!",
                user.name
            ),
            context_summary: format!(
                "User: {} ({}), History: {}..., Current: {}, Sentiment: {}",
                user.name,
                user.id,
                truncate_chars(history, 200),
                user_text,
                sentiment_score
            ),
        };
    }

    Outcome::Unchanged
}
