//! The per-message chat pipeline.
//!
//! Central coordinator wiring industry inference, language detection,
//! history aggregation, generation, the resolution/escalation policy, and
//! persistence. One handler invocation per incoming message, no internal
//! parallelism.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use sahayak_core::config::ChatConfig;
use sahayak_core::types::{Intent, User};
use sahayak_storage::{ConversationRepository, Database, UserRepository};

use crate::client::GenerativeClient;
use crate::error::PipelineError;
use crate::generator::{chat_prompt, parse_generation, Generation};
use crate::history::summarize_history;
use crate::industry::infer_industry;
use crate::knowledge::KnowledgeBase;
use crate::language::detect_language;
use crate::policy::{decide, Outcome};

/// Result of one fully processed chat turn.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub user_message: String,
    pub bot_reply: String,
    pub detected_language: String,
    pub intent: Intent,
    pub sentiment_score: f64,
    pub response_time_secs: f64,
    pub escalate: bool,
    pub context_summary: Option<String>,
    pub conversation_id: i64,
    pub user_id: i64,
}

/// Central chat pipeline coordinating detection, generation, policy, and
/// persistence.
pub struct ChatPipeline {
    users: UserRepository,
    conversations: ConversationRepository,
    client: Arc<dyn GenerativeClient>,
    kb: KnowledgeBase,
    config: ChatConfig,
}

impl ChatPipeline {
    /// Create a new pipeline over the given database and generative client.
    pub fn new(
        db: Arc<Database>,
        client: Arc<dyn GenerativeClient>,
        kb: KnowledgeBase,
        config: ChatConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(Arc::clone(&db)),
            conversations: ConversationRepository::new(db),
            client,
            kb,
            config,
        }
    }

    /// Process one incoming chat message.
    ///
    /// Generation failures abort the turn with nothing persisted; storage
    /// failures after generation discard the reply. Soft parse failures are
    /// not errors and degrade to a raw-text reply.
    pub async fn handle_message(
        &self,
        message: &str,
        user_id: Option<i64>,
    ) -> Result<ChatOutcome, PipelineError> {
        let user_text = message.trim();
        if user_text.is_empty() {
            return Err(PipelineError::EmptyMessage);
        }

        let mut user = self.resolve_user(user_id)?;

        // Industry inference updates the profile before generation.
        let inferred = infer_industry(user_text, &user.industry).to_string();
        if inferred != user.industry {
            self.users.update_industry(user.id, &inferred)?;
            info!(user_id = user.id, industry = %inferred, "Updated user industry");
            user.industry = inferred;
        }

        // Provisional language from script analysis; the structured model
        // response may override it below.
        let mut detected_language = detect_language(user_text).to_string();
        if detected_language != user.preferred_language {
            self.users.update_language(user.id, &detected_language)?;
            user.preferred_language = detected_language.clone();
            info!(user_id = user.id, language = %detected_language, "Updated preferred language");
        }

        let turns = self
            .conversations
            .recent_turns(user.id, self.config.history_limit)?;
        let history = summarize_history(&turns, self.config.history_snippet_chars);

        let started = Instant::now();

        let prompt = chat_prompt(&user, &history, user_text);
        let raw = self
            .client
            .generate(&prompt)
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))?;

        let mut intent = Intent::Unknown;
        let mut sentiment_score = 0.0;
        let bot_reply = match parse_generation(&raw) {
            Generation::Structured {
                reply,
                intent: parsed_intent,
                sentiment_score: parsed_score,
                language,
            } => {
                intent = parsed_intent;
                sentiment_score = parsed_score;
                if let Some(lang) = language {
                    detected_language = lang;
                }
                reply
            }
            Generation::RawFallback { reply } => {
                warn!("Model did not return JSON; using raw reply");
                reply
            }
        };

        if bot_reply.is_empty() {
            return Err(PipelineError::Generation(
                "No response generated".to_string(),
            ));
        }

        let mut escalate = false;
        let mut context_summary = None;
        let bot_reply = match decide(&self.kb, &user, intent, sentiment_score, user_text, &history)
        {
            Outcome::Resolved { reply } => {
                info!(user_id = user.id, "Auto-resolved via knowledge base");
                reply
            }
            Outcome::Escalated {
                reply,
                context_summary: summary,
            } => {
                info!(user_id = user.id, "Escalation triggered");
                escalate = true;
                context_summary = Some(summary);
                reply
            }
            Outcome::Unchanged => bot_reply,
        };

        let response_time_secs = started.elapsed().as_secs_f64();
        if response_time_secs > self.config.slow_response_secs {
            warn!(response_time_secs, "Slow response detected");
        }

        // Two sequential commits: the conversation row first (to obtain the
        // id), then both messages. A failure here leaves an orphaned
        // conversation, which readers tolerate.
        let conversation_id = self
            .conversations
            .create(user.id, user_text, intent, sentiment_score)
            .map_err(|e| PipelineError::Storage(e.to_string()))?;
        self.conversations
            .insert_turn_messages(conversation_id, user_text, &bot_reply, &detected_language)
            .map_err(|e| PipelineError::Storage(e.to_string()))?;

        info!(
            conversation_id,
            intent = intent.as_str(),
            sentiment_score,
            "Stored conversation"
        );

        Ok(ChatOutcome {
            user_message: user_text.to_string(),
            bot_reply,
            detected_language,
            intent,
            sentiment_score,
            response_time_secs,
            escalate,
            context_summary,
            conversation_id,
            user_id: user.id,
        })
    }

    /// Resolve the target user: explicit id, then the seeded test account,
    /// then a freshly created profile.
    fn resolve_user(&self, user_id: Option<i64>) -> Result<User, PipelineError> {
        let existing = match user_id {
            Some(id) => self.users.find_by_id(id)?,
            None => self.users.find_by_email("test@example.com")?,
        };

        if let Some(user) = existing {
            return Ok(user);
        }

        let email = format!("user_{}@example.com", Utc::now().timestamp());
        let user = self.users.create(&email, "Test User", "general")?;
        info!(user_id = user.id, "Created new user");
        Ok(user)
    }
}
