//! Repository implementations for SQLite-backed persistence.
//!
//! Provides UserRepository and ConversationRepository operating on the
//! Database struct using raw SQL.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rusqlite::{OptionalExtension, Row};

use sahayak_core::error::SahayakError;
use sahayak_core::types::{Conversation, Intent, Message, Sender, User};

use crate::db::Database;

/// A conversation together with its stored messages, in creation order.
#[derive(Debug, Clone)]
pub struct StoredTurn {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// Repository for customer profiles.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub fn find_by_id(&self, id: i64) -> Result<Option<User>, SahayakError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, name, preferred_language, industry, created_at
                 FROM users WHERE id = ?1",
                rusqlite::params![id],
                row_to_user,
            )
            .optional()
            .map_err(|e| SahayakError::Storage(format!("User lookup failed: {}", e)))
        })
    }

    /// Find a user by email address.
    pub fn find_by_email(&self, email: &str) -> Result<Option<User>, SahayakError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, email, name, preferred_language, industry, created_at
                 FROM users WHERE email = ?1",
                rusqlite::params![email],
                row_to_user,
            )
            .optional()
            .map_err(|e| SahayakError::Storage(format!("User lookup failed: {}", e)))
        })
    }

    /// Create a new user and return the stored row.
    pub fn create(&self, email: &str, name: &str, industry: &str) -> Result<User, SahayakError> {
        let id = self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, name, industry) VALUES (?1, ?2, ?3)",
                rusqlite::params![email, name, industry],
            )
            .map_err(|e| SahayakError::Storage(format!("Failed to create user: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })?;

        self.find_by_id(id)?
            .ok_or_else(|| SahayakError::Storage("Created user not found".to_string()))
    }

    /// Update a user's industry classification.
    pub fn update_industry(&self, id: i64, industry: &str) -> Result<(), SahayakError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET industry = ?1 WHERE id = ?2",
                rusqlite::params![industry, id],
            )
            .map_err(|e| SahayakError::Storage(format!("Failed to update industry: {}", e)))?;
            Ok(())
        })
    }

    /// Update a user's preferred language.
    pub fn update_language(&self, id: i64, language: &str) -> Result<(), SahayakError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET preferred_language = ?1 WHERE id = ?2",
                rusqlite::params![language, id],
            )
            .map_err(|e| SahayakError::Storage(format!("Failed to update language: {}", e)))?;
            Ok(())
        })
    }

    /// Delete a user (cascades to conversations and messages).
    pub fn delete(&self, id: i64) -> Result<(), SahayakError> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM users WHERE id = ?1", rusqlite::params![id])
                .map_err(|e| SahayakError::Storage(format!("Failed to delete user: {}", e)))?;
            Ok(())
        })
    }
}

/// Repository for chat turns (conversations and their messages).
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new conversation row and return its ID.
    ///
    /// This is the first of the two sequential commits of a chat turn; the
    /// ID is needed before the turn's messages can be attached.
    pub fn create(
        &self,
        user_id: i64,
        message: &str,
        intent: Intent,
        sentiment_score: f64,
    ) -> Result<i64, SahayakError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (user_id, message, intent, sentiment_score, timestamp)
                 VALUES (?1, ?2, ?3, ?4, strftime('%s', 'now'))",
                rusqlite::params![user_id, message, intent.as_str(), sentiment_score],
            )
            .map_err(|e| SahayakError::Storage(format!("Failed to save conversation: {}", e)))?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Store both sides of a turn in a single transaction.
    ///
    /// Second commit of a chat turn. If this fails the conversation row from
    /// [`create`](Self::create) is left without messages; callers tolerate
    /// that partial-failure state.
    pub fn insert_turn_messages(
        &self,
        conversation_id: i64,
        user_text: &str,
        bot_text: &str,
        language: &str,
    ) -> Result<(), SahayakError> {
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| SahayakError::Storage(format!("Failed to begin transaction: {}", e)))?;
            tx.execute(
                "INSERT INTO messages (conversation_id, sender, text, language, timestamp)
                 VALUES (?1, 'user', ?2, ?3, strftime('%s', 'now'))",
                rusqlite::params![conversation_id, user_text, language],
            )
            .map_err(|e| SahayakError::Storage(format!("Failed to save user message: {}", e)))?;
            tx.execute(
                "INSERT INTO messages (conversation_id, sender, text, language, timestamp)
                 VALUES (?1, 'bot', ?2, ?3, strftime('%s', 'now'))",
                rusqlite::params![conversation_id, bot_text, language],
            )
            .map_err(|e| SahayakError::Storage(format!("Failed to save bot message: {}", e)))?;
            tx.commit()
                .map_err(|e| SahayakError::Storage(format!("Failed to commit messages: {}", e)))?;
            Ok(())
        })
    }

    /// Fetch the most recent conversations for a user (descending by time),
    /// each with its messages in creation order.
    pub fn recent_turns(&self, user_id: i64, limit: u64) -> Result<Vec<StoredTurn>, SahayakError> {
        let conversations = self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, user_id, message, intent, sentiment_score, timestamp
                     FROM conversations
                     WHERE user_id = ?1
                     ORDER BY timestamp DESC, id DESC
                     LIMIT ?2",
                )
                .map_err(|e| SahayakError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit as i64], row_to_conversation)
                .map_err(|e| SahayakError::Storage(e.to_string()))?;

            let mut convs = Vec::new();
            for row in rows {
                convs.push(row.map_err(|e| SahayakError::Storage(e.to_string()))?);
            }
            Ok(convs)
        })?;

        let mut turns = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let messages = self.messages_for(conversation.id)?;
            turns.push(StoredTurn {
                conversation,
                messages,
            });
        }
        Ok(turns)
    }

    /// Fetch a conversation's messages in creation order.
    pub fn messages_for(&self, conversation_id: i64) -> Result<Vec<Message>, SahayakError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, sender, text, language, timestamp
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY id ASC",
                )
                .map_err(|e| SahayakError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id], row_to_message)
                .map_err(|e| SahayakError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                messages.push(row.map_err(|e| SahayakError::Storage(e.to_string()))?);
            }
            Ok(messages)
        })
    }

    /// Fetch the most recent conversation for a user, if any.
    pub fn latest_for_user(&self, user_id: i64) -> Result<Option<Conversation>, SahayakError> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, user_id, message, intent, sentiment_score, timestamp
                 FROM conversations
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT 1",
                rusqlite::params![user_id],
                row_to_conversation,
            )
            .optional()
            .map_err(|e| SahayakError::Storage(format!("Latest conversation lookup: {}", e)))
        })
    }

    /// Count conversations stored for a user.
    pub fn count_for_user(&self, user_id: i64) -> Result<u64, SahayakError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM conversations WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| row.get(0),
                )
                .map_err(|e| SahayakError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

// -- Row mapping helpers --

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        preferred_language: row.get(3)?,
        industry: row.get(4)?,
        created_at: epoch_to_utc(row.get(5)?),
    })
}

fn row_to_conversation(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    let intent: String = row.get(3)?;
    Ok(Conversation {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        intent: Intent::parse(&intent),
        sentiment_score: row.get(4)?,
        timestamp: epoch_to_utc(row.get(5)?),
    })
}

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let sender: String = row.get(2)?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender: Sender::parse(&sender),
        text: row.get(3)?,
        language: row.get(4)?,
        timestamp: epoch_to_utc(row.get(5)?),
    })
}

fn epoch_to_utc(epoch: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_default()
}
