//! Aggregate queries for the analytics endpoint.
//!
//! Metrics are always recomputed from the conversations table; the
//! one-to-one analytics row is refreshed as a side effect so downstream
//! reporting can read it without re-aggregating.

use std::sync::Arc;

use sahayak_core::error::SahayakError;

use crate::db::Database;

/// Freshly computed per-user conversation statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub avg_sentiment: f64,
    pub escalation_count: i64,
    pub total_conversations: i64,
}

/// Analytics query service.
pub struct AnalyticsService {
    db: Arc<Database>,
}

impl AnalyticsService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Compute conversation statistics for a user.
    ///
    /// Returns `None` when the user has no stored conversations. Escalations
    /// count conversations whose *stored* intent is "escalate"; policy-driven
    /// escalation overrides do not change the stored intent.
    pub fn user_stats(&self, user_id: i64) -> Result<Option<UserStats>, SahayakError> {
        self.db.with_conn(|conn| {
            let (total, avg, escalations): (i64, Option<f64>, i64) = conn
                .query_row(
                    "SELECT COUNT(*),
                            AVG(sentiment_score),
                            COALESCE(SUM(intent = 'escalate'), 0)
                     FROM conversations
                     WHERE user_id = ?1",
                    rusqlite::params![user_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .map_err(|e| SahayakError::Storage(format!("Stats query failed: {}", e)))?;

            if total == 0 {
                return Ok(None);
            }

            Ok(Some(UserStats {
                avg_sentiment: avg.unwrap_or(0.0),
                escalation_count: escalations,
                total_conversations: total,
            }))
        })
    }

    /// Refresh the persisted analytics row for a user from fresh stats.
    pub fn refresh(&self, user_id: i64, stats: &UserStats) -> Result<(), SahayakError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO analytics
                     (user_id, avg_sentiment, escalation_count, total_conversations, last_updated)
                 VALUES (?1, ?2, ?3, ?4, strftime('%s', 'now'))
                 ON CONFLICT(user_id) DO UPDATE SET
                     avg_sentiment = excluded.avg_sentiment,
                     escalation_count = excluded.escalation_count,
                     total_conversations = excluded.total_conversations,
                     last_updated = excluded.last_updated",
                rusqlite::params![
                    user_id,
                    stats.avg_sentiment,
                    stats.escalation_count,
                    stats.total_conversations,
                ],
            )
            .map_err(|e| SahayakError::Storage(format!("Analytics refresh failed: {}", e)))?;
            Ok(())
        })
    }
}
