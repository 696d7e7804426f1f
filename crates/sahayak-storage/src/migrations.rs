//! Database schema migrations.
//!
//! Applies the initial schema: users, conversations, messages, analytics,
//! and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use sahayak_core::error::SahayakError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), SahayakError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| SahayakError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| SahayakError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), SahayakError> {
    conn.execute_batch(
        "
        -- Customer profiles. Language and industry are mutable labels
        -- updated as a side effect of chat handling.
        CREATE TABLE IF NOT EXISTS users (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            email               TEXT NOT NULL UNIQUE,
            name                TEXT NOT NULL DEFAULT '',
            preferred_language  TEXT NOT NULL DEFAULT 'English',
            industry            TEXT NOT NULL DEFAULT 'general',
            created_at          INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- One row per chat turn: the user message plus its classification.
        CREATE TABLE IF NOT EXISTS conversations (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL
                            REFERENCES users(id) ON DELETE CASCADE,
            message         TEXT NOT NULL,
            intent          TEXT NOT NULL DEFAULT 'unknown',
            sentiment_score REAL NOT NULL DEFAULT 0.0,
            timestamp       INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_user_ts
            ON conversations (user_id, timestamp DESC);

        -- The two sides of a turn (sender = user|bot).
        CREATE TABLE IF NOT EXISTS messages (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id INTEGER NOT NULL
                            REFERENCES conversations(id) ON DELETE CASCADE,
            sender          TEXT NOT NULL
                            CHECK (sender IN ('user', 'bot')),
            text            TEXT NOT NULL,
            language        TEXT NOT NULL DEFAULT 'English',
            timestamp       INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id, id ASC);

        -- One-to-one aggregate metrics, refreshed on each analytics call.
        CREATE TABLE IF NOT EXISTS analytics (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             INTEGER NOT NULL UNIQUE
                                REFERENCES users(id) ON DELETE CASCADE,
            avg_sentiment       REAL NOT NULL DEFAULT 0.0,
            escalation_count    INTEGER NOT NULL DEFAULT 0,
            total_conversations INTEGER NOT NULL DEFAULT 0,
            last_updated        INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| SahayakError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_users_table_exists() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO users (email, name) VALUES ('a@example.com', 'Asha')",
            [],
        )
        .unwrap();

        let (lang, industry): (String, String) = conn
            .query_row(
                "SELECT preferred_language, industry FROM users WHERE email = 'a@example.com'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(lang, "English");
        assert_eq!(industry, "general");
    }

    #[test]
    fn test_email_unique() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO users (email) VALUES ('dup@example.com')", [])
            .unwrap();
        let result = conn.execute("INSERT INTO users (email) VALUES ('dup@example.com')", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_messages_sender_check() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO users (email) VALUES ('u@example.com')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO conversations (user_id, message) VALUES (1, 'hi')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO messages (conversation_id, sender, text) VALUES (1, 'agent', 'hi')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_conversation_requires_user() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO conversations (user_id, message) VALUES (99, 'orphan')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cascade_delete_user_removes_children() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO users (email) VALUES ('u@example.com')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO conversations (user_id, message) VALUES (1, 'hi')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (conversation_id, sender, text) VALUES (1, 'user', 'hi')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (conversation_id, sender, text) VALUES (1, 'bot', 'hello')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM users WHERE id = 1", []).unwrap();

        let convs: i64 = conn
            .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
            .unwrap();
        let msgs: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(convs, 0);
        assert_eq!(msgs, 0);
    }

    #[test]
    fn test_analytics_one_per_user() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute("INSERT INTO users (email) VALUES ('u@example.com')", [])
            .unwrap();
        conn.execute("INSERT INTO analytics (user_id) VALUES (1)", [])
            .unwrap();
        let result = conn.execute("INSERT INTO analytics (user_id) VALUES (1)", []);
        assert!(result.is_err());
    }
}
