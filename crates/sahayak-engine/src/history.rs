//! Conversation history aggregation.
//!
//! Flattens recent turns into a single bounded textual context window for
//! the generative prompt. Purely advisory context, not a correctness input.

use sahayak_storage::StoredTurn;

/// Render recent turns into a chronological context string.
///
/// `turns` arrive newest-first (as fetched); each message becomes a
/// `"Sender: <first N chars>..."` fragment, messages within a turn in
/// creation order. The flattened fragment list is reversed so the oldest
/// context comes first, then joined with `" | "`.
pub fn summarize_history(turns: &[StoredTurn], snippet_chars: usize) -> String {
    let mut fragments = Vec::new();
    for turn in turns {
        for message in &turn.messages {
            let snippet: String = message.text.chars().take(snippet_chars).collect();
            fragments.push(format!("{}: {}...", message.sender.label(), snippet));
        }
    }
    fragments.reverse();
    fragments.join(" | ")
}

/// Truncate a string to at most `max_chars` characters on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
