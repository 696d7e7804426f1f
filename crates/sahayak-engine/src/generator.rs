//! Prompt construction and structured-output parsing.
//!
//! The model is asked for a single JSON object with fixed keys; its reply is
//! parsed into a tagged [`Generation`] so soft parse failures degrade to a
//! raw-text reply instead of an error.

use regex::Regex;
use std::sync::LazyLock;

use sahayak_core::types::{Intent, User};

use crate::history::truncate_chars;

/// Markdown code-fence wrapping around the model's JSON, stripped before parsing.
static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```json\s*|\s*```$").expect("Invalid fence regex"));

/// Parsed outcome of a model invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// The model returned the requested JSON object.
    Structured {
        reply: String,
        intent: Intent,
        sentiment_score: f64,
        /// Model-reported language; overrides the script detector when present.
        language: Option<String>,
    },
    /// The model's output was not valid JSON: the raw text becomes the reply
    /// verbatim and classification defaults stay in place.
    RawFallback { reply: String },
}

/// Build the chat prompt: persona, personalization, language instruction,
/// history context, intent taxonomy, sentiment instruction, and the strict
/// JSON output format.
pub fn chat_prompt(user: &User, history: &str, user_text: &str) -> String {
    format!(
        r#"You are a helpful, empathetic customer service assistant for {industry} industry.
- Personalize: Greet as "Hello {name}!" if appropriate.
- Always respond in the SAME language as the user's message (detect automatically: support English, Hindi, Tamil, Telugu, Marathi, Bengali, Gujarati).
- Use context from history: {history}
- Be concise, professional, and solution-oriented. Suggest resolutions from common knowledge if possible.
- Classify intent accurately: 'query' for info requests (e.g., 'what is balance?'), 'complaint' for problems/issues (e.g., 'account locked', 'failed payment'), 'escalate' for requests to human or complex, 'unknown' otherwise.
- Sentiment: 0.0-1.0 score, higher=positive (e.g., frustration=low).
IMPORTANT: Respond ONLY in this exact JSON format (no extra text or markdown):
{{
  "language": "Detected language name (e.g., 'Hindi', 'English')",
  "reply": "Your full response here",
  "intent": "query/complaint/escalate/unknown",
  "sentiment_score": 0.8
}}

User message: {user_text}"#,
        industry = user.industry,
        name = user.name,
        history = history,
        user_text = user_text,
    )
}

/// Build the follow-up survey prompt for the given channel.
pub fn followup_prompt(language: &str, recent_message: &str, intent: Intent, channel: &str) -> String {
    format!(
        r#"Generate a short satisfaction survey follow-up in {language}.
Reference recent issue: {issue} (intent: {intent}).
Include 1 question (e.g., "How satisfied were you? 1-5") and reply instructions.
Format: {channel} friendly."#,
        language = language,
        issue = truncate_chars(recent_message, 100),
        intent = intent.as_str(),
        channel = channel,
    )
}

/// Parse the model's raw output into a tagged [`Generation`].
///
/// Strips an optional ```json fence, then attempts a strict JSON parse.
/// A JSON object yields `Structured` (missing intent defaults to unknown,
/// missing sentiment to 0.0, number-or-numeric-string coercion clamped to
/// [0, 1]); anything else yields `RawFallback` with the stripped text.
pub fn parse_generation(raw: &str) -> Generation {
    let stripped = FENCE_RE.replace_all(raw.trim(), "").trim().to_string();

    let parsed: serde_json::Value = match serde_json::from_str(&stripped) {
        Ok(value) => value,
        Err(_) => {
            return Generation::RawFallback { reply: stripped };
        }
    };

    let Some(object) = parsed.as_object() else {
        return Generation::RawFallback { reply: stripped };
    };

    let reply = object
        .get("reply")
        .and_then(|v| v.as_str())
        .unwrap_or(&stripped)
        .trim()
        .to_string();

    let intent = object
        .get("intent")
        .and_then(|v| v.as_str())
        .map(Intent::parse)
        .unwrap_or_default();

    let sentiment_score = object
        .get("sentiment_score")
        .map(coerce_sentiment)
        .unwrap_or(0.0);

    let language = object
        .get("language")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Generation::Structured {
        reply,
        intent,
        sentiment_score,
        language,
    }
}

/// Coerce a JSON value to a sentiment score in [0, 1].
///
/// Accepts numbers and numeric strings; anything else is 0.0.
fn coerce_sentiment(value: &serde_json::Value) -> f64 {
    let score = match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    score.clamp(0.0, 1.0)
}
