//! Industry inference from message keywords.
//!
//! A one-way ratchet: banking keywords reclassify a user into "banking",
//! and nothing reclassifies out of it.

/// Keywords that reclassify a user into the banking industry.
static BANKING_KEYWORDS: &[&str] = &["account", "balance", "खाता", "बैलेंस", "लॉक", "lock"];

/// Infer the user's industry from a message.
///
/// Returns `"banking"` when any banking keyword appears in the text
/// (case-insensitive substring); otherwise returns `current` unchanged.
pub fn infer_industry<'a>(user_text: &str, current: &'a str) -> &'a str {
    let lowered = user_text.to_lowercase();
    if BANKING_KEYWORDS
        .iter()
        .any(|kw| lowered.contains(&kw.to_lowercase()))
    {
        return "banking";
    }
    current
}
