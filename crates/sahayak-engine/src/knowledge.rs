//! Static knowledge base for auto-resolution.
//!
//! An immutable set of canned resolutions keyed by industry and intent key,
//! loaded once at startup. Sections and entries are ordered sequences so
//! first-match lookup stays deterministic.

use std::path::Path;

use serde::{Deserialize, Serialize};

use sahayak_core::error::Result;

/// One canned resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntry {
    /// Intent key, e.g. "complaint_lock". Matching is substring-based:
    /// an intent matches when it appears anywhere in the key.
    pub key: String,
    /// Trigger keywords, matched case-insensitively against the user text.
    pub keywords: Vec<String>,
    /// Canned answer returned on a match.
    pub resolution: String,
}

/// All entries for one industry, in definition order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbSection {
    pub industry: String,
    pub entries: Vec<KbEntry>,
}

/// The loaded knowledge base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub sections: Vec<KbSection>,
}

impl KnowledgeBase {
    /// Load a knowledge base from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let kb: KnowledgeBase = toml::from_str(&content)?;
        Ok(kb)
    }

    /// Find a resolution for the given intent, user text, and industry.
    ///
    /// Selects the industry's section, falling back to "general" when the
    /// industry has no section. Returns the first entry (in definition
    /// order) whose key contains the intent as a substring and whose
    /// keywords contain a case-insensitive substring match against the user
    /// text. Entries with no keywords never match.
    pub fn find_resolution(
        &self,
        intent: &str,
        user_text: &str,
        industry: &str,
    ) -> Option<&str> {
        let section = self
            .section(industry)
            .or_else(|| self.section("general"))?;

        let lowered = user_text.to_lowercase();
        section
            .entries
            .iter()
            .find(|entry| {
                entry.key.contains(intent)
                    && entry
                        .keywords
                        .iter()
                        .any(|kw| lowered.contains(&kw.to_lowercase()))
            })
            .map(|entry| entry.resolution.as_str())
    }

    fn section(&self, industry: &str) -> Option<&KbSection> {
        self.sections.iter().find(|s| s.industry == industry)
    }
}

impl Default for KnowledgeBase {
    /// Built-in seed entries for banking, telecom, and the general fallback.
    fn default() -> Self {
        let entry = |key: &str, keywords: &[&str], resolution: &str| KbEntry {
            key: key.to_string(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            resolution: resolution.to_string(),
        };

        Self {
            sections: vec![
                KbSection {
                    industry: "banking".to_string(),
                    entries: vec![
                        entry(
                            "query_balance",
                            &["balance", "account balance", "खाता बैलेंस"],
                            "To check your balance, log in to the app with your credentials or call 1800-BANK-HELP. If issues, provide account #.",
                        ),
                        entry(
                            "complaint_lock",
                            &["locked", "account lock", "लॉक", "खाता लॉक"],
                            "Your account is locked for security. Use 'Forgot Password' or OTP from registered mobile to unlock. If failed, escalate.",
                        ),
                        entry(
                            "escalate_payment",
                            &["payment failed", "refund"],
                            "Escalating your payment issue to a human agent with full context.",
                        ),
                    ],
                },
                KbSection {
                    industry: "telecom".to_string(),
                    entries: vec![entry(
                        "query_bill",
                        &["bill", "recharge"],
                        "Check bill in MyAccount app or dial *123#. For disputes, escalate.",
                    )],
                },
                KbSection {
                    industry: "general".to_string(),
                    entries: vec![
                        entry(
                            "query_balance",
                            &["balance", "account balance", "खाता बैलेंस"],
                            "To check your balance, log in to the app with your credentials or call support. If issues, provide account #.",
                        ),
                        entry(
                            "complaint_lock",
                            &["locked", "account lock", "लॉक", "खाता लॉक"],
                            "Your account is locked for security. Use 'Forgot Password' or OTP from registered mobile to unlock. If failed, escalate.",
                        ),
                        entry(
                            "unknown",
                            &[],
                            "I couldn't find a quick solution. Let's escalate to a specialist.",
                        ),
                    ],
                },
            ],
        }
    }
}
