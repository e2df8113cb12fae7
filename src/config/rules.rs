//! Rule files and built-in assistant texts
//!
//! The assistant ships with a built-in rule table, but a deployment can
//! replace it with a TOML file.
//!
//! # Example Rule File
//!
//! ```toml
//! fallback = "Could you clarify what you're looking for?"
//!
//! [[rules]]
//! name = "greeting"
//! keywords = ["hello", "hi"]
//! response = "Hello! How can I help you today?"
//!
//! [[rules]]
//! keywords = ["thank"]
//! response = "You're welcome!"
//! ```
//!
//! Rules are matched in the order they appear in the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::intent::{Rule, RuleTable};

/// A rule table as written on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    /// Response used when no rule matches
    pub fallback: String,

    /// Rules in precedence order
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
}

/// One `[[rules]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Optional label, only used for logging
    #[serde(default)]
    pub name: Option<String>,

    /// Trigger substrings, any one of which fires the rule
    pub keywords: Vec<String>,

    /// Canned response text
    pub response: String,
}

impl RuleFile {
    /// Load a rule file from disk
    pub async fn load(path: &Path) -> Result<Self, RuleFileError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| RuleFileError::Io(format!("{}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse a rule file from a TOML string
    pub fn parse(content: &str) -> Result<Self, RuleFileError> {
        toml::from_str(content).map_err(|e| RuleFileError::Parse(e.to_string()))
    }

    /// Validate and build the matcher table
    pub fn into_table(self) -> Result<RuleTable, RuleFileError> {
        if self.fallback.trim().is_empty() {
            return Err(RuleFileError::Invalid("fallback response is empty".into()));
        }

        let mut rules = Vec::with_capacity(self.rules.len());
        for (index, entry) in self.rules.into_iter().enumerate() {
            let label = entry.name.clone().unwrap_or_else(|| format!("#{}", index));

            if entry.keywords.is_empty() {
                return Err(RuleFileError::Invalid(format!("rule {} has no keywords", label)));
            }
            if entry.keywords.iter().any(|k| k.is_empty()) {
                return Err(RuleFileError::Invalid(format!(
                    "rule {} has an empty keyword",
                    label
                )));
            }
            if entry.response.trim().is_empty() {
                return Err(RuleFileError::Invalid(format!(
                    "rule {} has an empty response",
                    label
                )));
            }

            let mut rule = Rule::new(entry.keywords, entry.response);
            if let Some(name) = entry.name {
                rule = rule.named(name);
            }
            rules.push(rule);
        }

        Ok(RuleTable::new(rules, self.fallback))
    }
}

/// Errors from rule file loading
#[derive(Debug, thiserror::Error)]
pub enum RuleFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid rule file: {0}")]
    Invalid(String),
}

/// Built-in texts that don't require files
pub mod builtin {
    pub const WELCOME: &str = "Hello! I'm your MomCare assistant. I can help you navigate the app, answer questions about maternal health, or provide resources. What would you like help with today?";

    pub const FALLBACK: &str = "I'm here to help with questions about MomCare, maternal health, baby development, and navigating parenthood. Could you clarify what you're looking for?";

    pub const NOTIFY_TITLE: &str = "MomCare Assistant";
    pub const NOTIFY_DESCRIPTION: &str =
        "Ask me anything about maternal health or navigating the app!";

    /// `(name, keywords, response)` in precedence order
    pub const RULES: &[(&str, &[&str], &str)] = &[
        (
            "greeting",
            &["hello", "hi"],
            "Hello! How can I help you today with your maternal health journey?",
        ),
        (
            "tracking",
            &["track", "tracking"],
            "You can track various aspects of your and your baby's health in the Tracking section. Would you like me to guide you there?",
        ),
        (
            "resources",
            &["resource"],
            "Our Resources section has articles, videos, and guides on pregnancy, postpartum care, and infant development. Check it out in the main navigation!",
        ),
        (
            "community",
            &["community"],
            "Connect with other parents in our Community section. You can join groups, ask questions, and share experiences.",
        ),
        (
            "emergency",
            &["emergency"],
            "If you're experiencing a medical emergency, please call emergency services immediately. Our Emergency section has guidelines for common maternal and infant emergencies.",
        ),
        (
            "profile",
            &["profile"],
            "You can update your profile information, including your and your baby's details, in the Profile section accessible from the top right menu.",
        ),
        (
            "wellness",
            &["wellness"],
            "Our Wellness section offers mental health resources, self-care tips, and wellbeing tracking specifically for new mothers.",
        ),
        (
            "about",
            &["what is momcare", "about"],
            "MomCare is a comprehensive platform designed to support mothers through pregnancy and early parenthood. We offer tracking tools, resources, community support, and personalized guidance for your maternal journey.",
        ),
        (
            "help",
            &["help", "guide"],
            "I can help you navigate MomCare! Would you like to learn about tracking your baby's growth, finding resources, connecting with other moms, or something else?",
        ),
        (
            "account",
            &["sign", "login", "account"],
            "You can sign in or create an account by clicking the Sign In button in the top right corner. Having an account allows you to save your tracking data, join community discussions, and personalize your experience.",
        ),
        (
            "thanks",
            &["thank"],
            "You're welcome! I'm here to help anytime you need assistance. Is there anything else I can help you with today?",
        ),
    ];
}
