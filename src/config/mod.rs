//! Application configuration

pub mod rules;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use rules::{builtin, RuleFile, RuleFileError};

use crate::intent::RuleTable;

const DEFAULT_RESPONSE_DELAY_MS: u64 = 1000;
const DEFAULT_NOTIFY_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Simulated typing delay before the assistant replies
    pub response_delay_ms: u64,
    /// How long the first-open notification stays up
    pub notify_duration_ms: u64,
    /// Optional TOML rule file replacing the built-in table
    pub rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            response_delay_ms: DEFAULT_RESPONSE_DELAY_MS,
            notify_duration_ms: DEFAULT_NOTIFY_DURATION_MS,
            rules_path: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            response_delay_ms: env::var("MOMCARE_RESPONSE_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RESPONSE_DELAY_MS),
            notify_duration_ms: env::var("MOMCARE_NOTIFY_DURATION_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_NOTIFY_DURATION_MS),
            rules_path: env::var("MOMCARE_RULES_PATH").ok().map(PathBuf::from),
        })
    }

    pub fn response_delay(&self) -> Duration {
        Duration::from_millis(self.response_delay_ms)
    }

    /// Load the configured rule table, or the built-in one if none is set
    pub async fn load_rules(&self) -> Result<RuleTable, RuleFileError> {
        match &self.rules_path {
            Some(path) => {
                let table = RuleFile::load(path).await?.into_table()?;
                if table.is_empty() {
                    tracing::warn!(
                        path = %path.display(),
                        "Rule file has no rules, every reply will be the fallback"
                    );
                }
                tracing::info!(path = %path.display(), rules = table.len(), "Loaded rule file");
                Ok(table)
            }
            None => Ok(RuleTable::builtin()),
        }
    }
}
