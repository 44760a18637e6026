//! Analysis settings with environment overrides.

use crate::diff::lines::DEFAULT_LCS_CELL_LIMIT;
use std::time::Duration;

pub const ENV_MODEL: &str = "CONTRACT_DIFF_MODEL";
pub const ENV_COMMAND: &str = "CONTRACT_DIFF_COMMAND";
pub const ENV_TIMEOUT_SECS: &str = "CONTRACT_DIFF_TIMEOUT_SECS";
pub const ENV_LCS_LIMIT: &str = "CONTRACT_DIFF_LCS_LIMIT";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Line-count product above which the line differ goes linear.
    pub lcs_cell_limit: usize,
    /// Budget for one semantic-analysis call.
    pub semantic_timeout: Duration,
    /// Per-source character cap in the analyzer request.
    pub max_source_chars: usize,
    pub model: String,
    /// Replaces the claude CLI when set. Trusted configuration only.
    pub custom_command: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            lcs_cell_limit: DEFAULT_LCS_CELL_LIMIT,
            semantic_timeout: Duration::from_secs(45),
            max_source_chars: 24_000,
            model: "sonnet".to_owned(),
            custom_command: None,
        }
    }
}

impl AnalysisConfig {
    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unparsable numbers are
    /// ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_owned();
        }
        if let Some(command) = lookup(ENV_COMMAND).filter(|v| !v.trim().is_empty()) {
            config.custom_command = Some(command);
        }
        if let Some(secs) = parse_number::<u64>(&lookup, ENV_TIMEOUT_SECS) {
            config.semantic_timeout = Duration::from_secs(secs);
        }
        if let Some(limit) = parse_number::<usize>(&lookup, ENV_LCS_LIMIT) {
            config.lcs_cell_limit = limit;
        }
        config
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[config] Ignoring {key}={raw:?}: not a number");
            None
        }
    }
}
