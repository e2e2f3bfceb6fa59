// Validator configuration

use crate::errors::{Result, ValidationError};
use crate::rules::DEFAULT_RULE_DELIMITER;
use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for [`ValidatorAdapter`](crate::ValidatorAdapter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Log failed validations (field count only, never values)
    pub log_failures: bool,
    /// Run a subject's preparation step before reading its own values
    pub prepare_views: bool,
    /// Separator of delimited rule strings
    pub rule_delimiter: char,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            log_failures: true,
            prepare_views: true,
            rule_delimiter: DEFAULT_RULE_DELIMITER,
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    ///
    /// - `ARMATURE_VALIDATION_LOG_FAILURES=1|0`
    /// - `ARMATURE_VALIDATION_PREPARE_VIEWS=1|0`
    /// - `ARMATURE_VALIDATION_RULE_DELIMITER=<char>`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let log_failures = env::var("ARMATURE_VALIDATION_LOG_FAILURES")
            .map(|v| is_truthy(&v))
            .unwrap_or(defaults.log_failures);

        let prepare_views = env::var("ARMATURE_VALIDATION_PREPARE_VIEWS")
            .map(|v| is_truthy(&v))
            .unwrap_or(defaults.prepare_views);

        let rule_delimiter = env::var("ARMATURE_VALIDATION_RULE_DELIMITER")
            .ok()
            .and_then(|v| single_char(&v))
            .unwrap_or(defaults.rule_delimiter);

        Self {
            log_failures,
            prepare_views,
            rule_delimiter,
        }
    }

    /// Parse config from a JSON document; missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::configuration(format!("invalid validator config: {}", e)))
    }

    /// Enable or disable failure logging
    pub fn with_log_failures(mut self, enabled: bool) -> Self {
        self.log_failures = enabled;
        self
    }

    /// Enable or disable the preparation step
    pub fn with_prepare_views(mut self, enabled: bool) -> Self {
        self.prepare_views = enabled;
        self
    }

    /// Set the rule string separator
    pub fn with_rule_delimiter(mut self, delimiter: char) -> Self {
        self.rule_delimiter = delimiter;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

fn single_char(value: &str) -> Option<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
