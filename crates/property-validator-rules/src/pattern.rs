// File: property-validator-rules/src/pattern.rs
// Purpose: Regular-expression rule

use property_validator::ValidationRule;
use regex::Regex;

/// Whole value must match a regular expression; empty is left to a required
/// rule
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    message: String,
}

impl PatternRule {
    /// Fails when `pattern` is not a valid regular expression
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            message: message.into(),
        })
    }

    pub fn from_regex(regex: Regex, message: impl Into<String>) -> Self {
        Self {
            regex,
            message: message.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl ValidationRule<String> for PatternRule {
    fn is_valid(&self, value: &String) -> bool {
        value.is_empty() || self.regex.is_match(value)
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }
}
