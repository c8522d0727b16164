// File: property-validator-rules/src/string.rs
// Purpose: Required and length rules for string properties

use property_validator::ValidationRule;

const REQUIRED_MESSAGE: &str = "Field is required";

/// Rejects empty and whitespace-only strings
#[derive(Debug, Clone)]
pub struct RequiredRule {
    message: String,
}

impl Default for RequiredRule {
    fn default() -> Self {
        Self::with_message(REQUIRED_MESSAGE)
    }
}

impl RequiredRule {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for RequiredRule {
    fn is_valid(&self, value: &String) -> bool {
        !value.trim().is_empty()
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }
}

/// Rejects only the empty string; whitespace counts as a value
#[derive(Debug, Clone)]
pub struct StringRequiredRule {
    message: String,
}

impl Default for StringRequiredRule {
    fn default() -> Self {
        Self::with_message(REQUIRED_MESSAGE)
    }
}

impl StringRequiredRule {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for StringRequiredRule {
    fn is_valid(&self, value: &String) -> bool {
        !value.is_empty()
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }
}

/// At least `min` characters
#[derive(Debug, Clone, Copy)]
pub struct MinLengthRule {
    min: usize,
}

impl MinLengthRule {
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl ValidationRule<String> for MinLengthRule {
    fn is_valid(&self, value: &String) -> bool {
        value.is_empty() || char_len(value) >= self.min
    }

    fn error_message(&self) -> String {
        format!("Must be at least {} characters", self.min)
    }
}

/// At most `max` characters
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthRule {
    max: usize,
}

impl MaxLengthRule {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl ValidationRule<String> for MaxLengthRule {
    fn is_valid(&self, value: &String) -> bool {
        char_len(value) <= self.max
    }

    fn error_message(&self) -> String {
        format!("Must be at most {} characters", self.max)
    }
}

/// Between `min` and `max` characters, both inclusive
#[derive(Debug, Clone, Copy)]
pub struct RangeLengthRule {
    min: usize,
    max: usize,
}

impl RangeLengthRule {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl ValidationRule<String> for RangeLengthRule {
    fn is_valid(&self, value: &String) -> bool {
        let len = char_len(value);
        value.is_empty() || (len >= self.min && len <= self.max)
    }

    fn error_message(&self) -> String {
        format!("Must be between {} and {} characters", self.min, self.max)
    }
}

// Lengths are user-visible, so count characters rather than bytes
fn char_len(value: &str) -> usize {
    value.chars().count()
}
