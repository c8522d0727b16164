// File: property-validator-rules/src/email.rs
// Purpose: Email format rule

use once_cell::sync::Lazy;
use property_validator::ValidationRule;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Well-formed email address; empty is left to a required rule
#[derive(Debug, Clone)]
pub struct EmailFormatRule {
    message: String,
}

impl Default for EmailFormatRule {
    fn default() -> Self {
        Self {
            message: "Invalid email format".to_string(),
        }
    }
}

impl EmailFormatRule {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ValidationRule<String> for EmailFormatRule {
    fn is_valid(&self, value: &String) -> bool {
        value.is_empty() || is_valid_email(value)
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user@example.com", true)]
    #[case("first.last+tag@mail.co.uk", true)]
    #[case("", true)]
    #[case("invalid", false)]
    #[case("@example.com", false)]
    #[case("user@", false)]
    #[case("user@example", false)]
    fn test_email_format(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(EmailFormatRule::default().is_valid(&value.to_string()), valid);
    }
}
