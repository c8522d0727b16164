// File: property-validator/src/error.rs
// Purpose: Error taxonomy for registration, binding and validation failures

use crate::result::ValidationResultArgs;

/// Result alias used across the crate
pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

/// Everything that can go wrong while wiring or running validation
///
/// Usage and binding mistakes fail fast. Plain rule violations are not errors;
/// they only surface here through [`ValidationError::PropertiesInvalid`] when a
/// caller asks for the validate-or-fail guard.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A query or push operation ran before `register`
    #[error("Please use 'register' before invoking '{operation}'")]
    NotRegistered { operation: &'static str },

    /// `register` was called a second time on the same service
    #[error("'register' may only be called once per validation service")]
    AlreadyRegistered,

    /// The service session was disposed
    #[error("The validation service has been disposed")]
    Disposed,

    /// The pipeline was asked to validate a property that has no rules
    #[error("'{0}' is not registered to validation rules")]
    UnregisteredProperty(String),

    /// A dynamic property lookup found no such member on the target
    #[error("Property '{property}' not found in target '{owner}'")]
    MissingProperty {
        property: String,
        owner: &'static str,
    },

    /// Auto-fill could not find the writable error sibling
    #[error("Error property '{property}' not found in target '{owner}'")]
    MissingErrorProperty {
        property: String,
        owner: &'static str,
    },

    /// A debounce delay was requested outside a Tokio runtime
    #[error("A validation delay requires a running Tokio runtime")]
    RuntimeUnavailable,

    /// One or more properties violate their rules
    #[error(transparent)]
    PropertiesInvalid(#[from] PropertyException),
}

impl ValidationError {
    /// Structured result attached to a validation failure, if this is one
    pub fn validation_result(&self) -> Option<&ValidationResultArgs> {
        match self {
            ValidationError::PropertiesInvalid(ex) => Some(ex.validation_result()),
            _ => None,
        }
    }
}

/// Raised by the validate-or-fail guard
///
/// Displays as the first error message and keeps the full per-property map
/// for inspection.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct PropertyException {
    message: String,
    result: ValidationResultArgs,
}

impl PropertyException {
    pub fn new(result: ValidationResultArgs) -> Self {
        let message = result
            .first_error()
            .map(str::to_string)
            .unwrap_or_else(|| "Validation failed".to_string());

        Self { message, result }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn validation_result(&self) -> &ValidationResultArgs {
        &self.result
    }

    pub fn into_validation_result(self) -> ValidationResultArgs {
        self.result
    }
}
