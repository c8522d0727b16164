// File: property-validator/src/config.rs
// Purpose: Registration options and their TOML form

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Options accepted by [`ValidationService::register`](crate::ValidationService::register)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Write each property's first error into its `<property><error_suffix>`
    /// sibling on the target
    pub autofill: bool,

    /// Debounce delay applied before re-validating a changed property
    pub delay: Option<Duration>,

    /// Suffix of auto-filled error properties
    pub error_suffix: String,

    /// Separator used by the default error formatter
    pub separator: String,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            autofill: false,
            delay: None,
            error_suffix: default_error_suffix(),
            separator: default_separator(),
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_autofill(mut self, autofill: bool) -> Self {
        self.autofill = autofill;
        self
    }

    /// A zero delay means no debounce, as `delay_ms = 0` does in the file form
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = (!delay.is_zero()).then_some(delay);
        self
    }

    pub fn with_error_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.error_suffix = suffix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }
}

/// TOML configuration, either at the top level of a file or under
/// `[validation]`
///
/// ```toml
/// [validation]
/// autofill = true
/// delay_ms = 700
/// error_suffix = "_error"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorToml {
    #[serde(default)]
    pub autofill: bool,

    /// Debounce delay in milliseconds; omitted or 0 means no delay
    #[serde(default)]
    pub delay_ms: Option<u64>,

    #[serde(default = "default_error_suffix")]
    pub error_suffix: String,

    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for ValidatorToml {
    fn default() -> Self {
        Self {
            autofill: false,
            delay_ms: None,
            error_suffix: default_error_suffix(),
            separator: default_separator(),
        }
    }
}

#[derive(Deserialize)]
struct ValidatorFile {
    validation: Option<ValidatorToml>,
}

impl ValidatorToml {
    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse TOML text; a `[validation]` table wins over top-level keys
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ValidatorFile = toml::from_str(content)?;
        match file.validation {
            Some(section) => Ok(section),
            None => Ok(toml::from_str(content)?),
        }
    }

    /// Convert to runtime options
    pub fn to_options(&self) -> ValidationOptions {
        ValidationOptions {
            autofill: self.autofill,
            delay: self
                .delay_ms
                .filter(|millis| *millis > 0)
                .map(Duration::from_millis),
            error_suffix: self.error_suffix.clone(),
            separator: self.separator.clone(),
        }
    }
}

fn default_error_suffix() -> String {
    "_error".to_string()
}

fn default_separator() -> String {
    ", ".to_string()
}
