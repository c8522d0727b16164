// File: property-validator/src/result.rs
// Purpose: Structured outcome of a validation pass

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::notify::Notifiable;

/// Per-property error messages produced by one validation pass
///
/// `property_name` is set when the pass covered a single property (push
/// notifications); bulk passes leave it empty and list every property with at
/// least one failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResultArgs {
    property_name: Option<String>,
    errors: IndexMap<String, Vec<String>>,
}

impl ValidationResultArgs {
    pub fn new(property_name: Option<String>, errors: IndexMap<String, Vec<String>>) -> Self {
        Self {
            property_name,
            errors,
        }
    }

    /// Result for a single property; an empty list means the property passed
    pub fn for_property(property_name: &str, messages: Vec<String>) -> Self {
        let mut errors = IndexMap::new();
        errors.insert(property_name.to_string(), messages);
        Self::new(Some(property_name.to_string()), errors)
    }

    pub fn property_name(&self) -> Option<&str> {
        self.property_name.as_deref()
    }

    /// Full property → messages map
    pub fn errors(&self) -> &IndexMap<String, Vec<String>> {
        &self.errors
    }

    pub fn errors_for(&self, property: &str) -> &[String] {
        self.errors.get(property).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Messages of the first failing property
    pub fn error_messages(&self) -> Option<&[String]> {
        self.errors
            .values()
            .find(|messages| !messages.is_empty())
            .map(Vec::as_slice)
    }

    /// First non-empty message across all properties, for display
    pub fn first_error(&self) -> Option<&str> {
        self.errors
            .values()
            .flatten()
            .find(|message| !message.is_empty())
            .map(String::as_str)
    }

    /// A violated rule counts even when its message is empty
    pub fn has_error(&self) -> bool {
        self.errors.values().any(|messages| !messages.is_empty())
    }

    /// Write first errors into `<property><suffix>` string properties of
    /// `model`
    ///
    /// A single-property result touches only that property's sibling; a bulk
    /// result touches every listed property. Passing properties get `None`.
    pub fn fill_error_properties(&self, model: &dyn Notifiable, suffix: &str) -> Result<()> {
        match &self.property_name {
            Some(property) => fill_error(model, property, suffix, self.first_error()),
            None => {
                for (property, messages) in &self.errors {
                    fill_error(model, property, suffix, messages.first().map(String::as_str))?;
                }
                Ok(())
            }
        }
    }
}

pub(crate) fn fill_error(
    model: &dyn Notifiable,
    property: &str,
    suffix: &str,
    message: Option<&str>,
) -> Result<()> {
    let error_property = format!("{}{}", property, suffix);
    if model.set_text_property(&error_property, message.map(str::to_string)) {
        Ok(())
    } else {
        Err(ValidationError::MissingErrorProperty {
            property: error_property,
            owner: model.type_name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Field, PropertyNotifier};
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Form {
        notifier: PropertyNotifier,
        name_error: Field<Option<String>>,
    }

    impl Notifiable for Form {
        fn notifier(&self) -> &PropertyNotifier {
            &self.notifier
        }

        fn set_text_property(&self, name: &str, value: Option<String>) -> bool {
            match name {
                "name_error" => {
                    self.name_error.set(value, &self.notifier, name);
                    true
                }
                _ => false,
            }
        }
    }

    fn bulk(entries: Vec<(&str, Vec<&str>)>) -> ValidationResultArgs {
        let mut errors = IndexMap::new();
        for (name, messages) in entries {
            let messages: Vec<String> = messages.into_iter().map(str::to_string).collect();
            errors.insert(name.to_string(), messages);
        }
        ValidationResultArgs::new(None, errors)
    }

    #[test]
    fn test_first_error_skips_empty_lists() {
        let result = bulk(vec![("name", vec![]), ("email", vec!["Bad email", "Too long"])]);

        assert_eq!(result.first_error(), Some("Bad email"));
        assert_eq!(result.error_messages().unwrap().len(), 2);
        assert!(result.has_error());
    }

    #[test]
    fn test_empty_message_counts_as_error() {
        let result = bulk(vec![("name", vec![""]), ("email", vec!["", "Bad email"])]);

        assert!(result.has_error());
        assert_eq!(result.error_messages().unwrap(), &["".to_string()]);
        assert_eq!(result.first_error(), Some("Bad email"));

        let silent = ValidationResultArgs::for_property("name", vec![String::new()]);
        assert!(silent.has_error());
        assert_eq!(silent.first_error(), None);
    }

    #[test]
    fn test_passing_property_has_no_error() {
        let result = ValidationResultArgs::for_property("name", Vec::new());

        assert!(!result.has_error());
        assert_eq!(result.first_error(), None);
        assert_eq!(result.property_name(), Some("name"));
        assert!(result.errors_for("name").is_empty());
    }

    #[test]
    fn test_fill_error_properties_writes_sibling() {
        let form = Form::default();
        let result = ValidationResultArgs::for_property("name", vec!["Izz required!".into()]);

        result.fill_error_properties(&form, "_error").unwrap();
        assert_eq!(form.name_error.get().as_deref(), Some("Izz required!"));

        ValidationResultArgs::for_property("name", Vec::new())
            .fill_error_properties(&form, "_error")
            .unwrap();
        assert_eq!(form.name_error.get(), None);
    }

    #[test]
    fn test_fill_error_properties_missing_sibling() {
        let form = Form::default();
        let result = bulk(vec![("email", vec!["Bad email"])]);

        let err = result.fill_error_properties(&form, "_error").unwrap_err();
        match err {
            ValidationError::MissingErrorProperty { property, owner } => {
                assert_eq!(property, "email_error");
                assert!(owner.ends_with("Form"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_serializes_as_map() {
        let result = ValidationResultArgs::for_property("name", vec!["Izz required!".into()]);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["property_name"], "name");
        assert_eq!(json["errors"]["name"][0], "Izz required!");
    }
}
