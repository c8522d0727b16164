// File: property-validator/src/multi.rs
// Purpose: Composite rules that validate a nested object with its own rule set

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;

use crate::collection::RuleCollection;
use crate::error::Result;
use crate::notify::{Notifiable, Subscription};
use crate::rule::ValidationRule;

/// Consumer hook describing how a nested object is validated
///
/// ```rust,ignore
/// struct AddressRule;
///
/// impl MultiValidationRule<Address> for AddressRule {
///     fn configure_rules(&self, rules: RuleCollection<Address>) -> RuleCollection<Address> {
///         rules.add_rule(property!(Address, postal_code), PostalCodeRule)
///     }
/// }
///
/// // On the owner:
/// rules.add_rule(property!(Item, address, nested), CompositeRule::new(AddressRule));
/// ```
pub trait MultiValidationRule<T: Notifiable>: Send + Sync + 'static {
    /// Register the child rules on `rules`, whose target is the nested value
    fn configure_rules(&self, rules: RuleCollection<T>) -> RuleCollection<T>;

    /// Message reported when the nested value is absent
    fn missing_message(&self) -> String {
        "Value is required".to_string()
    }
}

struct ChildState<T> {
    rules: RuleCollection<T>,
    _watch: Subscription,
}

/// Adapter that turns a [`MultiValidationRule`] into a rule over the nested
/// value
///
/// The child collection is built on first validation and kept for the life of
/// the rule. Each evaluation runs the child rules against the value passed in,
/// so a replaced nested object is still checked with the current values.
pub struct CompositeRule<R, T> {
    rule: R,
    child: OnceLock<ChildState<T>>,
    _target: PhantomData<fn(&T)>,
}

impl<R, T> CompositeRule<R, T>
where
    R: MultiValidationRule<T>,
    T: Notifiable,
{
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            child: OnceLock::new(),
            _target: PhantomData,
        }
    }

    pub fn inner(&self) -> &R {
        &self.rule
    }

    /// Child rules, once built
    pub fn child_rules(&self) -> Option<&RuleCollection<T>> {
        self.child.get().map(|state| &state.rules)
    }

    fn child_for(&self, value: &Arc<T>) -> &RuleCollection<T> {
        let state = self.child.get_or_init(|| {
            let rules = self
                .rule
                .configure_rules(RuleCollection::new(Arc::clone(value)));
            tracing::debug!(
                target_type = value.type_name(),
                properties = rules.len(),
                "Built composite child rules"
            );

            let weak = rules.downgrade();
            let watch = value.notifier().subscribe(move |property| {
                let Some(rules) = weak.upgrade() else {
                    return;
                };
                if !rules.contains(property) {
                    return;
                }

                // A replaced grandchild value needs its forwarding re-bound
                rules.refresh_binding(property);
                tracing::trace!(property, "Composite child binding refreshed");
            });

            ChildState {
                rules,
                _watch: watch,
            }
        });

        &state.rules
    }

    fn check(&self, value: &Arc<T>) -> Result<Option<String>> {
        let result = self.child_for(value).evaluate_all_for(value)?;
        if !result.has_error() {
            return Ok(None);
        }

        let failures: IndexMap<&str, String> = result
            .errors()
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(property, messages)| (property.as_str(), messages.join(", ")))
            .collect();

        Ok(Some(render(&failures)))
    }

    fn describe(&self) -> String {
        let Some(rules) = self.child_rules() else {
            return self.rule.missing_message();
        };

        let described: IndexMap<String, String> = rules
            .rules()
            .into_iter()
            .map(|(property, rules)| {
                let messages: Vec<String> = rules.iter().map(|rule| rule.error()).collect();
                (property, messages.join(", "))
            })
            .collect();

        render(&described)
    }
}

fn render<K: serde::Serialize + std::hash::Hash + Eq>(map: &IndexMap<K, String>) -> String {
    match serde_json::to_string(map) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(error = %err, "Could not render nested errors");
            map.values().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

impl<R, T> ValidationRule<Arc<T>> for CompositeRule<R, T>
where
    R: MultiValidationRule<T>,
    T: Notifiable,
{
    fn is_valid(&self, value: &Arc<T>) -> bool {
        matches!(self.check(value), Ok(None))
    }

    fn error_message(&self) -> String {
        self.describe()
    }

    fn evaluate(&self, value: &Arc<T>) -> Option<String> {
        self.check(value).unwrap_or_else(|err| Some(err.to_string()))
    }

    fn try_evaluate(&self, value: &Arc<T>) -> Result<Option<String>> {
        self.check(value)
    }
}

impl<R, T> ValidationRule<Option<Arc<T>>> for CompositeRule<R, T>
where
    R: MultiValidationRule<T>,
    T: Notifiable,
{
    fn is_valid(&self, value: &Option<Arc<T>>) -> bool {
        matches!(ValidationRule::<Option<Arc<T>>>::try_evaluate(self, value), Ok(None))
    }

    fn error_message(&self) -> String {
        self.describe()
    }

    fn evaluate(&self, value: &Option<Arc<T>>) -> Option<String> {
        ValidationRule::<Option<Arc<T>>>::try_evaluate(self, value)
            .unwrap_or_else(|err| Some(err.to_string()))
    }

    fn try_evaluate(&self, value: &Option<Arc<T>>) -> Result<Option<String>> {
        match value {
            Some(value) => self.check(value),
            None => Ok(Some(self.rule.missing_message())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Field, PropertyNotifier};
    use crate::property;
    use crate::rule::rule_fn;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Address {
        notifier: PropertyNotifier,
        postal_code: Field<u32>,
        country: Field<String>,
    }

    impl Address {
        fn postal_code(&self) -> u32 {
            self.postal_code.get()
        }

        fn country(&self) -> String {
            self.country.get()
        }
    }

    impl Notifiable for Address {
        fn notifier(&self) -> &PropertyNotifier {
            &self.notifier
        }
    }

    struct AddressRule;

    impl MultiValidationRule<Address> for AddressRule {
        fn configure_rules(&self, rules: RuleCollection<Address>) -> RuleCollection<Address> {
            rules
                .add_rule(
                    property!(Address, postal_code),
                    rule_fn("Code is wrong mate", |code: &u32| (1000..10000).contains(code)),
                )
                .add_rule(
                    property!(Address, country),
                    rule_fn("Country required", |country: &String| !country.is_empty()),
                )
        }
    }

    fn address(code: u32, country: &str) -> Arc<Address> {
        let address = Address::default();
        address.postal_code.replace(code);
        address.country.replace(country.to_string());
        Arc::new(address)
    }

    #[test]
    fn test_valid_nested_value() {
        let rule = CompositeRule::new(AddressRule);
        assert!(ValidationRule::<Arc<Address>>::is_valid(&rule, &address(2000, "NL")));
        assert!(rule.child_rules().is_some());
    }

    #[test]
    fn test_failure_message_lists_failing_children() {
        let rule = CompositeRule::new(AddressRule);
        let message = ValidationRule::<Arc<Address>>::evaluate(&rule, &address(5, "NL")).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&message).unwrap();
        assert_eq!(parsed, serde_json::json!({ "postal_code": "Code is wrong mate" }));
    }

    #[test]
    fn test_none_is_invalid() {
        let rule = CompositeRule::new(AddressRule);
        let outcome = ValidationRule::<Option<Arc<Address>>>::evaluate(&rule, &None);

        assert_eq!(outcome.as_deref(), Some("Value is required"));
        assert!(rule.child_rules().is_none());
    }

    #[test]
    fn test_evaluates_value_passed_in() {
        let rule = CompositeRule::new(AddressRule);
        let first = address(2000, "NL");
        let second = address(1, "");

        assert!(ValidationRule::<Arc<Address>>::is_valid(&rule, &first));
        let message = ValidationRule::<Option<Arc<Address>>>::evaluate(&rule, &Some(second)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&message).unwrap();

        assert_eq!(parsed["postal_code"], "Code is wrong mate");
        assert_eq!(parsed["country"], "Country required");
    }

    #[test]
    fn test_error_message_describes_child_rules() {
        let rule = CompositeRule::new(AddressRule);
        assert_eq!(
            ValidationRule::<Arc<Address>>::error_message(&rule),
            "Value is required"
        );

        let _ = ValidationRule::<Arc<Address>>::is_valid(&rule, &address(2000, "NL"));
        let parsed: serde_json::Value =
            serde_json::from_str(&ValidationRule::<Arc<Address>>::error_message(&rule)).unwrap();
        assert_eq!(parsed["country"], "Country required");
    }

    #[test]
    fn test_child_tracks_edits_on_value() {
        let rule = CompositeRule::new(AddressRule);
        let value = address(2000, "NL");
        let _ = ValidationRule::<Arc<Address>>::is_valid(&rule, &value);

        assert_eq!(value.notifier.subscriber_count(), 1);
        value.postal_code.set(3, &value.notifier, "postal_code");
        assert!(!ValidationRule::<Arc<Address>>::is_valid(&rule, &value));
    }
}
