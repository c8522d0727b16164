// File: property-validator-demo/src/rules.rs
// Purpose: Page-specific leaf rules and the composite rules for nested models

use property_validator::{property, MultiValidationRule, RuleCollection, ValidationRule};
use property_validator_rules::{MaxLengthRule, RequiredRule};

use crate::models::{Address, Item};

/// Four-digit postal codes
pub struct PostalCodeRule;

impl ValidationRule<u32> for PostalCodeRule {
    fn is_valid(&self, value: &u32) -> bool {
        (1000..10_000).contains(value)
    }

    fn error_message(&self) -> String {
        "Code is wrong mate".to_string()
    }
}

/// ISO 3166-1 alpha-2 country code, upper case
pub struct CountryIsoCodeRule;

impl ValidationRule<String> for CountryIsoCodeRule {
    fn is_valid(&self, value: &String) -> bool {
        value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase())
    }

    fn error_message(&self) -> String {
        "Country must be a two-letter ISO code".to_string()
    }
}

pub fn required() -> RequiredRule {
    RequiredRule::with_message("Izz required!")
}

pub struct AddressRule;

impl MultiValidationRule<Address> for AddressRule {
    fn configure_rules(&self, rules: RuleCollection<Address>) -> RuleCollection<Address> {
        rules
            .add_rule(property!(Address, city), required())
            .add_rule(property!(Address, country_iso_code), CountryIsoCodeRule)
            .add_rule(property!(Address, postal_code), PostalCodeRule)
            .add_rules(
                property!(Address, street_address),
                (required(), MaxLengthRule::new(100)),
            )
    }
}

pub struct ItemRule;

impl MultiValidationRule<Item> for ItemRule {
    fn configure_rules(&self, rules: RuleCollection<Item>) -> RuleCollection<Item> {
        rules
            .add_rule(property!(Item, id), required())
            .add_rule(property!(Item, text), required())
            .add_rule(property!(Item, description), MaxLengthRule::new(20))
    }

    fn missing_message(&self) -> String {
        "Pick an item".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use property_validator::CompositeRule;
    use rstest::rstest;
    use std::sync::Arc;

    #[rstest]
    #[case(999, false)]
    #[case(1000, true)]
    #[case(9999, true)]
    #[case(10_000, false)]
    fn test_postal_code(#[case] code: u32, #[case] valid: bool) {
        assert_eq!(PostalCodeRule.is_valid(&code), valid);
    }

    #[rstest]
    #[case("NL", true)]
    #[case("nl", false)]
    #[case("NLD", false)]
    #[case("", false)]
    fn test_country_iso_code(#[case] code: &str, #[case] valid: bool) {
        assert_eq!(CountryIsoCodeRule.is_valid(&code.to_string()), valid);
    }

    #[test]
    fn test_address_rule_reports_failing_fields() {
        let address = Address::new();
        address.set_city("Delft");
        address.set_country_iso_code("NL");
        address.set_street_address("Markt 1");

        let rule = CompositeRule::new(AddressRule);
        let message = ValidationRule::<Arc<Address>>::evaluate(&rule, &address).unwrap_or_default();
        assert_eq!(message, r#"{"postal_code":"Code is wrong mate"}"#);

        address.set_postal_code(2611);
        assert!(ValidationRule::<Arc<Address>>::is_valid(&rule, &address));
    }

    #[test]
    fn test_item_rule() {
        let rule = CompositeRule::new(ItemRule);
        let item = Item::new("1", "Lamp", "A very long description indeed");

        let message = ValidationRule::<Option<Arc<Item>>>::evaluate(&rule, &Some(item)).unwrap_or_default();
        assert_eq!(message, r#"{"description":"Must be at most 20 characters"}"#);
        assert_eq!(
            ValidationRule::<Option<Arc<Item>>>::evaluate(&rule, &None).as_deref(),
            Some("Pick an item")
        );
    }
}
