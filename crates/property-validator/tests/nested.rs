// Integration tests for nested objects and composite rules

use std::sync::Arc;

use pretty_assertions::assert_eq;
use property_validator::{
    property, rule_fn, CompositeRule, Field, MultiValidationRule, Notifiable, PropertyNotifier,
    RuleCollection, ValidationOptions, ValidationService,
};
use rstest::*;

const BAD_CODE: &str = "Code is wrong mate";
const NO_CITY: &str = "City is required";

#[derive(Default)]
struct Address {
    notifier: PropertyNotifier,
    postal_code: Field<u32>,
    city: Field<String>,
}

impl Address {
    fn new(postal_code: u32, city: &str) -> Arc<Self> {
        let address = Self::default();
        address.postal_code.replace(postal_code);
        address.city.replace(city.to_string());
        Arc::new(address)
    }

    fn postal_code(&self) -> u32 {
        self.postal_code.get()
    }

    fn city(&self) -> String {
        self.city.get()
    }

    fn set_postal_code(&self, value: u32) {
        self.postal_code.set(value, &self.notifier, "postal_code");
    }

    fn set_city(&self, value: &str) {
        self.city.set(value.to_string(), &self.notifier, "city");
    }
}

impl Notifiable for Address {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }
}

#[derive(Default)]
struct Order {
    notifier: PropertyNotifier,
    address: Field<Option<Arc<Address>>>,
}

impl Order {
    fn with_address(address: Arc<Address>) -> Arc<Self> {
        let order = Self::default();
        order.address.replace(Some(address));
        Arc::new(order)
    }

    fn address(&self) -> Option<Arc<Address>> {
        self.address.get()
    }

    fn set_address(&self, address: Option<Arc<Address>>) {
        self.address.replace(address);
        self.notifier.notify("address");
    }
}

impl Notifiable for Order {
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
                rule_fn(BAD_CODE, |code: &u32| (1000..10000).contains(code)),
            )
            .add_rule(
                property!(Address, city),
                rule_fn(NO_CITY, |city: &String| !city.is_empty()),
            )
    }

    fn missing_message(&self) -> String {
        "Address is required".to_string()
    }
}

fn bind(order: &Arc<Order>) -> ValidationService {
    let service = ValidationService::new();
    service
        .register(Arc::clone(order), ValidationOptions::default())
        .unwrap()
        .add_rule(property!(Order, address, nested), CompositeRule::new(AddressRule));
    service
}

fn address_error(service: &ValidationService) -> Option<serde_json::Value> {
    service
        .error_for("address")
        .unwrap()
        .map(|message| serde_json::from_str(&message).unwrap())
}

#[fixture]
fn address() -> Arc<Address> {
    Address::new(2000, "Utrecht")
}

#[rstest]
fn test_nested_edit_revalidates_owner(address: Arc<Address>) {
    let order = Order::with_address(Arc::clone(&address));
    let service = bind(&order);

    address.set_postal_code(20);
    assert_eq!(
        address_error(&service),
        Some(serde_json::json!({ "postal_code": BAD_CODE }))
    );

    address.set_city("");
    assert_eq!(
        address_error(&service),
        Some(serde_json::json!({ "postal_code": BAD_CODE, "city": NO_CITY }))
    );

    address.set_postal_code(2500);
    address.set_city("Delft");
    assert_eq!(address_error(&service), None);
}

#[rstest]
fn test_replaced_nested_object_is_rebound(address: Arc<Address>) {
    let order = Order::with_address(Arc::clone(&address));
    let service = bind(&order);

    let replacement = Address::new(3000, "Leiden");
    order.set_address(Some(Arc::clone(&replacement)));
    assert_eq!(address_error(&service), None);

    // Edits to the detached object no longer reach the owner
    address.set_postal_code(1);
    assert_eq!(address_error(&service), None);

    replacement.set_postal_code(1);
    assert_eq!(
        address_error(&service),
        Some(serde_json::json!({ "postal_code": BAD_CODE }))
    );
}

#[rstest]
fn test_missing_nested_object_is_invalid() {
    let order = Arc::new(Order::default());
    let service = bind(&order);

    assert!(!service.validate().unwrap());
    assert_eq!(
        service.error_for("address").unwrap().as_deref(),
        Some("Address is required")
    );
}

#[rstest]
fn test_validate_checks_nested_rules(address: Arc<Address>) {
    let order = Order::with_address(Arc::clone(&address));
    let service = bind(&order);

    assert!(service.validate().unwrap());

    address.city.replace(String::new());
    let err = service.ensure_properties_are_valid().unwrap_err();
    let result = err.validation_result().unwrap();
    let message: serde_json::Value = serde_json::from_str(&result.errors_for("address")[0]).unwrap();
    assert_eq!(message, serde_json::json!({ "city": NO_CITY }));
}

#[rstest]
fn test_disposed_service_releases_nested_forwarding(address: Arc<Address>) {
    let order = Order::with_address(Arc::clone(&address));
    let service = bind(&order);
    assert_eq!(order.notifier.subscriber_count(), 1);

    service.dispose();
    assert_eq!(order.notifier.subscriber_count(), 0);
    assert_eq!(address.notifier.subscriber_count(), 0);
}
