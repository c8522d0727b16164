// File: property-validator-demo/src/view_model.rs
// Purpose: Items page view model, its validation wiring and the submit flow

use std::sync::Arc;

use anyhow::Result;
use property_validator::{
    property, CompositeRule, Field, Notifiable, PropertyNotifier, PropertyValue,
    ValidationError, ValidationOptions, ValidationService,
};
use property_validator_rules::{EmailFormatRule, MaxLengthRule, MinLengthRule};

use crate::models::{Address, Item};
use crate::rules::{required, AddressRule, ItemRule};

/// Form state of the items page
///
/// Every validated property has a `<property>_error` sibling that auto-fill
/// writes the first error into.
#[derive(Debug, Default)]
pub struct ItemsPageViewModel {
    notifier: PropertyNotifier,

    first_name: Field<String>,
    last_name: Field<String>,
    email_address: Field<String>,
    physical_address: Field<Arc<Address>>,
    selected_item: Field<Option<Arc<Item>>>,

    first_name_error: Field<Option<String>>,
    last_name_error: Field<Option<String>>,
    email_address_error: Field<Option<String>>,
    physical_address_error: Field<Option<String>>,
    selected_item_error: Field<Option<String>>,
}

impl ItemsPageViewModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn first_name(&self) -> String {
        self.first_name.get()
    }

    pub fn last_name(&self) -> String {
        self.last_name.get()
    }

    pub fn email_address(&self) -> String {
        self.email_address.get()
    }

    pub fn physical_address(&self) -> Arc<Address> {
        self.physical_address.get()
    }

    pub fn selected_item(&self) -> Option<Arc<Item>> {
        self.selected_item.get()
    }

    pub fn set_first_name(&self, value: impl Into<String>) {
        self.first_name.set(value.into(), &self.notifier, "first_name");
    }

    pub fn set_last_name(&self, value: impl Into<String>) {
        self.last_name.set(value.into(), &self.notifier, "last_name");
    }

    pub fn set_email_address(&self, value: impl Into<String>) {
        self.email_address
            .set(value.into(), &self.notifier, "email_address");
    }

    pub fn set_physical_address(&self, address: Arc<Address>) {
        self.physical_address.replace(address);
        self.notifier.notify("physical_address");
    }

    pub fn set_selected_item(&self, item: Option<Arc<Item>>) {
        self.selected_item.replace(item);
        self.notifier.notify("selected_item");
    }

    pub fn error(&self, property: &str) -> Option<String> {
        match property {
            "first_name" => self.first_name_error.get(),
            "last_name" => self.last_name_error.get(),
            "email_address" => self.email_address_error.get(),
            "physical_address" => self.physical_address_error.get(),
            "selected_item" => self.selected_item_error.get(),
            _ => None,
        }
    }

    /// Error siblings rendered one per line, the way the page shows them
    pub fn error_summary(&self) -> String {
        FIELDS
            .iter()
            .map(|(property, label)| {
                format!("{}: {}", label, self.error(property).unwrap_or_default())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

const FIELDS: [(&str, &str); 5] = [
    ("first_name", "FirstName"),
    ("last_name", "LastName"),
    ("email_address", "EmailAddress"),
    ("physical_address", "PhysicalAddress"),
    ("selected_item", "SelectedItem"),
];

impl Notifiable for ItemsPageViewModel {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }

    fn property(&self, name: &str) -> Option<PropertyValue> {
        match name {
            "first_name" => Some(Box::new(self.first_name())),
            "last_name" => Some(Box::new(self.last_name())),
            "email_address" => Some(Box::new(self.email_address())),
            "physical_address" => Some(Box::new(self.physical_address())),
            "selected_item" => Some(Box::new(self.selected_item())),
            _ => None,
        }
    }

    fn set_text_property(&self, name: &str, value: Option<String>) -> bool {
        let field = match name {
            "first_name_error" => &self.first_name_error,
            "last_name_error" => &self.last_name_error,
            "email_address_error" => &self.email_address_error,
            "physical_address_error" => &self.physical_address_error,
            "selected_item_error" => &self.selected_item_error,
            _ => return false,
        };
        field.set(value, &self.notifier, name);
        true
    }
}

/// Outcome of pressing submit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected { message: String, summary: String },
}

/// The page: a view model plus the validation session bound to it
pub struct ItemsPage {
    view_model: Arc<ItemsPageViewModel>,
    validation: ValidationService,
    options: ValidationOptions,
}

impl ItemsPage {
    /// Bind validation to a fresh view model
    pub fn initialize(options: ValidationOptions) -> Result<Self> {
        let view_model = ItemsPageViewModel::new();
        let validation = ValidationService::new();

        validation
            .register(Arc::clone(&view_model), options.clone())?
            .add_rules(property!(ItemsPageViewModel, first_name), (required(), MinLengthRule::new(2)))
            .add_rules(property!(ItemsPageViewModel, last_name), (required(), MaxLengthRule::new(5)))
            .add_rules(
                property!(ItemsPageViewModel, email_address),
                (required(), EmailFormatRule::default()),
            )
            .add_rules_with_message(
                property!(ItemsPageViewModel, physical_address, nested),
                Some("Deez nuts!"),
                (CompositeRule::new(AddressRule),),
            )
            .add_rule(
                property!(ItemsPageViewModel, selected_item, nested),
                CompositeRule::new(ItemRule),
            );

        tracing::info!(
            autofill = options.autofill,
            delay = ?options.delay,
            "Items page initialized"
        );

        Ok(Self {
            view_model,
            validation,
            options,
        })
    }

    pub fn view_model(&self) -> &Arc<ItemsPageViewModel> {
        &self.view_model
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// Validate everything; on failure copy the errors onto the page and
    /// report them
    pub fn submit(&self) -> Result<SubmitOutcome> {
        match self.validation.ensure_properties_are_valid() {
            Ok(()) => {
                tracing::info!("Submit accepted");
                Ok(SubmitOutcome::Accepted)
            }
            Err(ValidationError::PropertiesInvalid(ex)) => {
                ex.validation_result()
                    .fill_error_properties(&*self.view_model, &self.options.error_suffix)?;

                tracing::info!(message = ex.message(), "Submit rejected");
                Ok(SubmitOutcome::Rejected {
                    message: ex.message().to_string(),
                    summary: self.view_model.error_summary(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
