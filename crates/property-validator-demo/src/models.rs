// File: property-validator-demo/src/models.rs
// Purpose: Change-notifying models edited on the items page

use std::sync::Arc;

use property_validator::{Field, Notifiable, PropertyNotifier};

/// Postal address shown as a nested form section
#[derive(Debug, Default)]
pub struct Address {
    notifier: PropertyNotifier,
    postal_code: Field<u32>,
    street_address: Field<String>,
    city: Field<String>,
    country_iso_code: Field<String>,
}

impl Address {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn postal_code(&self) -> u32 {
        self.postal_code.get()
    }

    pub fn street_address(&self) -> String {
        self.street_address.get()
    }

    pub fn city(&self) -> String {
        self.city.get()
    }

    pub fn country_iso_code(&self) -> String {
        self.country_iso_code.get()
    }

    pub fn set_postal_code(&self, value: u32) {
        self.postal_code.set(value, &self.notifier, "postal_code");
    }

    pub fn set_street_address(&self, value: impl Into<String>) {
        self.street_address
            .set(value.into(), &self.notifier, "street_address");
    }

    pub fn set_city(&self, value: impl Into<String>) {
        self.city.set(value.into(), &self.notifier, "city");
    }

    pub fn set_country_iso_code(&self, value: impl Into<String>) {
        self.country_iso_code
            .set(value.into(), &self.notifier, "country_iso_code");
    }
}

impl Notifiable for Address {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }
}

/// Catalogue entry selectable on the items page
#[derive(Debug, Default)]
pub struct Item {
    notifier: PropertyNotifier,
    id: Field<String>,
    text: Field<String>,
    description: Field<String>,
}

impl Item {
    pub fn new(id: &str, text: &str, description: &str) -> Arc<Self> {
        let item = Self::default();
        item.id.replace(id.to_string());
        item.text.replace(text.to_string());
        item.description.replace(description.to_string());
        Arc::new(item)
    }

    pub fn id(&self) -> String {
        self.id.get()
    }

    pub fn text(&self) -> String {
        self.text.get()
    }

    pub fn description(&self) -> String {
        self.description.get()
    }

    pub fn set_text(&self, value: impl Into<String>) {
        self.text.set(value.into(), &self.notifier, "text");
    }

    pub fn set_description(&self, value: impl Into<String>) {
        self.description
            .set(value.into(), &self.notifier, "description");
    }
}

impl Notifiable for Item {
    fn notifier(&self) -> &PropertyNotifier {
        &self.notifier
    }
}
