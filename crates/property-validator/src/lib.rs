// Property Validator - Reactive validation for change-notifying view models
// Declarative rules per property, debounced re-validation and a live error map

//! Attach named rules to the properties of an object that raises change
//! notifications, and observe violations as values change.
//!
//! ```rust,ignore
//! let service = ValidationService::new();
//! service
//!     .register(Arc::clone(&model), ValidationOptions::default().with_autofill(true))?
//!     .add_rule(property!(ItemsPage, name), StringRequiredRule::default())
//!     .add_rule(property!(ItemsPage, address, nested), CompositeRule::new(AddressRule));
//!
//! model.set_name("");
//! assert!(service.has_errors()?);
//! service.ensure_properties_are_valid()?;
//! ```

pub mod collection;
pub mod config;
mod debounce;
pub mod error;
pub mod error_map;
pub mod multi;
pub mod notify;
pub mod property;
pub mod result;
pub mod rule;
pub mod service;

// Registration
pub use collection::{RuleCollection, RuleSource};
pub use property::Property;

// Rules
pub use multi::{CompositeRule, MultiValidationRule};
pub use rule::{rule_fn, IntoRules, PredicateRule, RegisteredRule, ValidationRule};

// Notification contract
pub use notify::{Field, NestedValue, Notifiable, PropertyNotifier, PropertyValue, Subscription};

// Results and errors
pub use error::{PropertyException, Result, ValidationError};
pub use error_map::{join_formatter, ErrorFormatter, ErrorsView};
pub use result::ValidationResultArgs;

// Service
pub use config::{ValidationOptions, ValidatorToml};
pub use service::{ServiceState, ValidationService};
