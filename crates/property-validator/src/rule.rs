// File: property-validator/src/rule.rs
// Purpose: Typed validation rules and their registration-tagged, type-erased form

use std::any::{type_name, Any};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::Result;

/// A single predicate over a property value plus the message shown when it
/// fails
///
/// Rules are pure: evaluation returns its outcome and nothing is retained on
/// the rule, so one instance may be shared between collections and threads.
pub trait ValidationRule<T>: Send + Sync {
    fn is_valid(&self, value: &T) -> bool;

    fn error_message(&self) -> String;

    /// Message for a failing value, `None` when the value is valid
    fn evaluate(&self, value: &T) -> Option<String> {
        if self.is_valid(value) {
            None
        } else {
            Some(self.error_message())
        }
    }

    /// Like [`evaluate`](Self::evaluate), for rules whose evaluation can hit a
    /// binding error (composite rules reading nested properties)
    fn try_evaluate(&self, value: &T) -> Result<Option<String>> {
        Ok(self.evaluate(value))
    }
}

impl<T, R> ValidationRule<T> for Arc<R>
where
    R: ValidationRule<T> + ?Sized,
{
    fn is_valid(&self, value: &T) -> bool {
        (**self).is_valid(value)
    }

    fn error_message(&self) -> String {
        (**self).error_message()
    }

    fn evaluate(&self, value: &T) -> Option<String> {
        (**self).evaluate(value)
    }

    fn try_evaluate(&self, value: &T) -> Result<Option<String>> {
        (**self).try_evaluate(value)
    }
}

/// Rule built from a closure
pub struct PredicateRule<T, F> {
    message: String,
    predicate: F,
    _value: PhantomData<fn(&T)>,
}

/// Build a rule from a message and a predicate
///
/// ```rust
/// use property_validator::{rule_fn, ValidationRule};
///
/// let even = rule_fn("Must be even", |value: &i32| value % 2 == 0);
/// assert!(even.is_valid(&4));
/// assert_eq!(even.evaluate(&3).as_deref(), Some("Must be even"));
/// ```
pub fn rule_fn<T, F>(message: impl Into<String>, predicate: F) -> PredicateRule<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    PredicateRule {
        message: message.into(),
        predicate,
        _value: PhantomData,
    }
}

impl<T, F> ValidationRule<T> for PredicateRule<T, F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_valid(&self, value: &T) -> bool {
        (self.predicate)(value)
    }

    fn error_message(&self) -> String {
        self.message.clone()
    }
}

/// Outcome of a type-erased check before the message override is applied
enum ErasedOutcome {
    Valid,
    Invalid(String),
}

trait ErasedRule: Send + Sync {
    fn check(&self, value: &dyn Any) -> Result<ErasedOutcome>;
    fn error_message(&self) -> String;
    fn value_type(&self) -> &'static str;
}

struct TypedRule<T> {
    rule: Arc<dyn ValidationRule<T>>,
}

impl<T: Any + Send + Sync> ErasedRule for TypedRule<T> {
    fn check(&self, value: &dyn Any) -> Result<ErasedOutcome> {
        let outcome = if let Some(typed) = value.downcast_ref::<T>() {
            self.rule.try_evaluate(typed)?
        } else if let Some(optional) = value.downcast_ref::<Option<T>>() {
            match optional {
                Some(typed) => self.rule.try_evaluate(typed)?,
                // A missing value can't satisfy a rule over a non-optional type
                None => Some(self.rule.error_message()),
            }
        } else {
            tracing::warn!(
                expected = type_name::<T>(),
                "Property value type does not match rule; treating as invalid"
            );
            Some(self.rule.error_message())
        };

        Ok(match outcome {
            Some(message) => ErasedOutcome::Invalid(message),
            None => ErasedOutcome::Valid,
        })
    }

    fn error_message(&self) -> String {
        self.rule.error_message()
    }

    fn value_type(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A rule tagged with the property it was registered for
///
/// This is the unit stored in a rule collection. It accepts an opaque value
/// and converts it to the rule's value type before evaluating.
#[derive(Clone)]
pub struct RegisteredRule {
    property_name: String,
    error_message_override: Option<String>,
    rule: Arc<dyn ErasedRule>,
}

impl fmt::Debug for RegisteredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredRule")
            .field("property_name", &self.property_name)
            .field("error_message_override", &self.error_message_override)
            .field("value_type", &self.rule.value_type())
            .finish()
    }
}

impl RegisteredRule {
    pub(crate) fn new<T: Any + Send + Sync>(
        property_name: &str,
        error_message_override: Option<&str>,
        rule: Arc<dyn ValidationRule<T>>,
    ) -> Self {
        Self {
            property_name: property_name.to_string(),
            error_message_override: error_message_override.map(str::to_string),
            rule: Arc::new(TypedRule { rule }),
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    pub fn error_message_override(&self) -> Option<&str> {
        self.error_message_override.as_deref()
    }

    /// The rule's own message
    pub fn error_message(&self) -> String {
        self.rule.error_message()
    }

    /// Effective message: the override when one was given at registration
    pub fn error(&self) -> String {
        self.error_message_override
            .clone()
            .unwrap_or_else(|| self.rule.error_message())
    }

    /// Whether `value` satisfies the rule; conversion failures count as
    /// invalid, and so do binding errors raised by composite rules
    pub fn validate(&self, value: &dyn Any) -> bool {
        matches!(self.check(value), Ok(None))
    }

    /// Effective error message for a failing value, `None` when valid
    pub fn check(&self, value: &dyn Any) -> Result<Option<String>> {
        Ok(match self.rule.check(value)? {
            ErasedOutcome::Valid => None,
            ErasedOutcome::Invalid(detail) => {
                Some(self.error_message_override.clone().unwrap_or(detail))
            }
        })
    }

    /// Name of the value type the rule converts to
    pub fn value_type(&self) -> &'static str {
        self.rule.value_type()
    }
}

/// One or more rules for a single property
///
/// Implemented for tuples of up to six rules and for a prepared vector, so a
/// property's whole rule list is handed over in one registration call.
pub trait IntoRules<T> {
    fn into_rules(self) -> Vec<Arc<dyn ValidationRule<T>>>;
}

impl<T> IntoRules<T> for Vec<Arc<dyn ValidationRule<T>>> {
    fn into_rules(self) -> Vec<Arc<dyn ValidationRule<T>>> {
        self
    }
}

macro_rules! impl_into_rules_for_tuple {
    ($($rule:ident),+) => {
        impl<T, $($rule),+> IntoRules<T> for ($($rule,)+)
        where
            $($rule: ValidationRule<T> + 'static,)+
        {
            #[allow(non_snake_case)]
            fn into_rules(self) -> Vec<Arc<dyn ValidationRule<T>>> {
                let ($($rule,)+) = self;
                vec![$(Arc::new($rule) as Arc<dyn ValidationRule<T>>),+]
            }
        }
    };
}

impl_into_rules_for_tuple!(A);
impl_into_rules_for_tuple!(A, B);
impl_into_rules_for_tuple!(A, B, C);
impl_into_rules_for_tuple!(A, B, C, D);
impl_into_rules_for_tuple!(A, B, C, D, E);
impl_into_rules_for_tuple!(A, B, C, D, E, F);
