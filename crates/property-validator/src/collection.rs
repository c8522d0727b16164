// File: property-validator/src/collection.rs
// Purpose: Per-target registry of property rules and nested change forwarding

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use indexmap::IndexMap;

use crate::error::{Result, ValidationError};
use crate::notify::{Notifiable, PropertyValue, Subscription, WeakNotifier};
use crate::property::{NestedGetter, Property};
use crate::result::ValidationResultArgs;
use crate::rule::{IntoRules, RegisteredRule, ValidationRule};

type ValueReader<M> = Arc<dyn Fn(&M) -> Result<PropertyValue> + Send + Sync>;

struct PropertyRules<M> {
    read: ValueReader<M>,
    rules: Vec<RegisteredRule>,
}

impl<M> Clone for PropertyRules<M> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
            rules: self.rules.clone(),
        }
    }
}

/// Forwarding from a nested object's notifications to its owning property
struct NestedBinding<M> {
    reach: NestedGetter<M>,
    watched: Option<(WeakNotifier, Subscription)>,
}

struct CollectionInner<M> {
    target: Arc<M>,
    properties: RwLock<IndexMap<String, PropertyRules<M>>>,
    bindings: Mutex<HashMap<String, NestedBinding<M>>>,
}

/// Rules registered for the properties of one target object
///
/// Cloning is cheap and every clone edits the same registry, so the handle
/// returned from registration can keep being extended after the service has
/// taken its own copy.
///
/// Registering a property that already has rules **replaces** its rule list.
pub struct RuleCollection<M> {
    inner: Arc<CollectionInner<M>>,
}

impl<M> Clone for RuleCollection<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> std::fmt::Debug for RuleCollection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleCollection").finish_non_exhaustive()
    }
}

impl<M: Notifiable> RuleCollection<M> {
    pub fn new(target: Arc<M>) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                target,
                properties: RwLock::new(IndexMap::new()),
                bindings: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn target(&self) -> &Arc<M> {
        &self.inner.target
    }

    /// Register a single rule for `property`
    pub fn add_rule<T, R>(self, property: Property<M, T>, rule: R) -> Self
    where
        T: Any + Send + Sync,
        R: ValidationRule<T> + 'static,
    {
        self.add_rules_with_message(property, None, (rule,))
    }

    /// Register the full rule list for `property`
    pub fn add_rules<T>(self, property: Property<M, T>, rules: impl IntoRules<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        self.add_rules_with_message(property, None, rules)
    }

    /// Register the full rule list for `property`, reporting `message`
    /// instead of each rule's own message when one fails
    pub fn add_rules_with_message<T>(
        self,
        property: Property<M, T>,
        message: Option<&str>,
        rules: impl IntoRules<T>,
    ) -> Self
    where
        T: Any + Send + Sync,
    {
        let getter = property.getter();
        let read: ValueReader<M> =
            Arc::new(move |model: &M| Ok(Box::new(getter(model)) as PropertyValue));

        self.insert(property.name(), message, rules.into_rules(), read);

        if let Some(reach) = property.nested_getter() {
            self.bind_nested(property.name(), reach);
        }

        self
    }

    /// Register rules for a property looked up by name through
    /// [`Notifiable::property`]
    pub fn add_rules_by_name<T>(
        self,
        name: &str,
        message: Option<&str>,
        rules: impl IntoRules<T>,
    ) -> Result<Self>
    where
        T: Any + Send + Sync,
    {
        let owner = self.inner.target.type_name();
        if self.inner.target.property(name).is_none() {
            return Err(ValidationError::MissingProperty {
                property: name.to_string(),
                owner,
            });
        }

        let property = name.to_string();
        let read: ValueReader<M> = Arc::new(move |model: &M| {
            model
                .property(&property)
                .ok_or_else(|| ValidationError::MissingProperty {
                    property: property.clone(),
                    owner,
                })
        });

        self.insert(name, message, rules.into_rules(), read);
        Ok(self)
    }

    fn insert<T>(
        &self,
        name: &str,
        message: Option<&str>,
        rules: Vec<Arc<dyn ValidationRule<T>>>,
        read: ValueReader<M>,
    ) where
        T: Any + Send + Sync,
    {
        let rules: Vec<RegisteredRule> = rules
            .into_iter()
            .map(|rule| RegisteredRule::new(name, message, rule))
            .collect();
        let count = rules.len();

        let replaced = self
            .inner
            .properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), PropertyRules { read, rules })
            .is_some();

        if replaced {
            // A replaced registration may no longer be nested
            self.lock_bindings().remove(name);
            tracing::debug!(property = name, rules = count, "Replaced property rules");
        } else {
            tracing::debug!(property = name, rules = count, "Registered property rules");
        }
    }

    /// Snapshot of every property's rules, in registration order
    pub fn rules(&self) -> IndexMap<String, Vec<RegisteredRule>> {
        self.read_properties()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.rules.clone()))
            .collect()
    }

    pub fn property_names(&self) -> Vec<String> {
        self.read_properties().keys().cloned().collect()
    }

    pub fn contains(&self, property: &str) -> bool {
        self.read_properties().contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.read_properties().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_properties().is_empty()
    }

    /// Evaluate one property of the collection's own target
    pub fn evaluate_property(&self, property: &str) -> Result<ValidationResultArgs> {
        self.evaluate_property_for(&self.inner.target, property)
    }

    /// Evaluate one property of `model` with this collection's rules
    pub fn evaluate_property_for(&self, model: &M, property: &str) -> Result<ValidationResultArgs> {
        let entry = self
            .read_properties()
            .get(property)
            .cloned()
            .ok_or_else(|| ValidationError::UnregisteredProperty(property.to_string()))?;

        let messages = evaluate_entry(model, &entry)?;
        Ok(ValidationResultArgs::for_property(property, messages))
    }

    /// Evaluate every property of the collection's own target
    pub fn evaluate_all(&self) -> Result<ValidationResultArgs> {
        self.evaluate_all_for(&self.inner.target)
    }

    /// Evaluate every property of `model`; only failing properties are listed
    pub fn evaluate_all_for(&self, model: &M) -> Result<ValidationResultArgs> {
        let entries: Vec<(String, PropertyRules<M>)> = self
            .read_properties()
            .iter()
            .map(|(name, entry)| (name.clone(), entry.clone()))
            .collect();

        let mut errors = IndexMap::new();
        for (name, entry) in entries {
            let messages = evaluate_entry(model, &entry)?;
            if !messages.is_empty() {
                tracing::trace!(property = %name, ?messages, "Property failed validation");
                errors.insert(name, messages);
            }
        }

        Ok(ValidationResultArgs::new(None, errors))
    }

    /// Re-point the nested binding of `property` at its current value
    ///
    /// Needed after the owner replaces a nested object: the old object is
    /// released and edits to the new one are forwarded instead.
    pub fn refresh_binding(&self, property: &str) {
        let mut bindings = self.lock_bindings();
        if let Some(binding) = bindings.get_mut(property) {
            self.watch(property, binding);
        }
    }

    /// Whether edits inside the current value of `property` are forwarded
    pub fn is_bound(&self, property: &str) -> bool {
        self.lock_bindings()
            .get(property)
            .is_some_and(|binding| binding.watched.is_some())
    }

    pub(crate) fn downgrade(&self) -> WeakRuleCollection<M> {
        WeakRuleCollection(Arc::downgrade(&self.inner))
    }

    fn bind_nested(&self, property: &str, reach: NestedGetter<M>) {
        let mut binding = NestedBinding {
            reach,
            watched: None,
        };
        self.watch(property, &mut binding);
        self.lock_bindings().insert(property.to_string(), binding);
    }

    fn watch(&self, property: &str, binding: &mut NestedBinding<M>) {
        let Some(nested) = (binding.reach)(&self.inner.target) else {
            if binding.watched.take().is_some() {
                tracing::debug!(property, "Nested value cleared; binding released");
            }
            return;
        };

        if let Some((watched, _)) = &binding.watched {
            if watched.points_to(&nested) {
                return;
            }
        }

        let owner: Weak<M> = Arc::downgrade(&self.inner.target);
        let reach = Arc::clone(&binding.reach);
        let watched = nested.downgrade();
        let sender = watched.clone();
        let owning_property = property.to_string();

        let subscription = nested.subscribe(move |changed| {
            let Some(owner) = owner.upgrade() else {
                return;
            };

            // The sender may have been swapped out of the owner since binding
            let current = reach(&owner).is_some_and(|value| sender.points_to(&value));
            if !current {
                tracing::trace!(property = %owning_property, changed, "Ignoring stale nested notification");
                return;
            }

            tracing::trace!(property = %owning_property, changed, "Forwarding nested change");
            owner.raise_property_changed(&owning_property);
        });

        tracing::debug!(property, "Bound nested change notifications");
        binding.watched = Some((watched, subscription));
    }

    fn read_properties(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, IndexMap<String, PropertyRules<M>>> {
        self.inner
            .properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_bindings(&self) -> std::sync::MutexGuard<'_, HashMap<String, NestedBinding<M>>> {
        self.inner
            .bindings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn evaluate_entry<M>(model: &M, entry: &PropertyRules<M>) -> Result<Vec<String>> {
    let value = (entry.read)(model)?;
    let mut messages = Vec::new();
    for rule in &entry.rules {
        if let Some(message) = rule.check(&*value)? {
            messages.push(message);
        }
    }
    Ok(messages)
}

/// Non-owning handle held by notification handlers
pub(crate) struct WeakRuleCollection<M>(Weak<CollectionInner<M>>);

impl<M> WeakRuleCollection<M> {
    pub(crate) fn upgrade(&self) -> Option<RuleCollection<M>> {
        self.0.upgrade().map(|inner| RuleCollection { inner })
    }
}

/// What the validation service needs from a rule collection, independent of
/// the target's type
pub trait RuleSource: Send + Sync {
    /// Current rules keyed by property name
    fn rules(&self) -> IndexMap<String, Vec<RegisteredRule>>;

    fn contains(&self, property: &str) -> bool;

    fn evaluate_property(&self, property: &str) -> Result<ValidationResultArgs>;

    fn evaluate_all(&self) -> Result<ValidationResultArgs>;

    fn refresh_binding(&self, property: &str);
}

impl<M: Notifiable> RuleSource for RuleCollection<M> {
    fn rules(&self) -> IndexMap<String, Vec<RegisteredRule>> {
        RuleCollection::rules(self)
    }

    fn contains(&self, property: &str) -> bool {
        RuleCollection::contains(self, property)
    }

    fn evaluate_property(&self, property: &str) -> Result<ValidationResultArgs> {
        RuleCollection::evaluate_property(self, property)
    }

    fn evaluate_all(&self) -> Result<ValidationResultArgs> {
        RuleCollection::evaluate_all(self)
    }

    fn refresh_binding(&self, property: &str) {
        RuleCollection::refresh_binding(self, property)
    }
}
