// File: property-validator/src/service.rs
// Purpose: Validation session for one target: change pipeline, error map and push events

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::collection::{RuleCollection, RuleSource};
use crate::config::ValidationOptions;
use crate::debounce::Debouncer;
use crate::error::{PropertyException, Result, ValidationError};
use crate::error_map::{join_formatter, ErrorFormatter, ErrorMap, ErrorsView};
use crate::notify::{Notifiable, Subscription};
use crate::result::{fill_error, ValidationResultArgs};

const EVENT_CAPACITY: usize = 1000;

/// Lifecycle of a [`ValidationService`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// No target registered yet
    Unbound,
    /// Target registered, no validation pass has run
    Bound,
    /// Responding to change notifications
    Active,
    /// Session released; every operation fails
    Disposed,
}

struct Session {
    target: Arc<dyn Notifiable>,
    rules: Arc<dyn RuleSource>,
    options: ValidationOptions,
    runtime: Option<Handle>,
    active: AtomicBool,
    _subscription: Subscription,
}

enum Phase {
    Unbound,
    Bound(Arc<Session>),
    Disposed,
}

struct ServiceInner {
    phase: RwLock<Phase>,
    errors: ErrorMap,
    formatter: RwLock<Option<ErrorFormatter>>,
    events: broadcast::Sender<ValidationResultArgs>,
    debouncer: Debouncer,
}

/// Reactive validation for a single target object
///
/// A service is single-target and single-use: [`register`](Self::register)
/// binds it to a target once, after which every change notification for a
/// property with rules re-validates that property (after the configured
/// delay) and updates the live error map.
///
/// ```rust,ignore
/// let service = ValidationService::new();
/// service
///     .register(Arc::clone(&person), ValidationOptions::default())?
///     .add_rules(property!(Person, name), (StringRequiredRule::default(), MaxLengthRule::new(5)));
///
/// person.set_name("");
/// assert_eq!(service.error_for("name")?.as_deref(), Some("Field is required"));
/// ```
#[derive(Clone)]
pub struct ValidationService {
    inner: Arc<ServiceInner>,
}

impl Default for ValidationService {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationService")
            .field("state", &self.state())
            .field("errors", &self.inner.errors.view().snapshot())
            .finish()
    }
}

impl ValidationService {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(ServiceInner {
                phase: RwLock::new(Phase::Unbound),
                errors: ErrorMap::new(),
                formatter: RwLock::new(None),
                events,
                debouncer: Debouncer::new(),
            }),
        }
    }

    /// Bind the service to `target` and return the collection to register
    /// rules on
    ///
    /// Fails with [`ValidationError::AlreadyRegistered`] on a second call, and
    /// with [`ValidationError::RuntimeUnavailable`] when a delay is requested
    /// outside a Tokio runtime.
    pub fn register<M: Notifiable>(
        &self,
        target: Arc<M>,
        options: ValidationOptions,
    ) -> Result<RuleCollection<M>> {
        let options = ValidationOptions {
            delay: options.delay.filter(|delay| !delay.is_zero()),
            ..options
        };
        let mut phase = self
            .inner
            .phase
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match *phase {
            Phase::Unbound => {}
            Phase::Bound(_) => return Err(ValidationError::AlreadyRegistered),
            Phase::Disposed => return Err(ValidationError::Disposed),
        }

        let runtime = match options.delay {
            Some(_) => Some(Handle::try_current().map_err(|_| ValidationError::RuntimeUnavailable)?),
            None => None,
        };

        // A formatter set before registration wins over the configured separator
        self.inner
            .formatter
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert_with(|| join_formatter(options.separator.clone()));

        let rules = RuleCollection::new(Arc::clone(&target));

        let service: Weak<ServiceInner> = Arc::downgrade(&self.inner);
        let subscription = target.notifier().subscribe(move |property| {
            if let Some(service) = service.upgrade() {
                service.on_property_changed(property);
            }
        });

        tracing::debug!(
            target_type = target.type_name(),
            autofill = options.autofill,
            delay = ?options.delay,
            "Registered validation target"
        );

        *phase = Phase::Bound(Arc::new(Session {
            target,
            rules: Arc::new(rules.clone()),
            options,
            runtime,
            active: AtomicBool::new(false),
            _subscription: subscription,
        }));

        Ok(rules)
    }

    /// Re-validate every registered property and rebuild the error map
    ///
    /// Returns `true` when no property has an error.
    pub fn validate(&self) -> Result<bool> {
        let result = self.inner.validate_all("validate")?;
        Ok(!result.has_error())
    }

    /// Like [`validate`](Self::validate), but fails with a
    /// [`PropertyException`] carrying the full result when anything is invalid
    pub fn ensure_properties_are_valid(&self) -> Result<()> {
        let result = self.inner.validate_all("ensure_properties_are_valid")?;
        if result.has_error() {
            return Err(PropertyException::new(result).into());
        }
        Ok(())
    }

    /// Live view of the property → formatted error map
    pub fn get_errors(&self) -> Result<ErrorsView> {
        self.inner.session("get_errors")?;
        Ok(self.inner.errors.view())
    }

    /// Formatted error currently recorded for `property`
    pub fn error_for(&self, property: &str) -> Result<Option<String>> {
        self.inner.session("error_for")?;
        Ok(self.inner.errors.view().get(property))
    }

    pub fn has_errors(&self) -> Result<bool> {
        self.inner.session("has_errors")?;
        Ok(self.inner.errors.view().has_errors())
    }

    /// Replace the function that joins a property's messages in the error map
    ///
    /// Only the stored strings change; validity is unaffected.
    pub fn set_error_formatter<F>(&self, formatter: F)
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        *self
            .inner
            .formatter
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(formatter));
    }

    /// Push surface: one event per completed single-property pass
    ///
    /// With a delay configured, a burst of edits inside one window yields a
    /// single event.
    pub fn subscribe(&self) -> broadcast::Receiver<ValidationResultArgs> {
        self.inner.events.subscribe()
    }

    /// Run the single-property pipeline for `property` now
    pub fn revalidate(&self, property: &str) -> Result<ValidationResultArgs> {
        self.inner.revalidate(property)
    }

    pub fn state(&self) -> ServiceState {
        match &*self.inner.read_phase() {
            Phase::Unbound => ServiceState::Unbound,
            Phase::Bound(session) if session.active.load(Ordering::Acquire) => ServiceState::Active,
            Phase::Bound(_) => ServiceState::Bound,
            Phase::Disposed => ServiceState::Disposed,
        }
    }

    /// Detach from the target, cancel any pending debounce window and clear
    /// the error map
    pub fn dispose(&self) {
        let previous = std::mem::replace(
            &mut *self
                .inner
                .phase
                .write()
                .unwrap_or_else(PoisonError::into_inner),
            Phase::Disposed,
        );
        self.inner.debouncer.cancel();
        self.inner.errors.clear();

        if matches!(previous, Phase::Bound(_)) {
            tracing::debug!("Validation session disposed");
        }
    }
}

impl ServiceInner {
    fn read_phase(&self) -> std::sync::RwLockReadGuard<'_, Phase> {
        self.phase.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn session(&self, operation: &'static str) -> Result<Arc<Session>> {
        match &*self.read_phase() {
            Phase::Unbound => Err(ValidationError::NotRegistered { operation }),
            Phase::Bound(session) => Ok(Arc::clone(session)),
            Phase::Disposed => Err(ValidationError::Disposed),
        }
    }

    fn format(&self, session: &Session, messages: &[String]) -> String {
        let formatter = self
            .formatter
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        match formatter {
            Some(format) => format(messages),
            None => messages.join(&session.options.separator),
        }
    }

    fn on_property_changed(self: &Arc<Self>, property: &str) {
        let Ok(session) = self.session("on_property_changed") else {
            return;
        };

        if !session.rules.contains(property) {
            tracing::trace!(property, "Ignoring change to property without rules");
            return;
        }

        session.rules.refresh_binding(property);
        session.active.store(true, Ordering::Release);

        match (session.options.delay, &session.runtime) {
            (Some(delay), Some(runtime)) => {
                let window = self.debouncer.restart();
                let service = Arc::downgrade(self);
                let property = property.to_string();

                runtime.spawn(async move {
                    if !window.elapsed(delay).await {
                        tracing::trace!(property = %property, "Debounce window superseded");
                        return;
                    }

                    let Some(service) = service.upgrade() else {
                        return;
                    };
                    if let Err(err) = service.revalidate(&property) {
                        tracing::error!(property = %property, error = %err, "Validation pass failed");
                    }
                });
            }
            _ => {
                if let Err(err) = self.revalidate(property) {
                    tracing::error!(property, error = %err, "Validation pass failed");
                }
            }
        }
    }

    fn revalidate(&self, property: &str) -> Result<ValidationResultArgs> {
        let session = self.session("revalidate")?;
        let result = session.rules.evaluate_property(property)?;
        session.active.store(true, Ordering::Release);

        let messages = result.errors_for(property);
        let formatted = if messages.is_empty() {
            None
        } else {
            Some(self.format(&session, messages))
        };
        self.errors.set(property, formatted);

        if session.options.autofill {
            result.fill_error_properties(&*session.target, &session.options.error_suffix)?;
        }

        tracing::debug!(property, has_error = result.has_error(), "Property validated");

        // No receivers is not an error
        let _ = self.events.send(result.clone());
        Ok(result)
    }

    fn validate_all(&self, operation: &'static str) -> Result<ValidationResultArgs> {
        let session = self.session(operation)?;
        let result = session.rules.evaluate_all()?;
        session.active.store(true, Ordering::Release);

        let entries: IndexMap<String, String> = result
            .errors()
            .iter()
            .filter(|(_, messages)| !messages.is_empty())
            .map(|(property, messages)| (property.clone(), self.format(&session, messages)))
            .collect();
        self.errors.replace_all(entries);

        if session.options.autofill {
            for property in session.rules.rules().keys() {
                let first = result.errors_for(property).first().map(String::as_str);
                fill_error(&*session.target, property, &session.options.error_suffix, first)?;
            }
        }

        tracing::debug!(
            operation,
            failing = result.errors().len(),
            "Validated all properties"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Field, PropertyNotifier};
    use crate::property;
    use crate::rule::rule_fn;

    #[derive(Default)]
    struct Person {
        notifier: PropertyNotifier,
        name: Field<String>,
    }

    impl Person {
        fn name(&self) -> String {
            self.name.get()
        }

        fn set_name(&self, value: &str) {
            self.name.set(value.to_string(), &self.notifier, "name");
        }
    }

    impl Notifiable for Person {
        fn notifier(&self) -> &PropertyNotifier {
            &self.notifier
        }
    }

    #[test]
    fn test_operations_require_registration() {
        let service = ValidationService::new();

        assert!(matches!(
            service.validate(),
            Err(ValidationError::NotRegistered { operation: "validate" })
        ));
        assert!(matches!(
            service.get_errors(),
            Err(ValidationError::NotRegistered { .. })
        ));
        assert_eq!(service.state(), ServiceState::Unbound);
    }

    #[test]
    fn test_state_transitions() {
        let service = ValidationService::new();
        let person = Arc::new(Person::default());

        service
            .register(Arc::clone(&person), ValidationOptions::default())
            .unwrap()
            .add_rule(property!(Person, name), rule_fn("Izz required!", |v: &String| !v.is_empty()));
        assert_eq!(service.state(), ServiceState::Bound);

        person.set_name("ab");
        assert_eq!(service.state(), ServiceState::Active);

        service.dispose();
        assert_eq!(service.state(), ServiceState::Disposed);
        assert!(matches!(service.validate(), Err(ValidationError::Disposed)));
        assert_eq!(person.notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_delay_requires_runtime() {
        let service = ValidationService::new();
        let options = ValidationOptions::default().with_delay(std::time::Duration::from_millis(10));

        let err = service
            .register(Arc::new(Person::default()), options)
            .unwrap_err();
        assert!(matches!(err, ValidationError::RuntimeUnavailable));
        assert_eq!(service.state(), ServiceState::Unbound);
    }

    #[test]
    fn test_dropping_service_detaches_from_target() {
        let person = Arc::new(Person::default());
        {
            let service = ValidationService::new();
            let _ = service
                .register(Arc::clone(&person), ValidationOptions::default())
                .unwrap();
            assert_eq!(person.notifier.subscriber_count(), 1);
        }
        assert_eq!(person.notifier.subscriber_count(), 0);
        person.set_name("still fine");
    }

    #[test]
    fn test_dispose_clears_error_map() {
        let service = ValidationService::new();
        let _ = service
            .register(Arc::new(Person::default()), ValidationOptions::default())
            .unwrap()
            .add_rule(property!(Person, name), rule_fn("req", |v: &String| !v.is_empty()));

        assert!(!service.validate().unwrap());
        let view = service.get_errors().unwrap();
        assert_eq!(view.get("name").as_deref(), Some("req"));

        service.dispose();
        assert!(view.is_empty());
        assert!(!view.has_errors());
    }

    #[test]
    fn test_empty_message_still_fails() {
        let service = ValidationService::new();
        let _ = service
            .register(Arc::new(Person::default()), ValidationOptions::default())
            .unwrap()
            .add_rule(property!(Person, name), rule_fn("", |v: &String| !v.is_empty()));

        assert!(!service.validate().unwrap());
        assert!(service.has_errors().unwrap());
        assert!(matches!(
            service.ensure_properties_are_valid(),
            Err(ValidationError::PropertiesInvalid(_))
        ));
    }

    #[test]
    fn test_zero_delay_validates_immediately() {
        let service = ValidationService::new();
        let person = Arc::new(Person::default());
        let options = ValidationOptions {
            delay: Some(std::time::Duration::ZERO),
            ..ValidationOptions::default()
        };

        let _ = service
            .register(Arc::clone(&person), options)
            .unwrap()
            .add_rule(property!(Person, name), rule_fn("req", |v: &String| v.len() > 1));

        person.set_name("a");
        assert_eq!(service.error_for("name").unwrap().as_deref(), Some("req"));
    }
}
