// File: property-validator/src/notify.rs
// Purpose: Property change notification contract for validated models

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

/// Opaque property value handed to type-erased rules
pub type PropertyValue = Box<dyn Any + Send>;

type Handler = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct NotifierInner {
    handlers: Mutex<Vec<(u64, Handler)>>,
    next_id: AtomicU64,
}

/// Multicast "property changed" event
///
/// Cloning yields another handle to the same handler list, so a model can hand
/// its notifier to collaborators without giving away the model itself.
#[derive(Clone, Default)]
pub struct PropertyNotifier {
    inner: Arc<NotifierInner>,
}

impl std::fmt::Debug for PropertyNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl PropertyNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; it stays attached until the returned
    /// [`Subscription`] is dropped
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));

        Subscription {
            notifier: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Raise a change notification for `property`
    ///
    /// Handlers run synchronously on a snapshot of the handler list, which
    /// lets a handler subscribe, unsubscribe or notify again without
    /// deadlocking.
    pub fn notify(&self, property: &str) {
        let handlers: Vec<Handler> = self
            .inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();

        for handler in handlers {
            handler(property);
        }
    }

    /// Number of attached handlers
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether both handles point at the same handler list
    pub fn same_as(&self, other: &PropertyNotifier) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakNotifier {
        WeakNotifier(Arc::downgrade(&self.inner))
    }
}

/// Non-owning reference used by forwarding closures to avoid handler cycles
#[derive(Clone)]
pub(crate) struct WeakNotifier(Weak<NotifierInner>);

impl WeakNotifier {
    pub(crate) fn points_to(&self, notifier: &PropertyNotifier) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&notifier.inner))
    }
}

/// Handle to an attached handler; detaches on drop
#[must_use = "dropping a Subscription detaches its handler"]
pub struct Subscription {
    notifier: Weak<NotifierInner>,
    id: u64,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.notifier.upgrade() {
            inner
                .handlers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|(id, _)| *id != self.id);
        }
    }
}

/// A model that raises property change notifications
///
/// Only `notifier` is required. `property` enables registration by a literal
/// name, and `set_text_property` enables auto-fill of `<property>_error`
/// siblings.
pub trait Notifiable: Send + Sync + 'static {
    fn notifier(&self) -> &PropertyNotifier;

    /// Raise a change notification for a named property
    fn raise_property_changed(&self, property: &str) {
        self.notifier().notify(property);
    }

    /// Read a property by name
    fn property(&self, _name: &str) -> Option<PropertyValue> {
        None
    }

    /// Write a string property by name, returning false when there is no
    /// such writable property
    fn set_text_property(&self, _name: &str, _value: Option<String>) -> bool {
        false
    }

    /// Type name reported in binding errors
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Property values that may carry a nested notifying object
pub trait NestedValue {
    fn nested_notifier(&self) -> Option<&PropertyNotifier>;
}

impl<N: Notifiable> NestedValue for Arc<N> {
    fn nested_notifier(&self) -> Option<&PropertyNotifier> {
        Some(self.notifier())
    }
}

impl<N: Notifiable> NestedValue for Option<Arc<N>> {
    fn nested_notifier(&self) -> Option<&PropertyNotifier> {
        self.as_ref().map(|nested| nested.notifier())
    }
}

/// Lock-backed storage for one model property
#[derive(Debug, Default)]
pub struct Field<T> {
    value: RwLock<T>,
}

impl<T> Field<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Overwrite the value without raising a notification
    pub fn replace(&self, value: T) -> T {
        let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, value)
    }

    /// Borrow the current value for the duration of `f`
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl<T: Clone> Field<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }
}

impl<T: PartialEq> Field<T> {
    /// Store `value` and notify `property` when it differs from the current
    /// value. The lock is released before handlers run.
    pub fn set(&self, value: T, notifier: &PropertyNotifier, property: &str) -> bool {
        {
            let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
            if *guard == value {
                return false;
            }
            *guard = value;
        }

        notifier.notify(property);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_notify_reaches_subscribers() {
        let notifier = PropertyNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = notifier.subscribe(move |name| sink.lock().unwrap().push(name.to_string()));

        notifier.notify("name");
        notifier.notify("age");

        assert_eq!(*seen.lock().unwrap(), vec!["name", "age"]);
    }

    #[test]
    fn test_dropping_subscription_detaches() {
        let notifier = PropertyNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let sub = notifier.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        notifier.notify("name");
        drop(sub);
        notifier.notify("name");

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn test_handler_may_notify_reentrantly() {
        let notifier = PropertyNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner = notifier.clone();
        let counter = Arc::clone(&hits);
        let _sub = notifier.subscribe(move |name| {
            counter.fetch_add(1, Ordering::SeqCst);
            if name == "name" {
                inner.notify("name_error");
            }
        });

        notifier.notify("name");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_field_set_only_notifies_on_change() {
        let notifier = PropertyNotifier::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = notifier.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let field = Field::new(String::new());
        assert!(field.set("ab".to_string(), &notifier, "name"));
        assert!(!field.set("ab".to_string(), &notifier, "name"));

        assert_eq!(field.get(), "ab");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_weak_notifier_identity() {
        let a = PropertyNotifier::new();
        let b = PropertyNotifier::new();
        let weak = a.downgrade();

        assert!(weak.points_to(&a));
        assert!(weak.points_to(&a.clone()));
        assert!(!weak.points_to(&b));
    }
}
