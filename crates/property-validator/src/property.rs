// File: property-validator/src/property.rs
// Purpose: Typed property accessors used to register rules

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::notify::{NestedValue, PropertyNotifier};

type Getter<M, T> = Arc<dyn Fn(&M) -> T + Send + Sync>;
pub(crate) type NestedGetter<M> = Arc<dyn Fn(&M) -> Option<PropertyNotifier> + Send + Sync>;

/// Canonical name plus typed getter for one property of `M`
///
/// Usually built with the [`property!`](crate::property!) macro, which uses
/// the accessor method's identifier as the property name.
pub struct Property<M, T> {
    name: Cow<'static, str>,
    getter: Getter<M, T>,
    nested: Option<NestedGetter<M>>,
}

impl<M, T> Clone for Property<M, T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            getter: Arc::clone(&self.getter),
            nested: self.nested.clone(),
        }
    }
}

impl<M, T> fmt::Debug for Property<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("nested", &self.nested.is_some())
            .finish()
    }
}

impl<M, T> Property<M, T> {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, getter: F) -> Self
    where
        F: Fn(&M) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            nested: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, model: &M) -> T {
        (self.getter)(model)
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    pub(crate) fn getter(&self) -> Getter<M, T> {
        Arc::clone(&self.getter)
    }

    pub(crate) fn nested_getter(&self) -> Option<NestedGetter<M>> {
        self.nested.clone()
    }
}

impl<M: 'static, T: NestedValue + 'static> Property<M, T> {
    /// Property whose value is itself a notifying object; edits inside it are
    /// reported as changes of this property
    pub fn nested<F>(name: impl Into<Cow<'static, str>>, getter: F) -> Self
    where
        F: Fn(&M) -> T + Send + Sync + 'static,
    {
        let getter: Getter<M, T> = Arc::new(getter);
        let reach = Arc::clone(&getter);
        let nested: NestedGetter<M> =
            Arc::new(move |model: &M| reach(model).nested_notifier().cloned());

        Self {
            name: name.into(),
            getter,
            nested: Some(nested),
        }
    }
}

/// Build a [`Property`] from a model type and an accessor method
///
/// ```rust,ignore
/// property!(Person, name)            // Property<Person, _> named "name"
/// property!(Person, address, nested) // forwards edits inside `address`
/// ```
#[macro_export]
macro_rules! property {
    ($model:ty, $accessor:ident) => {
        $crate::Property::new(stringify!($accessor), |model: &$model| model.$accessor())
    };
    ($model:ty, $accessor:ident, nested) => {
        $crate::Property::nested(stringify!($accessor), |model: &$model| model.$accessor())
    };
}
