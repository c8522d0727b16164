// File: property-validator/src/error_map.rs
// Purpose: Persistent property → formatted error map with a live read-only view

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::watch;

/// Joins a property's failing messages into the string stored in the error map
pub type ErrorFormatter = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// Formatter that joins messages with `separator`
pub fn join_formatter(separator: impl Into<String>) -> ErrorFormatter {
    let separator = separator.into();
    Arc::new(move |messages: &[String]| messages.join(&separator))
}

/// The service-owned, mutable side of the error map
pub(crate) struct ErrorMap {
    tx: watch::Sender<IndexMap<String, String>>,
}

impl ErrorMap {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(IndexMap::new());
        Self { tx }
    }

    /// Replace one property's entry; `None` removes it
    pub(crate) fn set(&self, property: &str, message: Option<String>) {
        self.tx.send_if_modified(|map| match message {
            Some(message) => map.insert(property.to_string(), message.clone()).as_ref() != Some(&message),
            None => map.shift_remove(property).is_some(),
        });
    }

    /// Rebuild the whole map from a fresh pass
    pub(crate) fn replace_all(&self, entries: IndexMap<String, String>) {
        self.tx.send_if_modified(|map| {
            if *map == entries {
                return false;
            }
            *map = entries;
            true
        });
    }

    pub(crate) fn clear(&self) {
        self.replace_all(IndexMap::new());
    }

    pub(crate) fn view(&self) -> ErrorsView {
        ErrorsView {
            rx: self.tx.subscribe(),
        }
    }
}

/// Live, read-only view of the error map
///
/// Reads always see the latest validation state; no re-fetch is needed after
/// a validation pass. `changed` waits for the next mutation.
#[derive(Debug, Clone)]
pub struct ErrorsView {
    rx: watch::Receiver<IndexMap<String, String>>,
}

impl ErrorsView {
    pub fn get(&self, property: &str) -> Option<String> {
        self.rx.borrow().get(property).cloned()
    }

    pub fn contains_key(&self, property: &str) -> bool {
        self.rx.borrow().contains_key(property)
    }

    pub fn len(&self) -> usize {
        self.rx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.borrow().is_empty()
    }

    /// Whether any property is failing; entries exist only for failing
    /// properties, even when their formatted message is empty
    pub fn has_errors(&self) -> bool {
        !self.rx.borrow().is_empty()
    }

    /// Copy of the current map
    pub fn snapshot(&self) -> IndexMap<String, String> {
        self.rx.borrow().clone()
    }

    /// Wait until the map changes; fails once the owning service is gone
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}
