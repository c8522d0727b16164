// File: property-validator/src/debounce.rs
// Purpose: Shared, cancellable delay used to collapse bursts of changes

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

/// One debounce timer shared by every property of a service
///
/// Starting a window signals the previous one to give up. Cancellation is
/// cooperative: the superseded task wakes, sees the signal and returns.
#[derive(Debug, Default)]
pub(crate) struct Debouncer {
    pending: Mutex<Option<oneshot::Sender<()>>>,
}

impl Debouncer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Open a new window, cancelling the one in flight
    pub(crate) fn restart(&self) -> DebounceWindow {
        let (tx, rx) = oneshot::channel();
        let previous = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(tx);

        if let Some(previous) = previous {
            // The receiver is gone once that window finished; nothing to cancel then
            let _ = previous.send(());
        }

        DebounceWindow { cancelled: rx }
    }

    /// Cancel the window in flight, if any
    pub(crate) fn cancel(&self) {
        if let Some(previous) = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = previous.send(());
        }
    }
}

/// A single debounce window
pub(crate) struct DebounceWindow {
    cancelled: oneshot::Receiver<()>,
}

impl DebounceWindow {
    /// Wait out `delay`; returns false when a newer window superseded this one
    pub(crate) async fn elapsed(self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            // A dropped sender means the debouncer itself is gone; treat it
            // as a cancellation too
            _ = self.cancelled => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}
