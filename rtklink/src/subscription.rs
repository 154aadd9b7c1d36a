//! Listener registry with token-based unsubscription.
//!
//! Both the radio inbound path and the correction tunnel fan values out to
//! in-process listeners. [`SubscriberSet`] keeps listeners in subscription
//! order and dispatches over a snapshot, so a listener may subscribe or
//! unsubscribe (itself included) while a dispatch is running.
//!
//! A listener that panics is logged and skipped; the remaining listeners
//! still receive the value.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

/// Shared listener callback.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned by `subscribe`, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl SubscriptionToken {
    /// Raw token value (stable for the lifetime of the set).
    pub fn id(&self) -> u64 {
        self.0
    }
}

struct Registry<T: ?Sized> {
    next_id: u64,
    listeners: Vec<(SubscriptionToken, Listener<T>)>,
}

/// Ordered set of listeners for values of type `T`.
pub struct SubscriberSet<T: ?Sized> {
    registry: Mutex<Registry<T>>,
}

impl<T: ?Sized> SubscriberSet<T> {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 1,
                listeners: Vec::new(),
            }),
        }
    }

    /// Register a listener. Listeners are called in subscription order.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionToken
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let token = SubscriptionToken(registry.next_id);
        registry.next_id += 1;
        registry.listeners.push((token, Arc::new(listener)));
        token
    }

    /// Remove a listener. Returns false if the token was not registered.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.listeners.len();
        registry.listeners.retain(|(t, _)| *t != token);
        registry.listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every listener.
    pub fn clear(&self) {
        self.registry.lock().listeners.clear();
    }

    /// Deliver a value to every listener registered when the dispatch started.
    ///
    /// Returns the number of listeners that panicked.
    pub fn dispatch(&self, value: &T) -> usize {
        let snapshot: Vec<(SubscriptionToken, Listener<T>)> = self.registry.lock().listeners.clone();

        let mut failures = 0;
        for (token, listener) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(value))).is_err() {
                failures += 1;
                warn!(
                    subscription = token.id(),
                    "Listener panicked, continuing delivery to remaining listeners"
                );
            }
        }
        failures
    }
}

impl<T: ?Sized> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self::new()
    }
}
