//! Change notification for configuration consumers.
//!
//! Notifications carry no payload: a subscriber re-reads the store when
//! called.

use std::sync::{Arc, Mutex, PoisonError};

/// Callback invoked after every committed change.
pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ConfigObservers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Kept in registration order; ids are strictly increasing.
    subscribers: Vec<(SubscriptionId, ChangeCallback)>,
}

/// Ordered list of change subscribers.
#[derive(Default)]
pub struct ConfigObservers {
    registry: Mutex<Registry>,
}

impl ConfigObservers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, callback: ChangeCallback) -> SubscriptionId {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.push((id, callback));
        id
    }

    /// Removes a subscriber. Returns false if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.subscribers.len();
        registry.subscribers.retain(|(sub_id, _)| *sub_id != id);
        registry.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls every subscriber in registration order.
    ///
    /// The list is snapshotted first and the lock released, so callbacks may
    /// subscribe, unsubscribe or trigger further changes.
    pub fn notify(&self) {
        let callbacks: Vec<ChangeCallback> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .subscribers
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };

        for callback in callbacks {
            callback();
        }
    }
}

impl std::fmt::Debug for ConfigObservers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigObservers")
            .field("subscribers", &self.len())
            .finish()
    }
}
