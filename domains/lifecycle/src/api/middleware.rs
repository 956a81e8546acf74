//! Lifecycle domain state

use crate::LifecycleStore;

/// Application state for the Lifecycle domain
#[derive(Clone)]
pub struct LifecycleState {
    pub store: LifecycleStore,
}

impl LifecycleState {
    pub fn new(store: LifecycleStore) -> Self {
        Self { store }
    }
}
