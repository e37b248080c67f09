//! Shared application state.

use std::sync::Arc;

use esi_core::AccountStore;

use crate::Throttle;

/// State handed to every route.
#[derive(Debug, Clone)]
pub struct AppState {
    store: Arc<AccountStore>,
    throttle: Option<Throttle>,
}

impl AppState {
    /// Create state serving the given store, without rate limiting.
    #[must_use]
    pub fn new(store: AccountStore) -> Self {
        Self {
            store: Arc::new(store),
            throttle: None,
        }
    }

    /// Limit every client to the given rate.
    #[must_use]
    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// The account store.
    #[must_use]
    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Rate limit, if any.
    #[must_use]
    pub const fn throttle(&self) -> Option<&Throttle> {
        self.throttle.as_ref()
    }
}
