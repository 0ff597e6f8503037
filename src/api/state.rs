//! Application state for the Tip Pool Engine API.

use std::sync::Arc;

use crate::engine::TipPoolEngine;
use crate::notify::BroadcastNotifier;
use crate::store::TipStore;

/// Shared application state.
///
/// Holds the engine behind an `Arc` so that cloning per request is cheap.
pub struct AppState<S: TipStore> {
    engine: Arc<TipPoolEngine<S, BroadcastNotifier>>,
}

impl<S: TipStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<S: TipStore> AppState<S> {
    /// Creates a new application state around an engine.
    pub fn new(engine: TipPoolEngine<S, BroadcastNotifier>) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &TipPoolEngine<S, BroadcastNotifier> {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_app_state_is_clone() {
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState<MemoryStore>>();
    }
}
