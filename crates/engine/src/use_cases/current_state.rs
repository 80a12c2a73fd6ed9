use std::sync::{Arc, PoisonError, RwLock};

use abyssrun_domain::GameState;

/// Thread-safe cell holding the active game state.
///
/// Readers get a copy. Only the orchestrator writes.
#[derive(Clone, Default)]
pub struct CurrentState {
    inner: Arc<RwLock<GameState>>,
}

impl CurrentState {
    pub fn new(initial: GameState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn get(&self) -> GameState {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `next`, returning the previous state.
    pub(crate) fn replace(&self, next: GameState) -> GameState {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}
