//! Per-state behaviour.
//!
//! One handler per [`GameState`]. Handlers are created lazily and cached in a
//! [`HandlerRegistry`] so that scratch memory (skill rotation, stuck counts)
//! survives across iterations of the same state.

mod battle;
mod context;
mod fire_mechanism;
mod force_exit;
mod main_menu;
mod navigating;
mod scripted;
mod selection;

pub use battle::BattleHandler;
pub use context::StateContext;
pub use fire_mechanism::FireMechanismHandler;
pub use force_exit::ForceExitHandler;
pub use main_menu::MainMenuHandler;
pub use navigating::NavigatingHandler;
pub use scripted::{ClosingUiHandler, ExploreDetailsHandler, InteractingHandler, RevivingHandler};
pub use selection::{BuffSelectionHandler, CandleSelectionHandler, RelicSelectionHandler};

use std::collections::HashMap;

use abyssrun_domain::{GameState, VisionSnapshot};
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The iteration token fired, or a delay saw the state change.
    #[error("Interrupted")]
    Interrupted,
    #[error("No handler for state {0}")]
    NoHandler(GameState),
    #[error("{state} handler failed: {message}")]
    Failed { state: GameState, message: String },
}

impl HandlerError {
    pub fn failed(state: GameState, message: impl Into<String>) -> Self {
        Self::Failed {
            state,
            message: message.into(),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted)
    }
}

#[async_trait]
pub trait StateHandler: Send {
    fn state(&self) -> GameState;

    /// One pass of the state's behaviour. `snapshot` is the latest vision
    /// snapshot at dispatch time.
    async fn execute(
        &mut self,
        ctx: &StateContext,
        snapshot: Option<&VisionSnapshot>,
        cancel: &CancellationToken,
    ) -> Result<(), HandlerError>;

    /// Called when an execution was cut short.
    fn cleanup(&mut self, _ctx: &StateContext) {}

    /// Forget per-state memory.
    fn reset(&mut self) {}
}

/// Build the handler for `state`, or `None` for states without behaviour.
pub fn create_handler(state: GameState, ctx: &StateContext) -> Option<Box<dyn StateHandler>> {
    let handler: Box<dyn StateHandler> = match state {
        GameState::MainMenu => Box::new(MainMenuHandler),
        GameState::SelectingBuff => Box::new(BuffSelectionHandler),
        GameState::SelectingCandle => Box::new(CandleSelectionHandler),
        GameState::SelectingRelic => Box::new(RelicSelectionHandler),
        GameState::Navigating => Box::new(NavigatingHandler),
        GameState::InBattle => Box::new(BattleHandler::new(ctx.settings.battle.clone())),
        GameState::Reviving => Box::new(RevivingHandler),
        GameState::ExploreDetails => Box::new(ExploreDetailsHandler),
        GameState::Interacting => Box::new(InteractingHandler),
        GameState::InteractingFireMechanism => Box::new(FireMechanismHandler),
        GameState::ClosingUI => Box::new(ClosingUiHandler),
        GameState::ForceExiting => Box::new(ForceExitHandler),
        GameState::Initializing | GameState::Error => return None,
    };
    Some(handler)
}

/// Cache of live handlers keyed by state.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<GameState, Box<dyn StateHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached handler for `state`, creating it on first use.
    pub fn get_or_create(
        &mut self,
        state: GameState,
        ctx: &StateContext,
    ) -> Result<&mut Box<dyn StateHandler>, HandlerError> {
        use std::collections::hash_map::Entry;

        match self.handlers.entry(state) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let handler = create_handler(state, ctx).ok_or(HandlerError::NoHandler(state))?;
                tracing::debug!(%state, "Created state handler");
                Ok(entry.insert(handler))
            }
        }
    }

    pub fn contains(&self, state: GameState) -> bool {
        self.handlers.contains_key(&state)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Drop the cached handler for `state`.
    pub fn reset(&mut self, state: GameState) {
        if let Some(mut handler) = self.handlers.remove(&state) {
            handler.reset();
        }
    }

    /// Drop every cached handler.
    pub fn reset_all(&mut self) {
        for (_, mut handler) in self.handlers.drain() {
            handler.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::TestRig;

    #[test]
    fn every_state_with_behaviour_gets_a_handler() {
        let rig = TestRig::new(GameState::MainMenu);
        let ctx = rig.context();
        for state in GameState::all() {
            let handler = create_handler(state, &ctx);
            assert_eq!(handler.is_some(), state.has_handler(), "{state}");
            if let Some(handler) = handler {
                assert_eq!(handler.state(), state);
            }
        }
    }

    #[test]
    fn registry_caches_and_resets() {
        let rig = TestRig::new(GameState::MainMenu);
        let ctx = rig.context();
        let mut registry = HandlerRegistry::new();

        registry.get_or_create(GameState::InBattle, &ctx).expect("battle");
        registry.get_or_create(GameState::InBattle, &ctx).expect("battle");
        registry.get_or_create(GameState::Navigating, &ctx).expect("navigating");
        assert_eq!(registry.len(), 2);

        registry.reset(GameState::InBattle);
        assert!(!registry.contains(GameState::InBattle));
        assert!(registry.contains(GameState::Navigating));

        registry.reset_all();
        assert!(registry.is_empty());
    }

    #[test]
    fn states_without_behaviour_are_rejected() {
        let rig = TestRig::new(GameState::MainMenu);
        let ctx = rig.context();
        let mut registry = HandlerRegistry::new();
        let err = registry
            .get_or_create(GameState::Error, &ctx)
            .err()
            .expect("no handler");
        assert!(matches!(err, HandlerError::NoHandler(GameState::Error)));
        assert!(!err.is_interrupted());
    }
}
