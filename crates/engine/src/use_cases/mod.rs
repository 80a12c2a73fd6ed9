//! Use cases - the behaviour of the bot.
//!
//! Perception goes in through the snapshot bus and telemetry port, decisions
//! are made by the decider, and the orchestrator drives one state handler at
//! a time.

pub mod current_state;
pub mod decider;
pub mod input;
pub mod navigation;
pub mod orchestrator;
pub mod states;
pub mod wait;

pub use current_state::CurrentState;
pub use decider::{DecisionInputs, DecisionProbe, StateDecider};
pub use input::InputDriver;
pub use navigation::{NavigationOutcome, Navigator};
pub use orchestrator::{LoopControl, Orchestrator};
pub use states::{HandlerError, HandlerRegistry, StateContext, StateHandler};
pub use wait::Waiter;

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}
