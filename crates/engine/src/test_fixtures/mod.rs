//! Shared test helpers: a simulated game, a recording actuator, entity
//! builders and a rig that wires them into waiters and handler contexts.

mod recording;
mod sim_game;

pub use recording::{InputEvent, RecordingActuator};
pub use sim_game::SimGame;

use std::sync::Arc;

use abyssrun_domain::{BotSettings, CameraPose, Entity, EntityId, GameState, Vector3};

use crate::infrastructure::ports::{ActuatorPort, TelemetryError, TelemetryPort};
use crate::infrastructure::snapshot_bus::SnapshotBus;
use crate::use_cases::current_state::CurrentState;
use crate::use_cases::decider::{DecisionProbe, StateDecider};
use crate::use_cases::input::InputDriver;
use crate::use_cases::navigation::Navigator;
use crate::use_cases::states::StateContext;
use crate::use_cases::wait::Waiter;

// =============================================================================
// Entity builders
// =============================================================================

pub fn entity(id: u64, class_name: &str, name: &str, position: Vector3) -> Entity {
    Entity {
        id: EntityId::new(id),
        class_name: class_name.to_string(),
        name: name.to_string(),
        position,
        is_actor: true,
        already_dead: false,
        can_open: false,
        open_state: false,
        parent_classes: Vec::new(),
    }
}

pub fn waypoint(id: u64, class_name: &str, position: Vector3) -> Entity {
    entity(id, class_name, "Delivery", position)
}

pub fn monster(id: u64, name: &str, position: Vector3) -> Entity {
    Entity {
        parent_classes: vec!["BP_MonsterCharacter_C".to_string()],
        ..entity(id, &format!("BP_Mon_{name}_C"), name, position)
    }
}

// =============================================================================
// Faulty adapters
// =============================================================================

/// Telemetry adapter whose every read panics.
pub struct PanickingTelemetry;

impl TelemetryPort for PanickingTelemetry {
    fn entities(&self) -> Result<Vec<Entity>, TelemetryError> {
        panic!("telemetry adapter bug")
    }

    fn camera_pose(&self) -> Result<CameraPose, TelemetryError> {
        panic!("telemetry adapter bug")
    }

    fn player_position(&self) -> Result<Vector3, TelemetryError> {
        panic!("telemetry adapter bug")
    }
}

// =============================================================================
// Rig
// =============================================================================

/// Bus, state cell and simulated game shared by one test.
///
/// The game starts empty, so only on-screen text drives decisions until a
/// test adds entities.
pub struct TestRig {
    pub bus: SnapshotBus,
    pub state: CurrentState,
    pub game: Arc<SimGame>,
    pub settings: Arc<BotSettings>,
}

impl TestRig {
    pub fn new(state: GameState) -> Self {
        Self::with_settings(state, BotSettings::default())
    }

    pub fn with_settings(state: GameState, settings: BotSettings) -> Self {
        Self {
            bus: SnapshotBus::new(),
            state: CurrentState::new(state),
            game: Arc::new(SimGame::at(Vector3::ZERO)),
            settings: Arc::new(settings),
        }
    }

    pub fn probe(&self) -> DecisionProbe {
        DecisionProbe::new(
            StateDecider::new(&self.settings.battle),
            self.game.clone(),
            self.game.clone(),
        )
    }

    pub fn input(&self) -> InputDriver {
        InputDriver::new(self.game.clone())
    }

    pub fn waiter(&self) -> Waiter {
        waiter_with(self, self.game.clone())
    }

    pub fn context(&self) -> StateContext {
        StateContext {
            input: self.input(),
            waiter: self.waiter(),
            navigator: Navigator::new(
                self.game.clone(),
                self.input(),
                self.game.clone(),
                self.settings.movement.clone(),
            ),
            telemetry: self.game.clone(),
            window: self.game.clone(),
            settings: Arc::clone(&self.settings),
        }
    }
}

/// A waiter on `rig`'s bus that clicks through `actuator`.
pub fn waiter_with(rig: &TestRig, actuator: Arc<dyn ActuatorPort>) -> Waiter {
    Waiter::new(
        rig.bus.clone(),
        rig.probe(),
        rig.state.clone(),
        InputDriver::new(actuator),
    )
}
