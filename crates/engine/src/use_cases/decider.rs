//! State decider - maps perception to the state the bot should be in.
//!
//! A first-match-wins cascade over the vision snapshot and (when present)
//! the telemetry snapshot. `None` means "nothing overrides the current
//! state". The cascade is ordered so that blocking overlays and menus win
//! over everything, mechanisms and way-points win over combat, and combat
//! only triggers when nothing else explains the screen.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use abyssrun_domain::markers;
use abyssrun_domain::{
    BattleSettings, ClientSize, Entity, GameState, TelemetrySnapshot, VisionSnapshot,
};

use crate::infrastructure::ports::{TelemetryPort, WindowPort};
use crate::use_cases::panic_message;

/// Everything besides the vision snapshot that a decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInputs<'a> {
    /// `None` when telemetry could not be read this tick.
    pub telemetry: Option<&'a TelemetrySnapshot>,
    pub client_size: ClientSize,
}

impl<'a> DecisionInputs<'a> {
    pub fn new(telemetry: Option<&'a TelemetrySnapshot>, client_size: ClientSize) -> Self {
        Self {
            telemetry,
            client_size,
        }
    }

    pub fn vision_only(client_size: ClientSize) -> Self {
        Self::new(None, client_size)
    }
}

/// Pure state decision cascade.
#[derive(Debug, Clone)]
pub struct StateDecider {
    /// Radius for hostiles and way-points
    detection_range: f64,
    /// Fire mechanisms are considered within three times this
    approach_distance: f64,
}

impl StateDecider {
    pub fn new(battle: &BattleSettings) -> Self {
        Self {
            detection_range: battle.monster_detection_range,
            approach_distance: battle.approach_distance,
        }
    }

    pub fn decide(
        &self,
        current: GameState,
        vision: &VisionSnapshot,
        inputs: &DecisionInputs<'_>,
    ) -> Option<GameState> {
        if vision.contains_any(&[markers::DIVE_INTO_ABYSS, markers::LAND_OF_PARADISE]) {
            return Some(GameState::MainMenu);
        }

        if vision.contains_any(&markers::CLOSE_OVERLAY_MARKERS) {
            return Some(GameState::ClosingUI);
        }

        // Force-exit runs its script to completion; only menus and overlays
        // above may interrupt it.
        if current == GameState::ForceExiting {
            return None;
        }

        if vision
            .regions
            .iter()
            .any(|r| r.text.contains(markers::REVIVE) && !r.text.contains(markers::RELIC_OBTAINED))
        {
            return Some(GameState::Reviving);
        }

        if vision.contains(markers::EXPLORE_DETAILS) {
            return Some(GameState::ExploreDetails);
        }

        if vision.contains(markers::LAST_EXPLORED) {
            return Some(GameState::SelectingBuff);
        }

        if vision.contains(markers::SELECT_CANDLE) {
            return Some(GameState::SelectingCandle);
        }

        if let Some(telemetry) = inputs.telemetry {
            let mechanism_radius = self.approach_distance * 3.0;
            if telemetry.has_within(mechanism_radius, |e| {
                e.is_open_fire_mechanism() || e.is_turret()
            }) {
                return Some(GameState::InteractingFireMechanism);
            }
        }

        let has_navigation_marker = vision.contains_any(&markers::NAVIGATION_MARKERS);
        if has_navigation_marker {
            let waypoint_nearby = inputs
                .telemetry
                .is_some_and(|t| t.has_within(self.detection_range, Entity::is_waypoint));
            if waypoint_nearby {
                return Some(GameState::Navigating);
            }
            if current == GameState::Navigating {
                return None;
            }
        }

        if current != GameState::InBattle && self.battle_detected(vision, inputs, has_navigation_marker)
        {
            return Some(GameState::InBattle);
        }

        let main_menu_visible = vision.contains_any(&markers::MAIN_MENU_MARKERS)
            || vision
                .find_where(markers::CONTINUE_EXPLORATION, |r| {
                    inputs.client_size.in_bottom_right_corner(r.center)
                })
                .is_some();
        if main_menu_visible && !has_navigation_marker && current != GameState::MainMenu {
            return Some(GameState::MainMenu);
        }

        None
    }

    fn battle_detected(
        &self,
        vision: &VisionSnapshot,
        inputs: &DecisionInputs<'_>,
        has_navigation_marker: bool,
    ) -> bool {
        if vision.contains_any(&markers::BATTLE_MARKERS) {
            return true;
        }
        let Some(telemetry) = inputs.telemetry else {
            return false;
        };
        let hostile_nearby = telemetry.has_within(self.detection_range, Entity::is_live_hostile);
        hostile_nearby
            && !vision.contains_any(&markers::NON_COMBAT_SCREEN_MARKERS)
            && !has_navigation_marker
    }
}

/// Runs the decider against live ports.
///
/// Telemetry and window failures (panicking adapters included) degrade to
/// "no telemetry" and the default client size; the decision itself never
/// fails.
#[derive(Clone)]
pub struct DecisionProbe {
    decider: Arc<StateDecider>,
    telemetry: Arc<dyn TelemetryPort>,
    window: Arc<dyn WindowPort>,
}

impl DecisionProbe {
    pub fn new(
        decider: StateDecider,
        telemetry: Arc<dyn TelemetryPort>,
        window: Arc<dyn WindowPort>,
    ) -> Self {
        Self {
            decider: Arc::new(decider),
            telemetry,
            window,
        }
    }

    pub fn evaluate(&self, current: GameState, vision: &VisionSnapshot) -> Option<GameState> {
        let telemetry = match catch_unwind(AssertUnwindSafe(|| self.telemetry.snapshot())) {
            Ok(Ok(snapshot)) => Some(snapshot),
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Telemetry unavailable for decision");
                None
            }
            Err(panic) => {
                tracing::error!(
                    panic = %panic_message(panic.as_ref()),
                    "Telemetry adapter panicked during decision"
                );
                None
            }
        };
        let client_size = match catch_unwind(AssertUnwindSafe(|| self.window.client_size())) {
            Ok(Ok(size)) => size,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "Client size unavailable, assuming default");
                ClientSize::default()
            }
            Err(panic) => {
                tracing::error!(
                    panic = %panic_message(panic.as_ref()),
                    "Window adapter panicked during decision"
                );
                ClientSize::default()
            }
        };
        self.decider.decide(
            current,
            vision,
            &DecisionInputs::new(telemetry.as_ref(), client_size),
        )
    }
}
