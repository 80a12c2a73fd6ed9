use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// =============================================================================
// Game State
// =============================================================================

/// The mutually exclusive phases of one abyss run.
///
/// Exactly one state is current at any time. The orchestrator is the only
/// writer; everything else reads a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Initializing,
    #[default]
    MainMenu,
    SelectingBuff,
    SelectingCandle,
    SelectingRelic,
    Navigating,
    InBattle,
    Reviving,
    ExploreDetails,
    Interacting,
    InteractingFireMechanism,
    ClosingUI,
    ForceExiting,
    Error,
}

impl GameState {
    /// Stable snake_case name, shared by `Display`, `FromStr` and serde.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Initializing => "initializing",
            GameState::MainMenu => "main_menu",
            GameState::SelectingBuff => "selecting_buff",
            GameState::SelectingCandle => "selecting_candle",
            GameState::SelectingRelic => "selecting_relic",
            GameState::Navigating => "navigating",
            GameState::InBattle => "in_battle",
            GameState::Reviving => "reviving",
            GameState::ExploreDetails => "explore_details",
            GameState::Interacting => "interacting",
            GameState::InteractingFireMechanism => "interacting_fire_mechanism",
            GameState::ClosingUI => "closing_ui",
            GameState::ForceExiting => "force_exiting",
            GameState::Error => "error",
        }
    }

    /// States that have a behaviour handler attached.
    ///
    /// `Initializing` and `Error` are bookkeeping states; the orchestrator
    /// idles through them until the decider moves it elsewhere.
    pub fn has_handler(&self) -> bool {
        !matches!(self, GameState::Initializing | GameState::Error)
    }

    /// Whether the per-state timeout watchdog applies to this state.
    ///
    /// Force-exiting is the escape valve itself, so it is never timed out.
    pub fn is_timeout_exempt(&self) -> bool {
        matches!(self, GameState::ForceExiting)
    }

    /// Returns all states in declaration order.
    pub fn all() -> [GameState; 14] {
        [
            GameState::Initializing,
            GameState::MainMenu,
            GameState::SelectingBuff,
            GameState::SelectingCandle,
            GameState::SelectingRelic,
            GameState::Navigating,
            GameState::InBattle,
            GameState::Reviving,
            GameState::ExploreDetails,
            GameState::Interacting,
            GameState::InteractingFireMechanism,
            GameState::ClosingUI,
            GameState::ForceExiting,
            GameState::Error,
        ]
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GameState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        GameState::all()
            .into_iter()
            .find(|state| state.as_str() == normalized)
            .ok_or_else(|| DomainError::parse(format!("Unknown game state: {}", s)))
    }
}
