//! Bot settings value object
//!
//! Every tunable number the engine uses lives here. Settings are read from
//! a JSON file at startup, so every section and field carries a serde
//! default: a partial file (or no file at all) yields a usable
//! configuration.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// All configurable bot settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BotSettings {
    pub hotkeys: HotkeySettings,
    pub timeouts: TimeoutSettings,
    pub battle: BattleSettings,
    pub vision: VisionSettings,
    pub movement: MovementSettings,
}

impl BotSettings {
    /// Check cross-field invariants the engine relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        let m = &self.movement;
        if m.interact_distance <= 0.0 {
            return Err(DomainError::validation("movement.interact_distance must be positive"));
        }
        if !(m.interact_distance < m.approach_distance && m.approach_distance < m.sprint_distance)
        {
            return Err(DomainError::validation(
                "movement bands must satisfy interact < approach < sprint",
            ));
        }
        if m.sprint_distance >= m.abandon_distance {
            return Err(DomainError::validation(
                "movement.abandon_distance must exceed sprint_distance",
            ));
        }
        if !(0.0..=1.0).contains(&m.stall_ratio) {
            return Err(DomainError::validation("movement.stall_ratio must be within 0..=1"));
        }
        if m.mouse_sensitivity <= 0.0 {
            return Err(DomainError::validation("movement.mouse_sensitivity must be positive"));
        }
        if m.align_max_iterations == 0 {
            return Err(DomainError::validation("movement.align_max_iterations must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.vision.confidence_threshold) {
            return Err(DomainError::validation("vision.confidence_threshold must be within 0..=1"));
        }
        if self.timeouts.state_timeout_secs == 0 {
            return Err(DomainError::validation("timeouts.state_timeout_secs must be positive"));
        }
        Ok(())
    }
}

// ============================================================================
// Hotkeys
// ============================================================================

/// Key names for the operator hotkeys. Registration is left to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HotkeySettings {
    /// Stops the runner
    pub stop: String,
    /// Abandons the current abyss run
    pub force_exit_abyss: String,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            stop: "F10".to_string(),
            force_exit_abyss: "F12".to_string(),
        }
    }
}

// ============================================================================
// Timeouts
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Time a state may stay current before the run is force-exited
    pub state_timeout_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            state_timeout_secs: 300,
        }
    }
}

// ============================================================================
// Battle
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BattleSettings {
    /// Radius (engine units) in which hostiles and way-points are considered
    pub monster_detection_range: f64,
    /// Distance beyond which the bot runs toward its target before fighting
    pub approach_distance: f64,
    pub q_skill_interval_ms: u64,
    pub e_skill_count: u32,
    pub e_skill_interval_ms: u64,
    /// How long the attack button is held per swing
    pub attack_interval_ms: u64,
    pub attack_count: u32,
    pub attack_recovery_ms: u64,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            monster_detection_range: 30000.0,
            approach_distance: 3000.0,
            q_skill_interval_ms: 1000,
            e_skill_count: 4,
            e_skill_interval_ms: 1000,
            attack_interval_ms: 350,
            attack_count: 3,
            attack_recovery_ms: 50,
        }
    }
}

// ============================================================================
// Vision
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisionSettings {
    pub interval_ms: u64,
    pub confidence_threshold: f32,
    pub min_text_length: usize,
    /// Log every recognised region at debug level
    pub show_recognition_results: bool,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            confidence_threshold: 0.5,
            min_text_length: 1,
            show_recognition_results: false,
        }
    }
}

// ============================================================================
// Movement
// ============================================================================

/// Navigation and camera tuning. Distances are engine units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementSettings {
    /// At or below this the target counts as reached
    pub interact_distance: f64,
    /// Pre-check success radius for targets that need no interaction
    pub arrival_distance: f64,
    /// Upper bound of the hop-while-walking band
    pub approach_distance: f64,
    /// Beyond this the bot sprints
    pub sprint_distance: f64,
    /// Navigation gives up when the target gets further than this
    pub abandon_distance: f64,
    /// A distance increase larger than this counts as a position reset
    pub position_reset_jump: f64,
    pub position_reset_limit: u32,
    pub stuck_check_interval_ms: u64,
    /// Net movement below this between stuck checks means stuck
    pub stuck_displacement: f64,
    pub realign_interval_ms: u64,
    pub realign_distance_change: f64,
    pub stall_checkpoint_secs: u64,
    /// Fraction of the initial distance still remaining at the checkpoint
    /// that counts as stalled
    pub stall_ratio: f64,
    /// Target this much higher than the player triggers a recovery jump
    pub height_threshold: f64,
    pub height_cooldown_ms: u64,
    /// Interact presses at arrival before declaring success
    pub max_interact_presses: u32,
    pub scan_interval_ms: u64,
    pub tick_ms: u64,
    /// Degrees of camera rotation per pixel of relative mouse movement
    pub mouse_sensitivity: f64,
    pub max_mouse_step: f64,
    pub align_threshold_deg: f64,
    pub align_max_iterations: u32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            interact_distance: 350.0,
            arrival_distance: 500.0,
            approach_distance: 600.0,
            sprint_distance: 2000.0,
            abandon_distance: 20000.0,
            position_reset_jump: 1000.0,
            position_reset_limit: 3,
            stuck_check_interval_ms: 5000,
            stuck_displacement: 100.0,
            realign_interval_ms: 8000,
            realign_distance_change: 100.0,
            stall_checkpoint_secs: 30,
            stall_ratio: 0.7,
            height_threshold: 50.0,
            height_cooldown_ms: 1000,
            max_interact_presses: 10,
            scan_interval_ms: 25,
            tick_ms: 10,
            mouse_sensitivity: 0.2,
            max_mouse_step: 200.0,
            align_threshold_deg: 0.5,
            align_max_iterations: 20,
        }
    }
}
