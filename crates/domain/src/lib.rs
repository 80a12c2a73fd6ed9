//! abyssrun domain types.
//!
//! Everything in this crate is plain data plus pure functions over it: the
//! closed set of game states, the two perception snapshots (vision and
//! telemetry), engine-space geometry, navigation targets and the tunable
//! settings. No I/O and no async live here; the engine crate owns both.

pub mod error;
pub mod game_state;
pub mod geometry;
pub mod markers;
pub mod navigation;
pub mod telemetry;
pub mod value_objects;
pub mod vision;

pub use error::DomainError;
pub use game_state::GameState;
pub use geometry::{normalize_angle, rotation_to_target, Rotator, Vector3};
pub use navigation::NavigationTarget;
pub use telemetry::{CameraPose, Entity, EntityId, TelemetrySnapshot, WaypointKind};
pub use value_objects::{
    BattleSettings, BotSettings, HotkeySettings, MovementSettings, TimeoutSettings,
    VisionSettings,
};
pub use vision::{ClientSize, ScreenPoint, TextMatch, TextRegion, VisionSnapshot};
