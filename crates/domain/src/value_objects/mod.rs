//! Value objects - Immutable objects defined by their attributes

mod settings;

pub use settings::{
    BattleSettings, BotSettings, HotkeySettings, MovementSettings, TimeoutSettings,
    VisionSettings,
};
