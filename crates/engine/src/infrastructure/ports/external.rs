//! External collaborator port traits (vision, capture, telemetry, input, window).
//!
//! All ports are synchronous. The sensing worker calls vision and capture
//! from a blocking thread; telemetry and actuator calls are short enough to
//! make inline from the control loop.

use std::sync::Arc;
use std::time::Duration;

use abyssrun_domain::{
    CameraPose, ClientSize, Entity, ScreenPoint, TelemetrySnapshot, Vector3, VisionSnapshot,
};

use super::error::{ActuatorError, CaptureError, TelemetryError, VisionError, WindowError};

// =============================================================================
// Capture + Vision
// =============================================================================

/// A captured image of the game client area.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    /// BGRA pixel data, row-major.
    pub pixels: Arc<[u8]>,
    /// Monotonic capture counter.
    pub sequence: u64,
}

impl CapturedFrame {
    pub fn new(width: u32, height: u32, pixels: Arc<[u8]>, sequence: u64) -> Self {
        Self {
            width,
            height,
            pixels,
            sequence,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ScreenCapturePort: Send + Sync {
    /// Capture the client area. `Ok(None)` means nothing to capture right
    /// now (window minimised, between frames).
    fn capture(&self) -> Result<Option<CapturedFrame>, CaptureError>;
}

#[cfg_attr(test, mockall::automock)]
pub trait VisionPort: Send + Sync {
    fn recognize(&self, frame: &CapturedFrame) -> Result<VisionSnapshot, VisionError>;
}

// =============================================================================
// Telemetry
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait TelemetryPort: Send + Sync {
    fn entities(&self) -> Result<Vec<Entity>, TelemetryError>;
    fn camera_pose(&self) -> Result<CameraPose, TelemetryError>;
    fn player_position(&self) -> Result<Vector3, TelemetryError>;

    /// Read everything in one go. Any failing read fails the snapshot.
    fn snapshot(&self) -> Result<TelemetrySnapshot, TelemetryError> {
        Ok(TelemetrySnapshot {
            camera: self.camera_pose()?,
            player_position: self.player_position()?,
            entities: self.entities()?,
        })
    }
}

// =============================================================================
// Input
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MouseButton::Left => write!(f, "left"),
            MouseButton::Right => write!(f, "right"),
        }
    }
}

/// Key names understood by every actuator.
pub mod keys {
    pub const FORWARD: &str = "W";
    pub const SPRINT: &str = "LSHIFT";
    pub const JUMP: &str = "SPACE";
    pub const INTERACT: &str = "F";
    pub const ESCAPE: &str = "ESCAPE";
    pub const REVIVE: &str = "X";
    pub const LOCK_ON: &str = "Z";
    pub const SKILL_Q: &str = "Q";
    pub const SKILL_E: &str = "E";
    /// Traversal ability used to start sprints and recover from stalls.
    pub const TRAVERSAL: &str = "4";
}

/// Synthetic keyboard and mouse input aimed at the game window.
#[cfg_attr(test, mockall::automock)]
pub trait ActuatorPort: Send + Sync {
    /// Press and release `key`, holding it for `hold`.
    fn send_key(&self, key: &str, hold: Duration) -> Result<(), ActuatorError>;
    fn key_down(&self, key: &str) -> Result<(), ActuatorError>;
    fn key_up(&self, key: &str) -> Result<(), ActuatorError>;
    fn click(&self, point: ScreenPoint) -> Result<(), ActuatorError>;
    fn mouse_down(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError>;
    fn mouse_up(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError>;
    fn move_cursor(&self, point: ScreenPoint) -> Result<(), ActuatorError>;
    fn send_relative_mouse_move(&self, dx: i32, dy: i32) -> Result<(), ActuatorError>;
    /// Bring the game window to the foreground.
    fn activate(&self) -> Result<(), ActuatorError>;
}

// =============================================================================
// Window
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait WindowPort: Send + Sync {
    fn client_size(&self) -> Result<ClientSize, WindowError>;
}
