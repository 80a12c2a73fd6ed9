//! Best-effort input driver.
//!
//! Wraps the actuator port so callers never handle input errors: a failed
//! injection is logged and the action counts as attempted.

use std::sync::Arc;
use std::time::Duration;

use abyssrun_domain::ScreenPoint;

use crate::infrastructure::ports::{ActuatorError, ActuatorPort, MouseButton};

/// Hold time for a single key tap.
pub const TAP_HOLD: Duration = Duration::from_millis(100);

#[derive(Clone)]
pub struct InputDriver {
    actuator: Arc<dyn ActuatorPort>,
}

impl InputDriver {
    pub fn new(actuator: Arc<dyn ActuatorPort>) -> Self {
        Self { actuator }
    }

    /// Tap `key`.
    pub fn press(&self, key: &str) {
        self.send_key(key, TAP_HOLD);
    }

    pub fn send_key(&self, key: &str, hold: Duration) {
        log_failure("send_key", self.actuator.send_key(key, hold));
    }

    pub fn key_down(&self, key: &str) {
        log_failure("key_down", self.actuator.key_down(key));
    }

    pub fn key_up(&self, key: &str) {
        log_failure("key_up", self.actuator.key_up(key));
    }

    pub fn click(&self, point: ScreenPoint) {
        tracing::debug!(x = point.x, y = point.y, "Click");
        log_failure("click", self.actuator.click(point));
    }

    pub fn mouse_down(&self, point: ScreenPoint, button: MouseButton) {
        log_failure("mouse_down", self.actuator.mouse_down(point, button));
    }

    pub fn mouse_up(&self, point: ScreenPoint, button: MouseButton) {
        log_failure("mouse_up", self.actuator.mouse_up(point, button));
    }

    pub fn move_cursor(&self, point: ScreenPoint) {
        log_failure("move_cursor", self.actuator.move_cursor(point));
    }

    pub fn relative_move(&self, dx: i32, dy: i32) {
        log_failure("relative_mouse_move", self.actuator.send_relative_mouse_move(dx, dy));
    }

    pub fn activate(&self) {
        log_failure("activate", self.actuator.activate());
    }
}

fn log_failure(action: &'static str, result: Result<(), ActuatorError>) {
    if let Err(e) = result {
        tracing::warn!(action, error = %e, "Input injection failed, continuing");
    }
}
