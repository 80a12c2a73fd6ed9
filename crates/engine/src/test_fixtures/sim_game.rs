//! A tiny kinematic game simulation.
//!
//! Implements the telemetry, actuator and window ports at once. Holding the
//! forward key moves the player along the camera yaw (faster with sprint
//! held), relative mouse moves turn the camera with the same sensitivity the
//! navigator assumes, and time is tokio time so paused-clock tests advance
//! the simulation deterministically.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use abyssrun_domain::{normalize_angle, CameraPose, ClientSize, Entity, Rotator, ScreenPoint, Vector3};
use tokio::time::Instant;

use super::recording::{InputEvent, RecordingActuator};
use crate::infrastructure::ports::{
    keys, ActuatorError, ActuatorPort, MouseButton, TelemetryError, TelemetryPort, WindowError,
    WindowPort,
};

const WALK_SPEED: f64 = 600.0;
const SPRINT_SPEED: f64 = 1200.0;
const DEGREES_PER_PIXEL: f64 = 0.2;
const PITCH_LIMIT: f64 = 89.0;

struct SimState {
    position: Vector3,
    rotation: Rotator,
    last_update: Instant,
    frozen: bool,
    camera_locked: bool,
    connected: bool,
    entities: Vec<Entity>,
    size: ClientSize,
}

pub struct SimGame {
    state: Mutex<SimState>,
    recorder: RecordingActuator,
}

impl SimGame {
    /// Player at `position`, camera looking along +x.
    pub fn at(position: Vector3) -> Self {
        Self {
            state: Mutex::new(SimState {
                position,
                rotation: Rotator::default(),
                last_update: Instant::now(),
                frozen: false,
                camera_locked: false,
                connected: true,
                entities: Vec::new(),
                size: ClientSize::new(1920, 1080),
            }),
            recorder: RecordingActuator::default(),
        }
    }

    pub fn recorder(&self) -> &RecordingActuator {
        &self.recorder
    }

    pub fn position(&self) -> Vector3 {
        self.advance().position
    }

    pub fn rotation(&self) -> Rotator {
        self.advance().rotation
    }

    pub fn set_rotation(&self, rotation: Rotator) {
        self.advance().rotation = rotation;
    }

    pub fn teleport(&self, position: Vector3) {
        self.advance().position = position;
    }

    /// The player ignores movement keys from now on.
    pub fn freeze(&self) {
        self.advance().frozen = true;
    }

    /// Mouse moves no longer turn the camera.
    pub fn lock_camera(&self) {
        self.advance().camera_locked = true;
    }

    /// Every telemetry read fails from now on.
    pub fn disconnect(&self) {
        self.advance().connected = false;
    }

    pub fn set_entities(&self, entities: Vec<Entity>) {
        self.advance().entities = entities;
    }

    /// Integrate movement up to now and hand out the state.
    fn advance(&self) -> MutexGuard<'_, SimState> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(state.last_update);
        state.last_update = now;

        if !state.frozen && self.recorder.is_key_held(keys::FORWARD) {
            let speed = if self.recorder.is_key_held(keys::SPRINT) {
                SPRINT_SPEED
            } else {
                WALK_SPEED
            };
            let step = speed * elapsed.as_secs_f64();
            let yaw = state.rotation.yaw.to_radians();
            state.position.x += yaw.cos() * step;
            state.position.y += yaw.sin() * step;
        }
        state
    }

    fn input(&self, event: InputEvent) -> Result<(), ActuatorError> {
        drop(self.advance());
        self.recorder.record(event);
        Ok(())
    }

    fn telemetry<T>(&self, read: impl FnOnce(&SimState) -> T) -> Result<T, TelemetryError> {
        let state = self.advance();
        if state.connected {
            Ok(read(&state))
        } else {
            Err(TelemetryError::unavailable("simulation disconnected"))
        }
    }
}

impl TelemetryPort for SimGame {
    fn entities(&self) -> Result<Vec<Entity>, TelemetryError> {
        self.telemetry(|s| s.entities.clone())
    }

    fn camera_pose(&self) -> Result<CameraPose, TelemetryError> {
        self.telemetry(|s| CameraPose::new(s.position, s.rotation))
    }

    fn player_position(&self) -> Result<Vector3, TelemetryError> {
        self.telemetry(|s| s.position)
    }
}

impl ActuatorPort for SimGame {
    fn send_key(&self, key: &str, hold: Duration) -> Result<(), ActuatorError> {
        self.input(InputEvent::Tap {
            key: key.to_string(),
            hold,
        })
    }

    fn key_down(&self, key: &str) -> Result<(), ActuatorError> {
        self.input(InputEvent::KeyDown(key.to_string()))
    }

    fn key_up(&self, key: &str) -> Result<(), ActuatorError> {
        self.input(InputEvent::KeyUp(key.to_string()))
    }

    fn click(&self, point: ScreenPoint) -> Result<(), ActuatorError> {
        self.input(InputEvent::Click(point))
    }

    fn mouse_down(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError> {
        self.input(InputEvent::MouseDown(point, button))
    }

    fn mouse_up(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError> {
        self.input(InputEvent::MouseUp(point, button))
    }

    fn move_cursor(&self, point: ScreenPoint) -> Result<(), ActuatorError> {
        self.input(InputEvent::MoveCursor(point))
    }

    fn send_relative_mouse_move(&self, dx: i32, dy: i32) -> Result<(), ActuatorError> {
        let mut state = self.advance();
        if !state.camera_locked {
            state.rotation.yaw = normalize_angle(state.rotation.yaw + f64::from(dx) * DEGREES_PER_PIXEL);
            state.rotation.pitch = (state.rotation.pitch - f64::from(dy) * DEGREES_PER_PIXEL)
                .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
        drop(state);
        self.recorder.record(InputEvent::RelativeMove(dx, dy));
        Ok(())
    }

    fn activate(&self) -> Result<(), ActuatorError> {
        self.input(InputEvent::Activate)
    }
}

impl WindowPort for SimGame {
    fn client_size(&self) -> Result<ClientSize, WindowError> {
        Ok(self.advance().size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn forward_moves_along_yaw() {
        let game = SimGame::at(Vector3::ZERO);
        game.set_rotation(Rotator::new(0.0, 90.0, 0.0));
        game.key_down("W").expect("down");
        tokio::time::sleep(Duration::from_secs(1)).await;
        game.key_up("W").expect("up");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let position = game.position();
        assert!(position.x.abs() < 1e-6);
        assert!((position.y - WALK_SPEED).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn mouse_up_raises_pitch() {
        let game = SimGame::at(Vector3::ZERO);
        game.send_relative_mouse_move(50, -50).expect("move");
        let rotation = game.rotation();
        assert!((rotation.yaw - 10.0).abs() < 1e-9);
        assert!((rotation.pitch - 10.0).abs() < 1e-9);
    }
}
