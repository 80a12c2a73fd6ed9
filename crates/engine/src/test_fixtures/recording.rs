//! Actuator that records every input instead of injecting it.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use abyssrun_domain::ScreenPoint;

use crate::infrastructure::ports::{ActuatorError, ActuatorPort, MouseButton};

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Tap { key: String, hold: Duration },
    KeyDown(String),
    KeyUp(String),
    Click(ScreenPoint),
    MouseDown(ScreenPoint, MouseButton),
    MouseUp(ScreenPoint, MouseButton),
    MoveCursor(ScreenPoint),
    RelativeMove(i32, i32),
    Activate,
}

#[derive(Debug, Default)]
pub struct RecordingActuator {
    events: Mutex<Vec<InputEvent>>,
}

impl RecordingActuator {
    pub fn record(&self, event: InputEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<InputEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clicks(&self) -> Vec<ScreenPoint> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::Click(point) => Some(point),
                _ => None,
            })
            .collect()
    }

    pub fn taps(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::Tap { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn key_down_count(&self, key: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, InputEvent::KeyDown(k) if k == key))
            .count()
    }

    pub fn key_up_count(&self, key: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, InputEvent::KeyUp(k) if k == key))
            .count()
    }

    pub fn button_down_count(&self, button: MouseButton) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, InputEvent::MouseDown(_, b) if *b == button))
            .count()
    }

    pub fn relative_moves(&self) -> Vec<(i32, i32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InputEvent::RelativeMove(dx, dy) => Some((dx, dy)),
                _ => None,
            })
            .collect()
    }

    pub fn relative_moves_matching(&self, dx: i32, dy: i32) -> usize {
        self.relative_moves()
            .into_iter()
            .filter(|m| *m == (dx, dy))
            .count()
    }

    pub fn activations(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, InputEvent::Activate))
            .count()
    }

    /// Keys currently down, in the order they were pressed.
    pub fn held_keys(&self) -> Vec<String> {
        let mut held: Vec<String> = Vec::new();
        for event in self.events() {
            match event {
                InputEvent::KeyDown(key) if !held.contains(&key) => held.push(key),
                InputEvent::KeyUp(key) => held.retain(|k| *k != key),
                _ => {}
            }
        }
        held
    }

    pub fn held_buttons(&self) -> Vec<MouseButton> {
        let mut held: Vec<MouseButton> = Vec::new();
        for event in self.events() {
            match event {
                InputEvent::MouseDown(_, button) if !held.contains(&button) => held.push(button),
                InputEvent::MouseUp(_, button) => held.retain(|b| *b != button),
                _ => {}
            }
        }
        held
    }

    pub fn is_key_held(&self, key: &str) -> bool {
        self.held_keys().iter().any(|k| k == key)
    }

    /// Every key and button went down exactly as often as it came up.
    pub fn inputs_balanced(&self) -> bool {
        let mut balance: HashMap<String, i64> = HashMap::new();
        for event in self.events() {
            let (name, delta) = match event {
                InputEvent::KeyDown(key) => (key, 1),
                InputEvent::KeyUp(key) => (key, -1),
                InputEvent::MouseDown(_, button) => (format!("mouse:{button}"), 1),
                InputEvent::MouseUp(_, button) => (format!("mouse:{button}"), -1),
                _ => continue,
            };
            *balance.entry(name).or_default() += delta;
        }
        balance.values().all(|v| *v == 0)
    }
}

impl ActuatorPort for RecordingActuator {
    fn send_key(&self, key: &str, hold: Duration) -> Result<(), ActuatorError> {
        self.record(InputEvent::Tap {
            key: key.to_string(),
            hold,
        });
        Ok(())
    }

    fn key_down(&self, key: &str) -> Result<(), ActuatorError> {
        self.record(InputEvent::KeyDown(key.to_string()));
        Ok(())
    }

    fn key_up(&self, key: &str) -> Result<(), ActuatorError> {
        self.record(InputEvent::KeyUp(key.to_string()));
        Ok(())
    }

    fn click(&self, point: ScreenPoint) -> Result<(), ActuatorError> {
        self.record(InputEvent::Click(point));
        Ok(())
    }

    fn mouse_down(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError> {
        self.record(InputEvent::MouseDown(point, button));
        Ok(())
    }

    fn mouse_up(&self, point: ScreenPoint, button: MouseButton) -> Result<(), ActuatorError> {
        self.record(InputEvent::MouseUp(point, button));
        Ok(())
    }

    fn move_cursor(&self, point: ScreenPoint) -> Result<(), ActuatorError> {
        self.record(InputEvent::MoveCursor(point));
        Ok(())
    }

    fn send_relative_mouse_move(&self, dx: i32, dy: i32) -> Result<(), ActuatorError> {
        self.record(InputEvent::RelativeMove(dx, dy));
        Ok(())
    }

    fn activate(&self) -> Result<(), ActuatorError> {
        self.record(InputEvent::Activate);
        Ok(())
    }
}
