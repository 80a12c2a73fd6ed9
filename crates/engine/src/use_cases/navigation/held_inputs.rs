//! Scoped tracking of held keys and mouse buttons.

use abyssrun_domain::ScreenPoint;

use crate::infrastructure::ports::MouseButton;
use crate::use_cases::input::InputDriver;

/// Everything pressed down through this guard is released when it drops.
///
/// Holding an input that is already held does nothing, so every `key_down`
/// sent through the guard is matched by exactly one `key_up`.
pub struct HeldInputs {
    input: InputDriver,
    keys: Vec<&'static str>,
    buttons: Vec<(MouseButton, ScreenPoint)>,
}

impl HeldInputs {
    pub fn new(input: InputDriver) -> Self {
        Self {
            input,
            keys: Vec::new(),
            buttons: Vec::new(),
        }
    }

    pub fn hold_key(&mut self, key: &'static str) {
        if !self.keys.contains(&key) {
            self.input.key_down(key);
            self.keys.push(key);
        }
    }

    pub fn release_key(&mut self, key: &'static str) {
        if let Some(index) = self.keys.iter().position(|k| *k == key) {
            self.keys.remove(index);
            self.input.key_up(key);
        }
    }

    pub fn hold_button(&mut self, button: MouseButton, at: ScreenPoint) {
        if !self.buttons.iter().any(|(b, _)| *b == button) {
            self.input.mouse_down(at, button);
            self.buttons.push((button, at));
        }
    }

    pub fn release_button(&mut self, button: MouseButton) {
        if let Some(index) = self.buttons.iter().position(|(b, _)| *b == button) {
            let (_, at) = self.buttons.remove(index);
            self.input.mouse_up(at, button);
        }
    }

    pub fn is_key_held(&self, key: &str) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.buttons.is_empty()
    }

    /// Release in reverse order of acquisition.
    pub fn release_all(&mut self) {
        while let Some(key) = self.keys.pop() {
            self.input.key_up(key);
        }
        while let Some((button, at)) = self.buttons.pop() {
            self.input.mouse_up(at, button);
        }
    }
}

impl Drop for HeldInputs {
    fn drop(&mut self) {
        self.release_all();
    }
}
