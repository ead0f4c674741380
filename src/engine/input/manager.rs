// Input manager: turns key presses into queued trigger actions

use std::collections::{HashMap, VecDeque};

use super::action::{default_bindings, Action};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Maps keys to actions and queues the actions triggered since the last drain
pub struct InputManager {
    bindings: HashMap<KeyCode, Action>,
    pending: VecDeque<Action>,
}

impl InputManager {
    pub fn new(bindings: impl IntoIterator<Item = (KeyCode, Action)>) -> Self {
        Self {
            bindings: bindings.into_iter().collect(),
            pending: VecDeque::new(),
        }
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        if let PhysicalKey::Code(key_code) = event.physical_key {
            self.handle_key(key_code, event.state, event.repeat);
        }
    }

    /// Queue the bound action for a fresh key press
    ///
    /// Releases and auto-repeat are ignored; each trigger fires once per press.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        if state != ElementState::Pressed || repeat {
            return;
        }
        if let Some(&action) = self.bindings.get(&key) {
            log::debug!("{:?} -> {}", key, action.name());
            self.pending.push_back(action);
        }
    }

    /// Take every queued action in the order it was triggered
    pub fn drain(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.pending.drain(..)
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(default_bindings())
    }
}
