// Sequence trigger actions and their key bindings

use winit::keyboard::KeyCode;

/// Everything the user can ask the host to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Begin the approach
    Start,
    /// Rebuild the scene and return to idle
    Reset,
    Quit,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::Reset => "reset",
            Action::Quit => "quit",
        }
    }
}

/// Default keyboard bindings
pub fn default_bindings() -> Vec<(KeyCode, Action)> {
    vec![
        (KeyCode::Space, Action::Start),
        (KeyCode::Enter, Action::Start),
        (KeyCode::KeyR, Action::Reset),
        (KeyCode::Escape, Action::Quit),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_is_bound() {
        let bindings = default_bindings();
        for action in [Action::Start, Action::Reset, Action::Quit] {
            assert!(bindings.iter().any(|(_, a)| *a == action), "{} unbound", action.name());
        }
    }

    #[test]
    fn test_no_key_bound_twice() {
        let bindings = default_bindings();
        for (i, (key, _)) in bindings.iter().enumerate() {
            assert!(bindings[i + 1..].iter().all(|(other, _)| other != key));
        }
    }
}
