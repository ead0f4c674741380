// Input handling
//
// - `action`: trigger actions and default key bindings
// - `manager`: turns winit key events into queued actions

pub mod action;
pub mod manager;

pub use action::Action;
pub use manager::InputManager;
