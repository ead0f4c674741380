// Game layer
//
// - Actors and the pieces they break into
// - Tuning parameters and presets
// - The fight sequence: approach, collision, explosion and settlement
// - Scene loading

pub mod actor;
pub mod scene;
pub mod sequence;
pub mod tuning;

pub use scene::{SceneConfig, SceneLoader};
pub use sequence::{FightSequence, FightStatus};
pub use tuning::{TuningPreset, DEFAULT_FIGHT};
