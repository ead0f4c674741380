// Physics system using rapier3d
//
// Nothing outside this module touches rapier; the rest of the game talks to
// `PhysicsWorld` in terms of pieces, glam vectors and `BodyHandle`s.

pub mod body;
mod collision;
mod world;

pub use body::presets::DebrisMaterial;
pub use world::{BodyHandle, PhysicsSettings, PhysicsWorld};
