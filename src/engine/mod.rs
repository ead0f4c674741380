// Engine modules: physics, fixed timestep clock, input

pub mod game_loop;
pub mod input;
pub mod physics;
