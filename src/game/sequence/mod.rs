// Fight sequence
//
// Ties the pieces together for the host loop. Each frame:
// 1. the controller advances the approach (and may trigger the explosion)
// 2. weapon pieces still attached to an actor spin
// 3. the explosion engine steps physics and updates settlement
//
// After `update` returns, every piece transform and visibility flag is ready
// to be drawn.

pub mod controller;
pub mod explosion;
pub mod state;

pub use controller::FightController;
pub use explosion::ExplosionEngine;
pub use state::{SequencePhase, SequenceState};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::engine::physics::PhysicsWorld;
use crate::game::actor::{Actor, ActorTag};
use crate::game::tuning::{ExplosionTuning, FightTuning, TuningError};

/// Snapshot of the sequence after a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FightStatus {
    pub phase: SequencePhase,
    pub collided: bool,
    pub weapon_spin: f32,
    pub settled_pieces: usize,
    pub total_pieces: usize,
    /// Seconds since the explosion (0 before it)
    pub explosion_elapsed: f32,
    /// Debris bodies still in the simulation
    pub active_bodies: usize,
}

impl FightStatus {
    /// Every piece taking part in the explosion has settled
    pub fn is_settled(&self) -> bool {
        self.collided && self.settled_pieces >= self.total_pieces
    }
}

/// One complete fight: both actors, the state machine and the simulation
pub struct FightSequence<R: Rng = ChaCha8Rng> {
    controller: FightController,
    engine: ExplosionEngine,
    physics: PhysicsWorld,
    rng: R,
    first: Option<Actor>,
    second: Option<Actor>,
    /// Actors as loaded, used to rebuild the scene on reset
    blueprints: [Option<Actor>; 2],
}

impl FightSequence<ChaCha8Rng> {
    /// Create a sequence whose random choices are reproducible from `seed`
    pub fn with_seed(
        explosion: ExplosionTuning,
        fight: FightTuning,
        seed: u64,
    ) -> Result<Self, TuningError> {
        Self::new(explosion, fight, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> FightSequence<R> {
    pub fn new(explosion: ExplosionTuning, fight: FightTuning, rng: R) -> Result<Self, TuningError> {
        explosion.validate()?;
        fight.validate()?;

        let engine = ExplosionEngine::new(explosion);
        let physics = engine.build_world();

        Ok(Self {
            controller: FightController::new(fight),
            engine,
            physics,
            rng,
            first: None,
            second: None,
            blueprints: [None, None],
        })
    }

    /// Hand over a loaded actor; its side is taken from its tag
    ///
    /// Actors arriving after the collision are kept for the next reset only.
    pub fn insert_actor(&mut self, actor: Actor) {
        let slot = match actor.tag {
            ActorTag::First => 0,
            ActorTag::Second => 1,
        };
        self.blueprints[slot] = Some(actor.clone());

        if self.controller.state().collided() {
            log::warn!("Actor {} arrived after the collision; used from next reset", actor.name);
            return;
        }

        log::info!("Actor {} ready with {} pieces", actor.name, actor.pieces.len());
        match actor.tag {
            ActorTag::First => self.first = Some(actor),
            ActorTag::Second => self.second = Some(actor),
        }
    }

    /// Both actors are present
    pub fn is_loaded(&self) -> bool {
        self.first.is_some() && self.second.is_some()
    }

    /// Start trigger; idempotent
    pub fn start(&mut self) {
        if !self.is_loaded() {
            log::info!("Start requested before both actors loaded; approach begins once they arrive");
        }
        self.controller.start();
    }

    /// Throw away all sequence and simulation state and rebuild the scene
    pub fn reset(&mut self) {
        let removed = self.physics.body_count();
        self.physics = self.engine.build_world();
        self.controller = FightController::new(self.controller.tuning().clone());
        self.first = self.blueprints[0].clone();
        self.second = self.blueprints[1].clone();
        log::info!("Sequence reset ({} debris bodies removed)", removed);
    }

    /// Advance one frame of `dt` seconds
    pub fn update(&mut self, dt: f32) -> FightStatus {
        let frame = self.controller.update(
            self.first.as_mut(),
            self.second.as_mut(),
            &self.engine,
            &mut self.physics,
            &mut self.rng,
            dt,
        );

        for actor in [self.first.as_mut(), self.second.as_mut()].into_iter().flatten() {
            actor.spin_weapons(frame.weapon_spin);
        }

        if let (Some(first), Some(second)) = (self.first.as_mut(), self.second.as_mut()) {
            self.engine.update(
                self.controller.state_mut(),
                [first, second],
                &mut self.physics,
                dt,
            );
        }

        self.status()
    }

    pub fn status(&self) -> FightStatus {
        let state = self.controller.state();
        FightStatus {
            phase: state.phase(),
            collided: state.collided(),
            weapon_spin: state.weapon_spin(),
            settled_pieces: state.settled_pieces(),
            total_pieces: state.total_pieces(),
            explosion_elapsed: state.explosion_elapsed(),
            active_bodies: self.physics.body_count(),
        }
    }

    pub fn first(&self) -> Option<&Actor> {
        self.first.as_ref()
    }

    pub fn second(&self) -> Option<&Actor> {
        self.second.as_ref()
    }

    pub fn state(&self) -> &SequenceState {
        self.controller.state()
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }
}
