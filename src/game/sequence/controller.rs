// Fight sequence controller: approach, collision and weapon spin-down

use glam::Vec3;
use rand::Rng;

use super::explosion::ExplosionEngine;
use super::state::{SequencePhase, SequenceState};
use crate::core::math::random_symmetric;
use crate::engine::physics::PhysicsWorld;
use crate::game::actor::Actor;
use crate::game::tuning::FightTuning;

/// What the controller reports each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FightFrame {
    pub collided: bool,
    /// Weapon rotation to apply this frame (radians)
    pub weapon_spin: f32,
    /// The collision fired during this update
    pub collision_fired: bool,
}

/// Drives the two actors toward each other and decides when they collide
#[derive(Debug)]
pub struct FightController {
    tuning: FightTuning,
    state: SequenceState,
}

impl FightController {
    pub fn new(tuning: FightTuning) -> Self {
        let state = SequenceState::new(tuning.weapon_spin);
        Self { tuning, state }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SequenceState {
        &mut self.state
    }

    pub fn phase(&self) -> SequencePhase {
        self.state.phase()
    }

    pub fn tuning(&self) -> &FightTuning {
        &self.tuning
    }

    /// Begin the approach; later calls have no effect
    pub fn start(&mut self) {
        if self.state.start() {
            log::info!("Fight started");
        }
    }

    /// Advance one frame
    ///
    /// Missing actors (still loading) make the approach a no-op.
    pub fn update<R: Rng>(
        &mut self,
        first: Option<&mut Actor>,
        second: Option<&mut Actor>,
        engine: &ExplosionEngine,
        physics: &mut PhysicsWorld,
        rng: &mut R,
        dt: f32,
    ) -> FightFrame {
        let mut collision_fired = false;

        if let (Some(first), Some(second)) = (first, second) {
            if self.state.fight_started() && !self.state.collided() {
                collision_fired = self.approach(first, second, engine, physics, rng);
            }
        }

        // The collision frame itself does not count toward spin-down
        if self.state.collided() && !collision_fired {
            self.state
                .advance_spin_down(dt, self.tuning.spin_down_duration);
        }

        FightFrame {
            collided: self.state.collided(),
            weapon_spin: self.state.weapon_spin(),
            collision_fired,
        }
    }

    fn approach<R: Rng>(
        &mut self,
        first: &mut Actor,
        second: &mut Actor,
        engine: &ExplosionEngine,
        physics: &mut PhysicsWorld,
        rng: &mut R,
    ) -> bool {
        for actor in [&mut *first, &mut *second] {
            actor.approach_speed += self.tuning.approach_acceleration;
            actor.advance();
        }

        let separation = (first.position().z - second.position().z).abs();
        if separation >= self.tuning.collision_distance || !self.state.mark_collided() {
            return false;
        }

        let jitter = self.tuning.collision_jitter;
        let impact = Vec3::new(
            random_symmetric(rng, jitter),
            0.0,
            random_symmetric(rng, jitter),
        );
        log::info!(
            "{} and {} collided at ({:.1}, {:.1}, {:.1})",
            first.name,
            second.name,
            impact.x,
            impact.y,
            impact.z
        );

        for actor in [&mut *first, &mut *second] {
            actor.approach_speed = 0.0;
            actor.transform.translation = impact;
        }

        engine.explode(&mut self.state, [first, second], physics, rng);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transform;
    use crate::game::actor::ActorTag;
    use crate::game::tuning::{ExplosionTuning, DEFAULT_FIGHT};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn actor(tag: ActorTag, z: f32) -> Actor {
        let mut actor = Actor::new(tag, "bot", Transform::from_translation(Vec3::new(0.0, 0.0, z)), 0.1);
        actor.add_piece("hull", Some(Vec3::splat(4.0)), Transform::IDENTITY);
        actor.add_piece("plate", Some(Vec3::new(4.0, 0.5, 4.0)), Transform::from_translation(Vec3::Y * 3.0));
        actor
    }

    struct Harness {
        controller: FightController,
        engine: ExplosionEngine,
        physics: PhysicsWorld,
        rng: ChaCha8Rng,
        first: Actor,
        second: Actor,
    }

    impl Harness {
        fn new() -> Self {
            let engine = ExplosionEngine::new(ExplosionTuning::default());
            let physics = engine.build_world();
            Self {
                controller: FightController::new(DEFAULT_FIGHT),
                engine,
                physics,
                rng: ChaCha8Rng::seed_from_u64(42),
                first: actor(ActorTag::First, -200.0),
                second: actor(ActorTag::Second, 200.0),
            }
        }

        fn frame(&mut self) -> FightFrame {
            self.controller.update(
                Some(&mut self.first),
                Some(&mut self.second),
                &self.engine,
                &mut self.physics,
                &mut self.rng,
                DT,
            )
        }
    }

    #[test]
    fn test_idle_does_not_move_actors() {
        let mut h = Harness::new();
        for _ in 0..300 {
            let frame = h.frame();
            assert!(!frame.collided);
        }
        assert_eq!(h.first.position(), Vec3::new(0.0, 0.0, -200.0));
        assert_eq!(h.second.position(), Vec3::new(0.0, 0.0, 200.0));
        assert_eq!(h.controller.phase(), SequencePhase::Idle);
    }

    #[test]
    fn test_collision_fires_on_frame_127() {
        let mut h = Harness::new();
        h.controller.start();

        let mut fired_on = None;
        for frame_number in 1..=200 {
            let frame = h.frame();
            if frame.collision_fired {
                assert!(fired_on.is_none(), "collision fired twice");
                fired_on = Some(frame_number);
            }
        }
        assert_eq!(fired_on, Some(127));
        assert!(h.controller.state().collided());
    }

    #[test]
    fn test_collision_snaps_both_actors_to_shared_point() {
        let mut h = Harness::new();
        h.controller.start();
        while !h.frame().collision_fired {}

        assert_eq!(h.first.position(), h.second.position());
        let impact = h.first.position();
        assert!(impact.x.abs() <= DEFAULT_FIGHT.collision_jitter);
        assert!(impact.z.abs() <= DEFAULT_FIGHT.collision_jitter);
        assert_eq!(impact.y, 0.0);
        assert_eq!(h.first.approach_speed, 0.0);
        assert_eq!(h.second.approach_speed, 0.0);
    }

    #[test]
    fn test_actors_frozen_after_collision() {
        let mut h = Harness::new();
        h.controller.start();
        while !h.frame().collision_fired {}

        let first = h.first.position();
        for _ in 0..60 {
            h.frame();
        }
        assert_eq!(h.first.position(), first);
    }

    #[test]
    fn test_start_after_collision_has_no_effect() {
        let mut h = Harness::new();
        h.controller.start();
        while !h.frame().collision_fired {}

        h.controller.start();
        let frame = h.frame();
        assert!(frame.collided);
        assert!(!frame.collision_fired);
        assert!(h.controller.state().fight_started());
    }

    #[test]
    fn test_explosion_triggered_on_collision() {
        let mut h = Harness::new();
        h.controller.start();
        while !h.frame().collision_fired {}

        assert!(h.controller.state().explosion_active());
        assert_eq!(h.controller.state().total_pieces(), 4);
        assert_eq!(h.physics.body_count(), 4);
    }

    #[test]
    fn test_missing_actor_is_a_no_op() {
        let mut h = Harness::new();
        h.controller.start();
        for _ in 0..300 {
            let frame = h.controller.update(
                Some(&mut h.first),
                None,
                &h.engine,
                &mut h.physics,
                &mut h.rng,
                DT,
            );
            assert!(!frame.collided);
        }
        assert_eq!(h.first.position().z, -200.0);
        assert_eq!(h.controller.phase(), SequencePhase::Approaching);
    }

    #[test]
    fn test_spin_reaches_zero_after_duration() {
        let mut h = Harness::new();
        h.controller.start();
        let frame = loop {
            let frame = h.frame();
            if frame.collision_fired {
                break frame;
            }
        };
        assert_eq!(frame.weapon_spin, DEFAULT_FIGHT.weapon_spin);

        let mut previous = frame.weapon_spin;
        // A little over three seconds of frames
        for _ in 0..190 {
            let frame = h.frame();
            assert!(frame.weapon_spin <= previous);
            previous = frame.weapon_spin;
        }
        assert_eq!(previous, 0.0);
        assert_eq!(h.controller.phase(), SequencePhase::SpinStopped);
    }
}
