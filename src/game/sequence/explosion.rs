// Explosion and settlement: seeds debris bodies on collision and tracks when
// every piece has come to a terminal state.
//
// A piece settles through exactly one of three paths:
// - it comes to rest naturally
// - it leaves the playable area (hidden and removed from the simulation)
// - the settlement timeout expires (frozen in place)

use glam::Vec3;
use rand::Rng;

use super::state::SequenceState;
use crate::core::math::random_signed_magnitude;
use crate::engine::physics::{DebrisMaterial, PhysicsSettings, PhysicsWorld};
use crate::game::actor::{Actor, Piece};
use crate::game::tuning::ExplosionTuning;

/// Turns a collision into flying debris and keeps the settlement counters
#[derive(Debug, Clone)]
pub struct ExplosionEngine {
    tuning: ExplosionTuning,
}

impl ExplosionEngine {
    pub fn new(tuning: ExplosionTuning) -> Self {
        Self { tuning }
    }

    /// Physics settings derived from the tuning
    pub fn physics_settings(&self) -> PhysicsSettings {
        let t = &self.tuning;
        PhysicsSettings {
            gravity: t.gravity,
            debris: DebrisMaterial {
                friction: t.friction,
                restitution: t.restitution,
                linear_damping: t.linear_damping,
                angular_damping: t.angular_damping,
            },
            density: t.density,
            min_mass: t.min_mass,
            velocity_threshold: t.velocity_threshold,
            angular_velocity_threshold: t.angular_velocity_threshold,
            ground_friction: t.ground_friction,
            ground_restitution: t.ground_restitution,
        }
    }

    /// Build an empty world (ground only) configured for this engine
    pub fn build_world(&self) -> PhysicsWorld {
        PhysicsWorld::new(self.physics_settings())
    }

    /// Hand every piece of both actors to the simulation and launch it
    ///
    /// Pieces without usable geometry are skipped and never counted.
    pub fn explode<R: Rng>(
        &self,
        state: &mut SequenceState,
        actors: [&mut Actor; 2],
        physics: &mut PhysicsWorld,
        rng: &mut R,
    ) {
        let mut total = 0;
        let mut skipped = 0;

        for actor in actors {
            actor.detach_pieces();

            for piece in &mut actor.pieces {
                let Some(extent) = piece.extent() else {
                    log::warn!("Skipping piece '{}' of {}: no geometry", piece.name, actor.name);
                    skipped += 1;
                    continue;
                };

                let handle = physics.register(piece.id, extent, piece.transform());
                piece.attach_body(handle);

                let impulse = self.random_impulse(rng);
                physics.apply_impulse(handle, impulse, self.tuning.impulse_spin, rng);
                total += 1;
            }
        }

        state.begin_explosion(total);
        log::info!(
            "Explosion: {} pieces launched, {} skipped, timeout {:.1}s",
            total,
            skipped,
            self.tuning.settlement_timeout
        );
    }

    /// Random outward-and-up launch velocity
    pub fn random_impulse<R: Rng>(&self, rng: &mut R) -> Vec3 {
        let t = &self.tuning;
        let x = random_signed_magnitude(rng, t.horizontal_impulse_min, t.horizontal_impulse_max);
        let z = random_signed_magnitude(rng, t.horizontal_impulse_min, t.horizontal_impulse_max);
        let y = if t.vertical_impulse_max > t.vertical_impulse_min {
            rng.random_range(t.vertical_impulse_min..=t.vertical_impulse_max)
        } else {
            t.vertical_impulse_min
        };
        Vec3::new(x, y, z)
    }

    /// Advance the debris simulation by one frame
    ///
    /// Does nothing unless an explosion is active.
    pub fn update(
        &self,
        state: &mut SequenceState,
        actors: [&mut Actor; 2],
        physics: &mut PhysicsWorld,
        dt: f32,
    ) {
        if !state.explosion_active() {
            return;
        }

        let [first, second] = actors;
        let mut pieces: Vec<&mut Piece> = first
            .pieces
            .iter_mut()
            .chain(second.pieces.iter_mut())
            .filter(|piece| piece.has_geometry())
            .collect();

        state.advance_explosion_clock(dt);
        if state.explosion_elapsed() > self.tuning.settlement_timeout && !state.all_settled() {
            let forced = force_settle(state, &mut pieces, physics);
            log::info!(
                "Settlement timeout after {:.1}s: forced {} pieces",
                state.explosion_elapsed(),
                forced
            );
        }

        if let Err(err) = physics.step(dt, pieces.iter_mut().map(|piece| &mut **piece)) {
            log::error!("{err}; stopping the simulation for this run");
            force_settle(state, &mut pieces, physics);
            state.halt();
            return;
        }

        let half_extent = self.tuning.arena_half_extent();
        for piece in pieces {
            if !piece.visible {
                continue;
            }

            let position = piece.transform().translation;
            if position.x.abs() > half_extent || position.z.abs() > half_extent {
                piece.visible = false;
                if let Some(handle) = piece.take_body() {
                    physics.unregister(handle);
                }
                state.settle_piece(piece);
                log::debug!("Piece '{}' left the arena", piece.name);
                continue;
            }

            if piece.is_settled() {
                continue;
            }
            let Some(handle) = piece.body() else {
                continue;
            };
            if physics.is_at_rest(handle) {
                state.settle_piece(piece);
                if self.tuning.freeze_on_rest {
                    physics.freeze(handle);
                }
                log::debug!("Piece '{}' came to rest", piece.name);
            }
        }

        debug_assert_eq!(
            state.settled_pieces(),
            first.settled_count() + second.settled_count(),
            "settled counter out of step with piece flags"
        );
    }
}

/// Settle and freeze every piece that has not settled yet
fn force_settle(
    state: &mut SequenceState,
    pieces: &mut [&mut Piece],
    physics: &mut PhysicsWorld,
) -> usize {
    let mut forced = 0;
    for piece in pieces.iter_mut() {
        if state.settle_piece(piece) {
            if let Some(handle) = piece.body() {
                physics.freeze(handle);
            }
            forced += 1;
        }
    }
    forced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Transform;
    use crate::game::actor::ActorTag;
    use crate::game::tuning::DEFAULT_TUNING;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn actor(tag: ActorTag, pieces: usize) -> Actor {
        // Keep the two assemblies apart so their boxes do not start interpenetrating
        let offset = match tag {
            ActorTag::First => Vec3::ZERO,
            ActorTag::Second => Vec3::new(0.0, 0.0, 12.0),
        };
        let mut actor = Actor::new(tag, "bot", Transform::from_translation(offset), 0.0);
        for i in 0..pieces {
            actor.add_piece(
                "chunk",
                Some(Vec3::splat(4.0)),
                Transform::from_translation(Vec3::new(i as f32 * 6.0, 3.0, 0.0)),
            );
        }
        actor
    }

    fn explode(
        engine: &ExplosionEngine,
        first: &mut Actor,
        second: &mut Actor,
    ) -> (SequenceState, PhysicsWorld) {
        let mut state = SequenceState::new(0.4);
        let mut physics = engine.build_world();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        engine.explode(&mut state, [first, second], &mut physics, &mut rng);
        (state, physics)
    }

    fn counter_matches_flags(state: &SequenceState, first: &Actor, second: &Actor) -> bool {
        state.settled_pieces() == first.settled_count() + second.settled_count()
    }

    #[test]
    fn test_explode_registers_every_piece_with_geometry() {
        let engine = ExplosionEngine::new(DEFAULT_TUNING);
        let mut first = actor(ActorTag::First, 3);
        let mut second = actor(ActorTag::Second, 2);
        second.add_piece("empty", None, Transform::IDENTITY);

        let (state, physics) = explode(&engine, &mut first, &mut second);

        assert_eq!(state.total_pieces(), 5);
        assert_eq!(state.settled_pieces(), 0);
        assert_eq!(physics.body_count(), 5);
        assert!(second.pieces[2].body().is_none());
        assert!(first.pieces.iter().all(|p| !p.is_attached()));
    }

    #[test]
    fn test_impulse_within_configured_ranges() {
        let engine = ExplosionEngine::new(ExplosionTuning {
            horizontal_impulse_min: 1.0,
            horizontal_impulse_max: 5.0,
            ..DEFAULT_TUNING
        });
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..500 {
            let v = engine.random_impulse(&mut rng);
            assert!((1.0..=5.0).contains(&v.x.abs()));
            assert!((1.0..=5.0).contains(&v.z.abs()));
            assert!((0.5..=2.5).contains(&v.y));
        }
    }

    #[test]
    fn test_update_is_noop_without_explosion() {
        let engine = ExplosionEngine::new(DEFAULT_TUNING);
        let mut first = actor(ActorTag::First, 1);
        let mut second = actor(ActorTag::Second, 1);
        let mut state = SequenceState::new(0.4);
        let mut physics = engine.build_world();

        engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);
        assert_eq!(state.explosion_elapsed(), 0.0);
        assert!(first.pieces[0].is_attached());
    }

    #[test]
    fn test_boundary_exit_hides_unregisters_and_settles() {
        let engine = ExplosionEngine::new(DEFAULT_TUNING);
        let mut first = actor(ActorTag::First, 1);
        let mut second = actor(ActorTag::Second, 1);
        // Already past the east edge of the arena
        first.pieces[0] = {
            let mut piece = first.pieces[0].clone();
            piece.detach(&Transform::from_translation(Vec3::new(500.0, 0.0, 0.0)));
            piece
        };

        let (mut state, mut physics) = explode(&engine, &mut first, &mut second);
        let handle = first.pieces[0].body().unwrap();

        engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);

        let piece = &first.pieces[0];
        assert!(!piece.visible);
        assert!(piece.is_settled());
        assert!(piece.body().is_none());
        assert!(!physics.is_registered(handle));
        assert_eq!(physics.body_count(), 1);
        assert!(counter_matches_flags(&state, &first, &second));

        // Seen again next frame: nothing double-counted
        engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);
        assert!(counter_matches_flags(&state, &first, &second));
    }

    #[test]
    fn test_natural_rest_settles_without_freezing() {
        let engine = ExplosionEngine::new(ExplosionTuning {
            gravity: 9.81,
            velocity_threshold: 1.0e6,
            angular_velocity_threshold: 1.0e6,
            ..DEFAULT_TUNING
        });
        let mut first = actor(ActorTag::First, 2);
        let mut second = actor(ActorTag::Second, 2);
        let (mut state, mut physics) = explode(&engine, &mut first, &mut second);

        engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);

        assert!(state.all_settled());
        assert!(counter_matches_flags(&state, &first, &second));
        let handle = first.pieces[0].body().unwrap();
        assert!(!physics.is_frozen(handle));
    }

    #[test]
    fn test_freeze_on_rest_option() {
        let engine = ExplosionEngine::new(ExplosionTuning {
            velocity_threshold: 1.0e6,
            angular_velocity_threshold: 1.0e6,
            freeze_on_rest: true,
            ..DEFAULT_TUNING
        });
        let mut first = actor(ActorTag::First, 1);
        let mut second = actor(ActorTag::Second, 1);
        let (mut state, mut physics) = explode(&engine, &mut first, &mut second);

        engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);

        let handle = first.pieces[0].body().unwrap();
        assert!(physics.is_frozen(handle));
    }

    #[test]
    fn test_timeout_forces_settlement() {
        // Thresholds nothing can reach: pieces never rest on their own
        let engine = ExplosionEngine::new(ExplosionTuning {
            velocity_threshold: 0.0,
            angular_velocity_threshold: 0.0,
            settlement_timeout: 1.0,
            ..DEFAULT_TUNING
        });
        let mut first = actor(ActorTag::First, 3);
        let mut second = actor(ActorTag::Second, 3);
        let (mut state, mut physics) = explode(&engine, &mut first, &mut second);

        let mut frames = 0;
        while !state.all_settled() {
            engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);
            assert!(counter_matches_flags(&state, &first, &second));
            frames += 1;
            assert!(frames <= 61, "timeout did not force settlement");
        }

        assert!(state.explosion_elapsed() > 1.0);
        for piece in first.pieces.iter().chain(second.pieces.iter()) {
            assert!(piece.is_settled());
            if let Some(handle) = piece.body() {
                assert!(physics.is_frozen(handle));
            }
        }
    }

    #[test]
    fn test_diverged_simulation_halts_and_settles_everything() {
        let engine = ExplosionEngine::new(ExplosionTuning {
            velocity_threshold: 0.0,
            angular_velocity_threshold: 0.0,
            ..DEFAULT_TUNING
        });
        let mut first = actor(ActorTag::First, 2);
        let mut second = actor(ActorTag::Second, 1);
        first.pieces[0] = {
            let mut piece = first.pieces[0].clone();
            piece.detach(&Transform::from_translation(Vec3::new(f32::NAN, 0.0, 0.0)));
            piece
        };

        let (mut state, mut physics) = explode(&engine, &mut first, &mut second);
        assert_eq!(state.total_pieces(), 3);

        engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);

        assert!(!state.explosion_active());
        assert_eq!(state.settled_pieces(), 3);
        assert!(state.all_settled());
        assert!(counter_matches_flags(&state, &first, &second));
        for piece in [&first.pieces[1], &second.pieces[0]] {
            let handle = piece.body().unwrap();
            assert!(physics.is_frozen(handle));
        }

        // Halted: later frames do not step or advance the clock
        let elapsed = state.explosion_elapsed();
        let resting = *second.pieces[0].transform();
        for _ in 0..5 {
            engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);
        }
        assert_eq!(state.explosion_elapsed(), elapsed);
        assert_eq!(*second.pieces[0].transform(), resting);
    }

    #[test]
    fn test_settled_flags_never_revert() {
        let engine = ExplosionEngine::new(ExplosionTuning {
            settlement_timeout: 0.5,
            ..DEFAULT_TUNING
        });
        let mut first = actor(ActorTag::First, 4);
        let mut second = actor(ActorTag::Second, 4);
        let (mut state, mut physics) = explode(&engine, &mut first, &mut second);

        let mut settled_before: Vec<bool> = vec![false; 8];
        for _ in 0..120 {
            engine.update(&mut state, [&mut first, &mut second], &mut physics, DT);
            let now: Vec<bool> = first
                .pieces
                .iter()
                .chain(second.pieces.iter())
                .map(|p| p.is_settled())
                .collect();
            for (before, after) in settled_before.iter().zip(&now) {
                assert!(!*before || *after, "settled flag reverted");
            }
            assert!(counter_matches_flags(&state, &first, &second));
            settled_before = now;
        }
        assert!(state.all_settled());
    }
}
