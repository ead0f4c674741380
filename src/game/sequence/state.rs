// Fight sequence state: phase flags, spin-down timer and settlement bookkeeping

use crate::core::math::lerp;
use crate::game::actor::Piece;

/// Where the confrontation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SequencePhase {
    /// Waiting for the start trigger
    #[default]
    Idle,
    /// Actors accelerate toward each other
    Approaching,
    /// Actors collided; weapon spin is decaying
    SpinningDown,
    /// Weapon spin reached zero; debris may still be moving
    SpinStopped,
}

impl SequencePhase {
    /// Short label for status displays
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Approaching => "approaching",
            Self::SpinningDown => "spinning down",
            Self::SpinStopped => "spin stopped",
        }
    }
}

/// All mutable state of one sequence run; rebuilt from scratch on reset
#[derive(Debug, Clone)]
pub struct SequenceState {
    fight_started: bool,
    collided: bool,
    /// Seconds since the collision
    collision_time: f32,
    initial_spin: f32,
    weapon_spin: f32,

    // Settlement bookkeeping
    explosion_active: bool,
    /// Seconds since the explosion
    explosion_elapsed: f32,
    total_pieces: usize,
    settled_pieces: usize,
    /// Simulation failed and was stopped for this run
    halted: bool,
}

impl SequenceState {
    pub fn new(initial_spin: f32) -> Self {
        Self {
            fight_started: false,
            collided: false,
            collision_time: 0.0,
            initial_spin,
            weapon_spin: initial_spin,
            explosion_active: false,
            explosion_elapsed: 0.0,
            total_pieces: 0,
            settled_pieces: 0,
            halted: false,
        }
    }

    pub fn phase(&self) -> SequencePhase {
        if self.collided {
            if self.weapon_spin > 0.0 {
                SequencePhase::SpinningDown
            } else {
                SequencePhase::SpinStopped
            }
        } else if self.fight_started {
            SequencePhase::Approaching
        } else {
            SequencePhase::Idle
        }
    }

    pub fn fight_started(&self) -> bool {
        self.fight_started
    }

    /// Begin the approach; returns false if the fight had already started
    pub fn start(&mut self) -> bool {
        if self.fight_started {
            return false;
        }
        self.fight_started = true;
        true
    }

    pub fn collided(&self) -> bool {
        self.collided
    }

    /// Record the collision; only possible once, and only after the start
    pub fn mark_collided(&mut self) -> bool {
        if self.collided || !self.fight_started {
            return false;
        }
        self.collided = true;
        self.collision_time = 0.0;
        true
    }

    pub fn collision_time(&self) -> f32 {
        self.collision_time
    }

    pub fn weapon_spin(&self) -> f32 {
        self.weapon_spin
    }

    /// Decay the weapon spin linearly to zero over `duration` seconds
    pub fn advance_spin_down(&mut self, dt: f32, duration: f32) {
        if !self.collided {
            return;
        }
        if dt.is_finite() && dt > 0.0 {
            self.collision_time += dt;
        }

        let spin = if self.collision_time < duration {
            lerp(self.initial_spin, 0.0, self.collision_time / duration)
        } else {
            0.0
        };
        // Never increases, never negative
        self.weapon_spin = spin.clamp(0.0, self.weapon_spin);
    }

    /// Reset settlement counters for a fresh explosion of `total` pieces
    pub fn begin_explosion(&mut self, total: usize) {
        self.explosion_active = true;
        self.explosion_elapsed = 0.0;
        self.total_pieces = total;
        self.settled_pieces = 0;
        self.halted = false;
    }

    pub fn explosion_active(&self) -> bool {
        self.explosion_active && !self.halted
    }

    pub fn advance_explosion_clock(&mut self, dt: f32) {
        if self.explosion_active() && dt.is_finite() && dt > 0.0 {
            self.explosion_elapsed += dt;
        }
    }

    pub fn explosion_elapsed(&self) -> f32 {
        self.explosion_elapsed
    }

    /// Settle a piece and count it; no effect if it was already settled
    pub fn settle_piece(&mut self, piece: &mut Piece) -> bool {
        if piece.settle() {
            self.settled_pieces += 1;
            true
        } else {
            false
        }
    }

    pub fn total_pieces(&self) -> usize {
        self.total_pieces
    }

    pub fn settled_pieces(&self) -> usize {
        self.settled_pieces
    }

    pub fn all_settled(&self) -> bool {
        self.settled_pieces >= self.total_pieces
    }

    /// Stop the simulation for the rest of this run
    pub fn halt(&mut self) {
        self.halted = true;
    }
}
