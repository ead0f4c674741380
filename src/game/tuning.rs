// Tuning parameters for the fight choreography and the debris simulation
//
// Values are read once when a sequence is built; changing them only affects
// the next run.

use std::fmt;

use clap::ValueEnum;

/// Invalid tuning values
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TuningError {
    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f32 },

    #[error("{name} must be greater than zero, got {value}")]
    NotPositive { name: &'static str, value: f32 },

    #[error("{name} range is inverted: min {min} > max {max}")]
    InvertedRange {
        name: &'static str,
        min: f32,
        max: f32,
    },
}

/// Physics and settlement parameters for the explosion
#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionTuning {
    // World
    /// Downward gravitational acceleration (units/s²)
    pub gravity: f32,
    /// Side length of the square playable area centred on the origin
    pub arena_size: f32,
    /// Ground plane friction
    pub ground_friction: f32,
    /// Ground plane bounciness
    pub ground_restitution: f32,

    // Debris bodies
    /// Air resistance
    pub linear_damping: f32,
    /// Spin resistance
    pub angular_damping: f32,
    /// How much pieces grip the ground (0 = ice, 1 = glue)
    pub friction: f32,
    /// Bounciness (0 = no bounce, 1 = super bouncy)
    pub restitution: f32,
    /// Mass per unit of bounding-box volume
    pub density: f32,
    /// Lower bound on piece mass so tiny fragments stay stable
    pub min_mass: f32,

    // Settlement
    /// Linear speed below which a piece counts as at rest
    pub velocity_threshold: f32,
    /// Angular speed below which a piece counts as at rest
    pub angular_velocity_threshold: f32,
    /// Seconds after the explosion at which all pieces are forced to settle
    pub settlement_timeout: f32,
    /// Also freeze bodies that settle naturally
    pub freeze_on_rest: bool,

    // Explosion impulse
    pub horizontal_impulse_min: f32,
    pub horizontal_impulse_max: f32,
    pub vertical_impulse_min: f32,
    pub vertical_impulse_max: f32,
    /// Angular velocity on each axis is drawn from `[-spin, spin]`
    pub impulse_spin: f32,
}

/// Parameters of the approach and weapon spin-down
#[derive(Debug, Clone, PartialEq)]
pub struct FightTuning {
    /// Approach speed each actor starts with (units/frame)
    pub initial_approach_speed: f32,
    /// Speed added every frame while approaching
    pub approach_acceleration: f32,
    /// Separation along the approach axis that triggers the collision
    pub collision_distance: f32,
    /// Collision point is jittered by up to this much on X and Z
    pub collision_jitter: f32,
    /// Weapon rotation per frame before the collision (radians)
    pub weapon_spin: f32,
    /// Seconds for the weapon spin to decay to zero after the collision
    pub spin_down_duration: f32,
}

/// The configuration the sequence runs with unless a preset is chosen
pub const DEFAULT_TUNING: ExplosionTuning = ExplosionTuning {
    gravity: 1000.0,
    arena_size: 832.5,
    ground_friction: 0.4,
    ground_restitution: 0.2,

    linear_damping: 0.5,
    angular_damping: 0.5,
    friction: 0.9,
    restitution: 0.05,
    density: 0.01,
    min_mass: 0.1,

    velocity_threshold: 1.0,
    angular_velocity_threshold: 1.0,
    settlement_timeout: 10.0,
    freeze_on_rest: false,

    horizontal_impulse_min: 0.0,
    horizontal_impulse_max: 5.0,
    vertical_impulse_min: 0.5,
    vertical_impulse_max: 2.5,
    impulse_spin: 4.0,
};

pub const DEFAULT_FIGHT: FightTuning = FightTuning {
    initial_approach_speed: 0.1,
    approach_acceleration: 0.02,
    collision_distance: 50.0,
    collision_jitter: 10.0,
    weapon_spin: 0.4,
    spin_down_duration: 3.0,
};

impl Default for ExplosionTuning {
    fn default() -> Self {
        DEFAULT_TUNING
    }
}

impl Default for FightTuning {
    fn default() -> Self {
        DEFAULT_FIGHT
    }
}

impl ExplosionTuning {
    /// Half of the playable area; pieces beyond it on X or Z are culled
    pub fn arena_half_extent(&self) -> f32 {
        self.arena_size / 2.0
    }

    /// Check every parameter, returning the first violation
    pub fn validate(&self) -> Result<(), TuningError> {
        let finite = [
            ("gravity", self.gravity),
            ("arena_size", self.arena_size),
            ("ground_friction", self.ground_friction),
            ("ground_restitution", self.ground_restitution),
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
            ("friction", self.friction),
            ("restitution", self.restitution),
            ("density", self.density),
            ("min_mass", self.min_mass),
            ("velocity_threshold", self.velocity_threshold),
            ("angular_velocity_threshold", self.angular_velocity_threshold),
            ("settlement_timeout", self.settlement_timeout),
            ("horizontal_impulse_min", self.horizontal_impulse_min),
            ("horizontal_impulse_max", self.horizontal_impulse_max),
            ("vertical_impulse_min", self.vertical_impulse_min),
            ("vertical_impulse_max", self.vertical_impulse_max),
            ("impulse_spin", self.impulse_spin),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(TuningError::NotFinite { name, value });
            }
        }

        let non_negative = [
            ("gravity", self.gravity),
            ("ground_friction", self.ground_friction),
            ("ground_restitution", self.ground_restitution),
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
            ("friction", self.friction),
            ("restitution", self.restitution),
            ("density", self.density),
            ("velocity_threshold", self.velocity_threshold),
            ("angular_velocity_threshold", self.angular_velocity_threshold),
            ("horizontal_impulse_min", self.horizontal_impulse_min),
            ("impulse_spin", self.impulse_spin),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(TuningError::Negative { name, value });
            }
        }

        let positive = [
            ("arena_size", self.arena_size),
            ("min_mass", self.min_mass),
            ("settlement_timeout", self.settlement_timeout),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(TuningError::NotPositive { name, value });
            }
        }

        let ranges = [
            (
                "horizontal_impulse",
                self.horizontal_impulse_min,
                self.horizontal_impulse_max,
            ),
            (
                "vertical_impulse",
                self.vertical_impulse_min,
                self.vertical_impulse_max,
            ),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(TuningError::InvertedRange { name, min, max });
            }
        }

        Ok(())
    }
}

impl FightTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        let values = [
            ("initial_approach_speed", self.initial_approach_speed),
            ("approach_acceleration", self.approach_acceleration),
            ("collision_jitter", self.collision_jitter),
            ("weapon_spin", self.weapon_spin),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(TuningError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(TuningError::Negative { name, value });
            }
        }

        let positive = [
            ("collision_distance", self.collision_distance),
            ("spin_down_duration", self.spin_down_duration),
        ];
        for (name, value) in positive {
            if !value.is_finite() {
                return Err(TuningError::NotFinite { name, value });
            }
            if value <= 0.0 {
                return Err(TuningError::NotPositive { name, value });
            }
        }

        Ok(())
    }
}

/// Named explosion presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TuningPreset {
    /// Heavy gravity, quick drop
    #[default]
    Default,
    /// Close to real-world behaviour
    Realistic,
    /// Big scatter, takes time to settle
    Dramatic,
    /// Quick scatter and settle
    Fast,
}

impl TuningPreset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Realistic => "realistic",
            Self::Dramatic => "dramatic",
            Self::Fast => "fast",
        }
    }

    /// Build the tuning for this preset
    pub fn tuning(&self) -> ExplosionTuning {
        match self {
            Self::Default => DEFAULT_TUNING,
            Self::Realistic => ExplosionTuning {
                gravity: 20.0,
                linear_damping: 0.2,
                angular_damping: 0.3,
                horizontal_impulse_max: 4.0,
                vertical_impulse_max: 2.0,
                settlement_timeout: 4.0,
                ..DEFAULT_TUNING
            },
            Self::Dramatic => ExplosionTuning {
                gravity: 30.0,
                linear_damping: 0.1,
                angular_damping: 0.2,
                horizontal_impulse_max: 8.0,
                vertical_impulse_max: 4.0,
                settlement_timeout: 5.0,
                ..DEFAULT_TUNING
            },
            Self::Fast => ExplosionTuning {
                gravity: 100.0,
                linear_damping: 0.6,
                angular_damping: 0.7,
                horizontal_impulse_max: 6.0,
                vertical_impulse_max: 2.0,
                settlement_timeout: 1.5,
                ..DEFAULT_TUNING
            },
        }
    }
}

impl fmt::Display for TuningPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
