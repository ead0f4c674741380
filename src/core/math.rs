// Math utilities and helper functions

use glam::{Quat, Vec3};
use rand::Rng;

/// Position and orientation of a node in 3D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a transform with no rotation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn from_translation_rotation(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    /// Compose `self` (parent) with a child transform expressed in the parent's space
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * child.translation,
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    /// Check that no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Uniform sample in `[-half_range, half_range]`
pub fn random_symmetric<R: Rng>(rng: &mut R, half_range: f32) -> f32 {
    if half_range <= 0.0 {
        return 0.0;
    }
    rng.random_range(-half_range..=half_range)
}

/// Magnitude in `[min, max]` with a random sign
pub fn random_signed_magnitude<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    let magnitude = if max > min {
        rng.random_range(min..=max)
    } else {
        min
    };
    if rng.random_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}
