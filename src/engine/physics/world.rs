use glam::{Quat, Vec3};
use rand::Rng;
use rapier3d::prelude::nalgebra::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use std::collections::HashMap;

use super::body::{mass_from_extent, presets, presets::DebrisMaterial};
use crate::core::math::random_symmetric;
use crate::core::Transform;
use crate::engine::game_loop::FixedTimestep;
use crate::game::actor::{Piece, PieceId};

/// Stable handle to a simulated body; the only physics type pieces hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(RigidBodyHandle);

/// Simulation failures
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PhysicsError {
    #[error("simulation diverged: body for piece {piece:?} has a non-finite transform")]
    Diverged { piece: PieceId },
}

/// Settings the physics world is built from
#[derive(Debug, Clone, Copy)]
pub struct PhysicsSettings {
    /// Downward acceleration (positive number)
    pub gravity: Real,
    pub debris: DebrisMaterial,
    pub density: Real,
    pub min_mass: Real,
    pub velocity_threshold: Real,
    pub angular_velocity_threshold: Real,
    pub ground_friction: Real,
    pub ground_restitution: Real,
}

/// Physics world that owns every body and collider of the simulation
///
/// All access to the rapier backend goes through this type.
pub struct PhysicsWorld {
    settings: PhysicsSettings,

    /// Gravity vector
    gravity: Vector<Real>,

    /// Integration parameters for the physics simulation
    integration_parameters: IntegrationParameters,

    /// Converts frame time into fixed sub-steps
    timestep: FixedTimestep,

    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,

    /// Owner of every registered body
    body_to_piece: HashMap<BodyHandle, PieceId>,
}

impl PhysicsWorld {
    /// Create a world with a static ground plane at y = 0
    pub fn new(settings: PhysicsSettings) -> Self {
        let timestep = FixedTimestep::default();

        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = timestep.step();

        let mut world = Self {
            settings,
            gravity: vector![0.0, -settings.gravity, 0.0],
            integration_parameters,
            timestep,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            body_to_piece: HashMap::new(),
        };

        let ground = world.rigid_body_set.insert(presets::ground_body());
        world.collider_set.insert_with_parent(
            presets::ground_collider(settings.ground_friction, settings.ground_restitution),
            ground,
            &mut world.rigid_body_set,
        );

        world
    }

    /// Create a body for a piece from its bounding extent and world transform
    ///
    /// Registering a piece that already has a body returns the existing handle.
    pub fn register(&mut self, piece: PieceId, extent: Vec3, world: &Transform) -> BodyHandle {
        if let Some(existing) = self.handle_for(piece) {
            log::warn!("Piece {:?} is already registered", piece);
            return existing;
        }

        let size = vector![extent.x, extent.y, extent.z];
        let mass = mass_from_extent(size, self.settings.density, self.settings.min_mass);

        let body = presets::debris_body(to_isometry(world), &self.settings.debris);
        let rigid_body = self.rigid_body_set.insert(body);

        let collider = presets::debris_collider(size, mass, &self.settings.debris);
        self.collider_set
            .insert_with_parent(collider, rigid_body, &mut self.rigid_body_set);

        let handle = BodyHandle(rigid_body);
        self.body_to_piece.insert(handle, piece);
        handle
    }

    /// Remove a body and its collider; unknown handles are ignored
    pub fn unregister(&mut self, handle: BodyHandle) {
        if self.body_to_piece.remove(&handle).is_none() {
            return;
        }
        self.rigid_body_set.remove(
            handle.0,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true, // remove attached colliders
        );
    }

    /// Advance by `dt` seconds of frame time in fixed sub-steps, then copy each
    /// body's pose back onto its piece
    ///
    /// Returns the number of sub-steps taken.
    pub fn step<'a, I>(&mut self, dt: f32, pieces: I) -> Result<u32, PhysicsError>
    where
        I: IntoIterator<Item = &'a mut Piece>,
    {
        let substeps = self.timestep.advance(dt);
        for _ in 0..substeps {
            self.physics_pipeline.step(
                &self.gravity,
                &self.integration_parameters,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
        }

        for piece in pieces {
            let Some(transform) = piece.body().and_then(|handle| self.transform(handle)) else {
                continue;
            };
            if !transform.is_finite() {
                return Err(PhysicsError::Diverged { piece: piece.id });
            }
            piece.set_world_transform(transform);
        }

        Ok(substeps)
    }

    /// Set the body's linear velocity and give it a random spin in `[-spin, spin]`
    ///
    /// Velocities are overwritten, not accumulated.
    pub fn apply_impulse<R: Rng>(
        &mut self,
        handle: BodyHandle,
        velocity: Vec3,
        spin: f32,
        rng: &mut R,
    ) {
        let Some(body) = self.rigid_body_set.get_mut(handle.0) else {
            return;
        };
        let angvel = vector![
            random_symmetric(rng, spin),
            random_symmetric(rng, spin),
            random_symmetric(rng, spin)
        ];
        body.set_linvel(vector![velocity.x, velocity.y, velocity.z], true);
        body.set_angvel(angvel, true);
    }

    /// True when both linear and angular speed are below the settlement thresholds
    ///
    /// Unknown handles are never at rest.
    pub fn is_at_rest(&self, handle: BodyHandle) -> bool {
        let Some(body) = self.rigid_body_set.get(handle.0) else {
            return false;
        };
        body.linvel().norm() < self.settings.velocity_threshold
            && body.angvel().norm() < self.settings.angular_velocity_threshold
    }

    /// Stop the body and make it immovable; it keeps colliding with others
    pub fn freeze(&mut self, handle: BodyHandle) {
        let Some(body) = self.rigid_body_set.get_mut(handle.0) else {
            return;
        };
        body.set_linvel(Vector::zeros(), false);
        body.set_angvel(Vector::zeros(), false);
        body.set_body_type(RigidBodyType::Fixed, false);
    }

    #[cfg(test)]
    pub fn is_frozen(&self, handle: BodyHandle) -> bool {
        self.rigid_body_set
            .get(handle.0)
            .is_some_and(|body| body.body_type() == RigidBodyType::Fixed)
    }

    pub fn is_registered(&self, handle: BodyHandle) -> bool {
        self.body_to_piece.contains_key(&handle)
    }

    fn handle_for(&self, piece: PieceId) -> Option<BodyHandle> {
        self.body_to_piece
            .iter()
            .find_map(|(handle, owner)| (*owner == piece).then_some(*handle))
    }

    /// Number of registered piece bodies (the ground is not counted)
    pub fn body_count(&self) -> usize {
        self.body_to_piece.len()
    }

    /// World transform of a registered body
    pub fn transform(&self, handle: BodyHandle) -> Option<Transform> {
        if !self.is_registered(handle) {
            return None;
        }
        self.rigid_body_set
            .get(handle.0)
            .map(|body| from_isometry(body.position()))
    }
}

fn to_isometry(transform: &Transform) -> Isometry<Real> {
    let t = transform.translation;
    let q = transform.rotation.normalize();
    Isometry::from_parts(
        Translation3::new(t.x, t.y, t.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

fn from_isometry(iso: &Isometry<Real>) -> Transform {
    let t = iso.translation.vector;
    let q = iso.rotation.quaternion();
    Transform::from_translation_rotation(
        Vec3::new(t.x, t.y, t.z),
        Quat::from_xyzw(q.i, q.j, q.k, q.w),
    )
}
