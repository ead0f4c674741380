use super::collision::CollisionGroups;
use rapier3d::prelude::*;

/// Smallest half-extent a collider may have; degenerate boxes are inflated to this
pub const MIN_HALF_EXTENT: Real = 0.01;

/// Builder for creating rigid bodies with common configurations
pub struct BodyBuilder {
    body_type: RigidBodyType,
    position: Isometry<Real>,
    linear_damping: Real,
    angular_damping: Real,
}

impl BodyBuilder {
    /// Create a new dynamic body (affected by forces and collisions)
    pub fn new_dynamic() -> Self {
        Self {
            body_type: RigidBodyType::Dynamic,
            position: Isometry::identity(),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Create a new fixed (static) body (completely immovable)
    pub fn new_fixed() -> Self {
        Self {
            body_type: RigidBodyType::Fixed,
            position: Isometry::identity(),
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }

    /// Set the initial position and orientation
    pub fn position(mut self, position: Isometry<Real>) -> Self {
        self.position = position;
        self
    }

    /// Air resistance (0.0 = none)
    pub fn linear_damping(mut self, damping: Real) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Spin resistance (0.0 = none)
    pub fn angular_damping(mut self, damping: Real) -> Self {
        self.angular_damping = damping;
        self
    }

    /// Build the rigid body
    pub fn build(self) -> RigidBody {
        RigidBodyBuilder::new(self.body_type)
            .position(self.position)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .build()
    }
}

/// Builder for creating colliders with common configurations
pub struct ColliderBuilder3D {
    shape: SharedShape,
    collision_groups: CollisionGroups,
    friction: Real,
    restitution: Real,
    density: Option<Real>,
    mass: Option<Real>,
}

impl ColliderBuilder3D {
    /// Create a box-shaped collider; zero or negative half-extents are inflated
    pub fn cuboid(half_extents: Vector<Real>) -> Self {
        let hx = half_extents.x.max(MIN_HALF_EXTENT);
        let hy = half_extents.y.max(MIN_HALF_EXTENT);
        let hz = half_extents.z.max(MIN_HALF_EXTENT);
        Self::from_shape(SharedShape::cuboid(hx, hy, hz))
    }

    /// Create an infinite plane facing +Y
    pub fn ground_plane() -> Self {
        Self::from_shape(SharedShape::halfspace(Vector::y_axis()))
    }

    fn from_shape(shape: SharedShape) -> Self {
        Self {
            shape,
            collision_groups: CollisionGroups::Default,
            friction: 0.5,
            restitution: 0.0,
            density: Some(1.0),
            mass: None,
        }
    }

    /// Set the collision groups for filtering
    pub fn collision_groups(mut self, groups: CollisionGroups) -> Self {
        self.collision_groups = groups;
        self
    }

    /// Set friction coefficient (0.0 = no friction, 1.0 = high friction)
    pub fn friction(mut self, friction: Real) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution/bounciness (0.0 = no bounce, 1.0 = perfect bounce)
    pub fn restitution(mut self, restitution: Real) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set mass directly (overrides density)
    pub fn mass(mut self, mass: Real) -> Self {
        self.mass = Some(mass);
        self.density = None;
        self
    }

    /// Build the collider
    pub fn build(self) -> Collider {
        let mut builder = rapier3d::prelude::ColliderBuilder::new(self.shape)
            .collision_groups(self.collision_groups.to_interaction_groups())
            .friction(self.friction)
            .restitution(self.restitution);

        if let Some(mass) = self.mass {
            builder = builder.mass(mass);
        } else if let Some(density) = self.density {
            builder = builder.density(density);
        }

        builder.build()
    }
}

/// Mass of a box of `size` at `density`, never below `min_mass`
pub fn mass_from_extent(size: Vector<Real>, density: Real, min_mass: Real) -> Real {
    let volume = size.x.abs() * size.y.abs() * size.z.abs();
    let mass = volume * density;
    if mass.is_finite() {
        mass.max(min_mass)
    } else {
        min_mass
    }
}

/// Common rigid body configurations for the fight scene
pub mod presets {
    use super::*;

    /// Material and damping shared by every debris body
    #[derive(Debug, Clone, Copy)]
    pub struct DebrisMaterial {
        pub friction: Real,
        pub restitution: Real,
        pub linear_damping: Real,
        pub angular_damping: Real,
    }

    /// Create a debris body at a world-space position
    pub fn debris_body(position: Isometry<Real>, material: &DebrisMaterial) -> RigidBody {
        BodyBuilder::new_dynamic()
            .position(position)
            .linear_damping(material.linear_damping)
            .angular_damping(material.angular_damping)
            .build()
    }

    /// Create a box collider sized to the piece's full bounding extent
    pub fn debris_collider(size: Vector<Real>, mass: Real, material: &DebrisMaterial) -> Collider {
        ColliderBuilder3D::cuboid(size / 2.0)
            .collision_groups(CollisionGroups::Debris)
            .friction(material.friction)
            .restitution(material.restitution)
            .mass(mass)
            .build()
    }

    /// Create the static ground body
    pub fn ground_body() -> RigidBody {
        BodyBuilder::new_fixed().build()
    }

    /// Create the ground collider (plane through the origin)
    pub fn ground_collider(friction: Real, restitution: Real) -> Collider {
        ColliderBuilder3D::ground_plane()
            .collision_groups(CollisionGroups::Ground)
            .friction(friction)
            .restitution(restitution)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn material() -> presets::DebrisMaterial {
        presets::DebrisMaterial {
            friction: 0.9,
            restitution: 0.05,
            linear_damping: 0.5,
            angular_damping: 0.5,
        }
    }

    #[test]
    fn test_body_builder_dynamic() {
        let body = BodyBuilder::new_dynamic()
            .position(Isometry::translation(10.0, 20.0, 30.0))
            .build();

        assert_eq!(body.body_type(), RigidBodyType::Dynamic);
        assert_eq!(body.translation().x, 10.0);
        assert_eq!(body.translation().z, 30.0);
    }

    #[test]
    fn test_ground_body_is_fixed() {
        assert_eq!(presets::ground_body().body_type(), RigidBodyType::Fixed);
    }

    #[test]
    fn test_debris_body_copies_damping() {
        let body = presets::debris_body(Isometry::identity(), &material());
        assert_eq!(body.linear_damping(), 0.5);
        assert_eq!(body.angular_damping(), 0.5);
    }

    #[test]
    fn test_debris_collider_material() {
        let collider = presets::debris_collider(vector![2.0, 2.0, 2.0], 1.0, &material());
        assert_eq!(collider.friction(), 0.9);
        assert_eq!(collider.restitution(), 0.05);
        assert_relative_eq!(collider.mass_properties().mass(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_mass_from_volume() {
        assert_relative_eq!(mass_from_extent(vector![10.0, 10.0, 10.0], 0.01, 0.1), 10.0);
    }

    #[test]
    fn test_mass_floor() {
        assert_eq!(mass_from_extent(vector![0.0, 0.0, 0.0], 0.01, 0.1), 0.1);
        assert_eq!(mass_from_extent(vector![1.0, 1.0, 1.0], 0.01, 0.1), 0.1);
    }

    #[test]
    fn test_zero_extent_collider_is_not_degenerate() {
        let collider = presets::debris_collider(vector![0.0, 0.0, 0.0], 0.1, &material());
        let cuboid = collider.shape().as_cuboid().expect("debris collider is a box");
        assert!(cuboid.half_extents.iter().all(|&h| h >= MIN_HALF_EXTENT));
        assert!(collider.mass_properties().mass() > 0.0);
    }

    #[test]
    fn test_ground_collider_is_halfspace() {
        let collider = presets::ground_collider(0.4, 0.2);
        assert!(collider.shape().as_halfspace().is_some());
        assert_eq!(collider.friction(), 0.4);
    }
}
