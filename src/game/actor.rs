// Actors (the two combatants) and the pieces their assemblies break into

use glam::{Quat, Vec3};

use crate::core::Transform;
use crate::engine::physics::BodyHandle;

/// Which side of the fight an actor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorTag {
    /// Starts at negative Z and advances along +Z
    First,
    /// Starts at positive Z and advances along -Z
    Second,
}

impl ActorTag {
    /// Sign of the actor's movement along the approach (Z) axis
    pub fn approach_sign(&self) -> f32 {
        match self {
            Self::First => 1.0,
            Self::Second => -1.0,
        }
    }
}

/// Unique identifier for a piece across both actors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId {
    pub actor: ActorTag,
    pub index: u32,
}

/// One rigid fragment of an actor's visual assembly
#[derive(Debug, Clone)]
pub struct Piece {
    pub id: PieceId,
    /// Node name from the source assembly
    pub name: String,
    /// Size of the local bounding box; `None` when the piece has no geometry
    extent: Option<Vec3>,
    /// Relative to the actor while attached, world space once detached
    transform: Transform,
    attached: bool,
    pub visible: bool,
    settled: bool,
    /// Simulation body, present between explosion and boundary exit
    body: Option<BodyHandle>,
}

impl Piece {
    /// Create a piece attached to its actor at `local`
    pub fn new(id: PieceId, name: &str, extent: Option<Vec3>, local: Transform) -> Self {
        Self {
            id,
            name: name.to_string(),
            extent,
            transform: local,
            attached: true,
            visible: true,
            settled: false,
            body: None,
        }
    }

    /// Bounding extent, if the piece has usable geometry
    pub fn extent(&self) -> Option<Vec3> {
        self.extent.filter(|e| e.is_finite())
    }

    pub fn has_geometry(&self) -> bool {
        self.extent().is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Transform as stored: local while attached, world once detached
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// World transform given the transform of the owning actor
    pub fn world_transform(&self, parent: &Transform) -> Transform {
        if self.attached {
            parent.mul_transform(&self.transform)
        } else {
            self.transform
        }
    }

    /// Bake the world transform and stop following the actor
    pub fn detach(&mut self, parent: &Transform) {
        self.transform = self.world_transform(parent);
        self.attached = false;
    }

    /// Overwrite the world transform of a detached piece (physics write-back)
    pub fn set_world_transform(&mut self, transform: Transform) {
        debug_assert!(!self.attached, "attached pieces are positioned by their actor");
        self.transform = transform;
    }

    /// Rotate the piece in its own local frame (used for spinning weapons)
    pub fn rotate_local(&mut self, rotation: Quat) {
        self.transform.rotation = (self.transform.rotation * rotation).normalize();
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Mark the piece settled, returns true only on the first call
    pub fn settle(&mut self) -> bool {
        if self.settled {
            false
        } else {
            self.settled = true;
            true
        }
    }

    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn attach_body(&mut self, handle: BodyHandle) {
        self.body = Some(handle);
    }

    /// Drop the body association, returning the old handle
    pub fn take_body(&mut self) -> Option<BodyHandle> {
        self.body.take()
    }
}

/// A combatant: a transform-bearing node owning its breakable pieces
#[derive(Debug, Clone)]
pub struct Actor {
    pub tag: ActorTag,
    pub name: String,
    pub transform: Transform,
    /// Current speed toward the opponent (units/frame)
    pub approach_speed: f32,
    pub pieces: Vec<Piece>,
    /// Indices into `pieces` that spin as weapons
    pub weapons: Vec<usize>,
    /// Local axis weapons spin around; the sign sets the direction
    pub weapon_axis: Vec3,
}

impl Actor {
    pub fn new(tag: ActorTag, name: &str, transform: Transform, approach_speed: f32) -> Self {
        let weapon_axis = match tag {
            ActorTag::First => Vec3::NEG_X,
            ActorTag::Second => Vec3::Z,
        };

        Self {
            tag,
            name: name.to_string(),
            transform,
            approach_speed,
            pieces: Vec::new(),
            weapons: Vec::new(),
            weapon_axis,
        }
    }

    /// Add a piece, returning its index
    pub fn add_piece(&mut self, name: &str, extent: Option<Vec3>, local: Transform) -> usize {
        let index = self.pieces.len();
        let id = PieceId {
            actor: self.tag,
            index: index as u32,
        };
        self.pieces.push(Piece::new(id, name, extent, local));
        index
    }

    /// Add a piece that also spins as a weapon
    pub fn add_weapon(&mut self, name: &str, extent: Option<Vec3>, local: Transform) -> usize {
        let index = self.add_piece(name, extent, local);
        self.weapons.push(index);
        index
    }

    pub fn position(&self) -> Vec3 {
        self.transform.translation
    }

    /// Move along the approach axis by the current speed
    pub fn advance(&mut self) {
        self.transform.translation.z += self.tag.approach_sign() * self.approach_speed;
    }

    /// Rotate weapon pieces that are still attached by `angle` radians
    pub fn spin_weapons(&mut self, angle: f32) {
        if angle == 0.0 {
            return;
        }
        let rotation = Quat::from_axis_angle(self.weapon_axis.normalize(), angle);
        for &index in &self.weapons {
            if let Some(piece) = self.pieces.get_mut(index) {
                if piece.is_attached() {
                    piece.rotate_local(rotation);
                }
            }
        }
    }

    /// Detach every piece so it keeps its current world placement
    pub fn detach_pieces(&mut self) {
        let parent = self.transform;
        for piece in &mut self.pieces {
            piece.detach(&parent);
        }
    }

    pub fn settled_count(&self) -> usize {
        self.pieces.iter().filter(|p| p.is_settled()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn actor_with_piece(tag: ActorTag) -> Actor {
        let mut actor = Actor::new(
            tag,
            "bot",
            Transform::from_translation(Vec3::new(0.0, 3.0, -200.0)),
            0.1,
        );
        actor.add_piece(
            "hull",
            Some(Vec3::new(4.0, 2.0, 6.0)),
            Transform::from_translation(Vec3::new(1.0, 1.0, 0.0)),
        );
        actor
    }

    #[test]
    fn test_approach_directions() {
        assert_eq!(ActorTag::First.approach_sign(), 1.0);
        assert_eq!(ActorTag::Second.approach_sign(), -1.0);
    }

    #[test]
    fn test_advance_moves_along_z() {
        let mut first = actor_with_piece(ActorTag::First);
        first.advance();
        assert_relative_eq!(first.position().z, -199.9, epsilon = 1e-4);

        let mut second = actor_with_piece(ActorTag::Second);
        second.advance();
        assert_relative_eq!(second.position().z, -200.1, epsilon = 1e-4);
    }

    #[test]
    fn test_piece_world_transform_follows_actor_until_detached() {
        let mut actor = actor_with_piece(ActorTag::First);
        let world = actor.pieces[0].world_transform(&actor.transform);
        assert_relative_eq!(world.translation.y, 4.0);

        actor.detach_pieces();
        actor.transform.translation.z = 0.0;

        let piece = &actor.pieces[0];
        assert!(!piece.is_attached());
        assert_relative_eq!(piece.world_transform(&actor.transform).translation.z, -200.0);
    }

    #[test]
    fn test_settle_only_once() {
        let mut actor = actor_with_piece(ActorTag::First);
        let piece = &mut actor.pieces[0];
        assert!(piece.settle());
        assert!(!piece.settle());
        assert!(piece.is_settled());
        assert_eq!(actor.settled_count(), 1);
    }

    #[test]
    fn test_missing_or_broken_geometry() {
        let mut actor = actor_with_piece(ActorTag::Second);
        actor.add_piece("empty", None, Transform::IDENTITY);
        actor.add_piece(
            "broken",
            Some(Vec3::new(f32::NAN, 1.0, 1.0)),
            Transform::IDENTITY,
        );

        assert!(actor.pieces[0].has_geometry());
        assert!(!actor.pieces[1].has_geometry());
        assert!(!actor.pieces[2].has_geometry());
    }

    #[test]
    fn test_spin_weapons_only_rotates_attached_weapons() {
        let mut actor = actor_with_piece(ActorTag::First);
        let weapon = actor.add_weapon("weapon", Some(Vec3::ONE), Transform::IDENTITY);

        actor.spin_weapons(0.4);
        assert_ne!(actor.pieces[weapon].transform().rotation, Quat::IDENTITY);
        assert_eq!(actor.pieces[0].transform().rotation, Quat::IDENTITY);

        actor.detach_pieces();
        let before = *actor.pieces[weapon].transform();
        actor.spin_weapons(0.4);
        assert_eq!(*actor.pieces[weapon].transform(), before);
    }

    #[test]
    fn test_piece_ids_are_unique_per_actor() {
        let mut actor = actor_with_piece(ActorTag::First);
        actor.add_piece("plate", Some(Vec3::ONE), Transform::IDENTITY);
        assert_ne!(actor.pieces[0].id, actor.pieces[1].id);
        assert_eq!(actor.pieces[1].id.index, 1);
    }
}
