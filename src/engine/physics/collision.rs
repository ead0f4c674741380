use rapier3d::prelude::*;

/// Collision groups for filtering what objects can collide with each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionGroups {
    /// Static ground plane
    Ground = 0b0000_0001,

    /// Debris pieces from an exploded actor
    Debris = 0b0000_0010,

    /// Anything else; interacts with everything
    Default = 0b1000_0000,
}

impl CollisionGroups {
    /// Convert to rapier3d's InteractionGroups
    pub fn to_interaction_groups(self) -> InteractionGroups {
        let memberships = Group::from_bits_truncate(self as u32);

        let filter = match self {
            // The ground only needs to stop debris
            CollisionGroups::Ground => Group::from_bits_truncate(
                CollisionGroups::Debris as u32 | CollisionGroups::Default as u32,
            ),

            // Debris lands on the ground and piles up on other debris
            CollisionGroups::Debris => Group::from_bits_truncate(
                CollisionGroups::Ground as u32
                    | CollisionGroups::Debris as u32
                    | CollisionGroups::Default as u32,
            ),

            CollisionGroups::Default => Group::ALL,
        };

        InteractionGroups::new(memberships, filter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_groups_bits() {
        let groups = [
            CollisionGroups::Ground,
            CollisionGroups::Debris,
            CollisionGroups::Default,
        ];

        for (i, group1) in groups.iter().enumerate() {
            for (j, group2) in groups.iter().enumerate() {
                if i != j {
                    assert_ne!(
                        *group1 as u32, *group2 as u32,
                        "Groups must have unique bits"
                    );
                }
            }
        }
    }

    #[test]
    fn test_debris_collides_with_ground_and_debris() {
        let debris = CollisionGroups::Debris.to_interaction_groups();
        let ground = CollisionGroups::Ground.to_interaction_groups();

        assert!(debris.filter.contains(ground.memberships));
        assert!(ground.filter.contains(debris.memberships));
        assert!(debris.filter.contains(debris.memberships));
    }

    #[test]
    fn test_ground_ignores_ground() {
        let ground = CollisionGroups::Ground.to_interaction_groups();
        assert!(!ground.filter.contains(ground.memberships));
    }
}
