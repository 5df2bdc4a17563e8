use rapier3d::prelude::{Group, InteractionGroups};
use std::ops::{BitAnd, BitOr};

/// Per-collider behaviour flags of a character ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CollisionFlags(pub u32);

impl CollisionFlags {
    pub const NONE: Self = Self(0);
    pub const STATIC_OBJECT: Self = Self(1 << 0);
    /// Moved by game code, not by the solver.
    pub const KINEMATIC_OBJECT: Self = Self(1 << 1);
    /// Still part of the world, but nothing collides with it and it doesn't move through the controller.
    pub const NO_CONTACT_RESPONSE: Self = Self(1 << 2);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn has_no_contact_response(self) -> bool {
        self.contains(Self::NO_CONTACT_RESPONSE)
    }
}

impl BitOr for CollisionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitAnd for CollisionFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

/// Broadphase filter groups. Characters collide with static geometry and everything in the default group.
pub struct CollisionFilter;

impl CollisionFilter {
    pub const DEFAULT: Group = Group::GROUP_1;
    pub const STATIC: Group = Group::GROUP_2;
    pub const CHARACTER: Group = Group::GROUP_3;

    pub fn character() -> InteractionGroups {
        InteractionGroups::new(Self::CHARACTER, Self::STATIC.union(Self::DEFAULT))
    }

    pub fn static_geometry() -> InteractionGroups {
        InteractionGroups::new(Self::STATIC, Group::ALL)
    }
}
