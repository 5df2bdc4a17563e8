use crate::physics::collision_flags::{CollisionFilter, CollisionFlags};
use crate::physics::physics_world::{GRAVITY, PhysicsWorld};
use crate::settings::movement_settings::MovementSettings;
use glam::Vec3;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

/// A kinematic capsule that is swept through a [`PhysicsWorld`]. It owns the vertical motion (gravity, jumping,
/// terminal fall speed), walking is supplied as a velocity every frame.
pub struct CharacterController {
    inner: KinematicCharacterController,
    ghost: ColliderHandle,
    settings: MovementSettings,
    flags: CollisionFlags,
    walk_velocity: Vec3,
    vertical_velocity: f32,
    grounded: bool,
}

impl CharacterController {
    /// Builds the ghost collider: a capsule around `position`, identity rotation, in the character filter group.
    pub fn build_ghost(settings: &MovementSettings, position: Vec3) -> Collider {
        ColliderBuilder::capsule_y(settings.height * 0.5, settings.radius)
            .translation(position.into())
            .collision_groups(CollisionFilter::character())
            .active_collision_types(ActiveCollisionTypes::default() | ActiveCollisionTypes::KINEMATIC_FIXED)
            .build()
    }

    pub fn new(ghost: ColliderHandle, settings: MovementSettings, flags: CollisionFlags) -> Self {
        let autostep = (settings.step_height > 0.0).then(|| CharacterAutostep {
            max_height: CharacterLength::Absolute(settings.step_height),
            min_width: CharacterLength::Absolute(settings.radius),
            include_dynamic_bodies: false,
        });

        Self {
            inner: KinematicCharacterController {
                up: Vector::y_axis(),
                autostep,
                ..KinematicCharacterController::default()
            },
            ghost,
            settings,
            flags,
            walk_velocity: Vec3::ZERO,
            vertical_velocity: 0.0,
            // A fresh controller has neither vertical velocity nor offset, so it counts as standing.
            grounded: true,
        }
    }

    pub fn ghost(&self) -> ColliderHandle {
        self.ghost
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn collision_flags(&self) -> CollisionFlags {
        self.flags
    }

    /// Flags with [`CollisionFlags::NO_CONTACT_RESPONSE`] turn the ghost into a sensor.
    pub fn set_collision_flags(&mut self, world: &mut PhysicsWorld, flags: CollisionFlags) {
        self.flags = flags;
        world.set_sensor(self.ghost, flags.has_no_contact_response());
    }

    pub fn can_jump(&self) -> bool {
        self.grounded
    }

    pub fn walk_velocity(&self) -> Vec3 {
        self.walk_velocity
    }

    pub fn set_walk_velocity(&mut self, velocity: Vec3) {
        self.walk_velocity = velocity;
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.vertical_velocity
    }

    /// Returns whether the jump has been applied. Mid-air jumps are ignored.
    pub fn jump(&mut self) -> bool {
        if !self.can_jump() {
            return false;
        }

        self.vertical_velocity = self.settings.jump_speed;
        self.grounded = false;
        true
    }

    /// Moves the ghost by one frame worth of walking and falling.
    pub fn update_action(&mut self, world: &mut PhysicsWorld, delta_time: f32) {
        self.vertical_velocity -= GRAVITY * self.settings.gravity_multiplier * delta_time;
        if self.settings.fall_speed > 0.0 {
            self.vertical_velocity = self.vertical_velocity.max(-self.settings.fall_speed);
        }

        let desired = self.walk_velocity * delta_time + Vec3::Y * (self.vertical_velocity * delta_time);
        let Some(movement) = world.move_character(&self.inner, self.ghost, desired, delta_time) else {
            return;
        };

        self.grounded = movement.grounded;
        if self.grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = 0.0;
        }

        // Bumped our head
        if self.vertical_velocity > 0.0 && movement.translation.y < desired.y * 0.5 {
            self.vertical_velocity = 0.0;
        }
    }

    pub fn current_position(&self, world: &PhysicsWorld) -> Option<Vec3> {
        world.collider_translation(self.ghost)
    }
}
