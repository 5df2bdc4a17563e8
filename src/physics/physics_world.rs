use crate::physics::collision_flags::CollisionFilter;
use glam::Vec3;
use hecs::Entity;
use rapier3d::control::{EffectiveCharacterMovement, KinematicCharacterController};
use rapier3d::prelude::*;
use std::collections::HashMap;

pub const GRAVITY: f32 = 9.81;

/// The collision world of a level. Characters are not rigid bodies, they only live in here as ghost colliders that
/// are moved by their controllers.
pub struct PhysicsWorld {
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    ccd_solver: CCDSolver,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    gravity: Vector<Real>,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    physics_hooks: (),
    event_handler: (),
    queries: QueryPipeline,
    /// Which entity owns which character ghost. Lookup only, the world never keeps an entity alive.
    owners: HashMap<ColliderHandle, Entity>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self {
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![0.0, -GRAVITY, 0.0], // y-up
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            physics_hooks: (),
            event_handler: (),
            queries: QueryPipeline::new(),
            owners: HashMap::new(),
        }
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the world and refreshes the query pipeline that the character controllers sweep against.
    pub fn step(&mut self, delta_time: f32) {
        self.integration_parameters.dt = delta_time;
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
            Some(&mut self.queries),
            &self.physics_hooks,
            &self.event_handler,
        );
    }

    pub fn insert_collider(&mut self, collider: Collider) -> ColliderHandle {
        self.collider_set.insert(collider)
    }

    /// Convenience for level geometry: an axis aligned box in the static filter group.
    pub fn insert_static_box(&mut self, center: Vec3, half_extents: Vec3) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(center.into())
            .collision_groups(CollisionFilter::static_geometry())
            .build();
        self.insert_collider(collider)
    }

    pub fn drop_collider(&mut self, collider: ColliderHandle, wake_up: bool) -> bool {
        self.owners.remove(&collider);
        self.collider_set
            .remove(
                collider,
                &mut self.island_manager,
                &mut self.rigid_body_set,
                wake_up,
            )
            .is_some()
    }

    pub fn contains_collider(&self, collider: ColliderHandle) -> bool {
        self.collider_set.contains(collider)
    }

    /// Whether the collider takes part in the broadphase, i.e. it's inserted and enabled.
    pub fn is_in_broadphase(&self, collider: ColliderHandle) -> bool {
        self.collider_set
            .get(collider)
            .is_some_and(|collider| collider.is_enabled())
    }

    pub fn set_collider_enabled(&mut self, collider: ColliderHandle, enabled: bool) {
        if let Some(collider) = self.collider_set.get_mut(collider) {
            collider.set_enabled(enabled);
        }
    }

    pub fn set_sensor(&mut self, collider: ColliderHandle, is_sensor: bool) {
        if let Some(collider) = self.collider_set.get_mut(collider) {
            collider.set_sensor(is_sensor);
        }
    }

    pub fn collider_translation(&self, collider: ColliderHandle) -> Option<Vec3> {
        self.collider_set
            .get(collider)
            .map(|collider| (*collider.translation()).into())
    }

    pub fn teleport_collider(&mut self, collider: ColliderHandle, translation: Vec3) -> bool {
        match self.collider_set.get_mut(collider) {
            Some(collider) => {
                collider.set_translation(translation.into());
                true
            }
            None => false,
        }
    }

    pub fn register_owner(&mut self, collider: ColliderHandle, owner: Entity) {
        self.owners.insert(collider, owner);
    }

    pub fn owner_of(&self, collider: ColliderHandle) -> Option<Entity> {
        self.owners.get(&collider).copied()
    }

    /// Sweeps the collider along `desired_translation` and moves it to where it stopped.
    pub fn move_character(
        &mut self,
        controller: &KinematicCharacterController,
        collider_handle: ColliderHandle,
        desired_translation: Vec3,
        delta_time: f32,
    ) -> Option<EffectiveCharacterMovement> {
        let collider = self.collider_set.get(collider_handle)?;

        let movement = controller.move_shape(
            delta_time,
            &self.rigid_body_set,
            &self.collider_set,
            &self.queries,
            collider.shape(),
            collider.position(),
            desired_translation.into(),
            QueryFilter::default()
                .exclude_collider(collider_handle)
                .exclude_sensors()
                .groups(CollisionFilter::character()),
            |_| {},
        );

        let collider = self.collider_set.get_mut(collider_handle)?;
        let translation = collider.translation() + movement.translation;
        collider.set_translation(translation);

        Some(movement)
    }
}
