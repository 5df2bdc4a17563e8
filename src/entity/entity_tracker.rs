use crate::entity::components::objects::{Health, PlayerInput, WorldPosition};
use glam::Vec3;
use hecs::{Entity, World};
use log::{debug, warn};

/// Owns the entities and knows which of them is the local player.
#[derive(Default)]
pub struct EntityTracker {
    world: World,
    player: Option<Entity>,
}

impl EntityTracker {
    pub fn new() -> Self {
        EntityTracker::default()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn player(&self) -> Option<Entity> {
        self.player
    }

    /// The player never loses its character physics when dying, everybody else does.
    pub fn spawn_player(&mut self, position: Vec3, health: i32) -> Entity {
        let entity = self.world.spawn((
            WorldPosition(position),
            Health::new(health),
            PlayerInput::default(),
        ));
        debug!("Spawned player {:?}", entity);
        self.player = Some(entity);
        entity
    }

    pub fn spawn_npc(&mut self, position: Vec3, health: i32) -> Entity {
        self.world
            .spawn((WorldPosition(position), Health::new(health)))
    }

    pub fn destroy_object(&mut self, entity: Entity) {
        if self.world.despawn(entity).is_err() {
            warn!(
                "Could not destroy {:?}, because it wasn't known to us",
                entity
            );
            return;
        }

        if self.player == Some(entity) {
            self.player = None;
        }
    }

    pub fn position_of(&self, entity: Entity) -> Option<Vec3> {
        self.world
            .get::<&WorldPosition>(entity)
            .ok()
            .map(|position| position.0)
    }

    pub fn health_of(&self, entity: Entity) -> Option<i32> {
        self.world
            .get::<&Health>(entity)
            .ok()
            .map(|health| health.get())
    }
}
