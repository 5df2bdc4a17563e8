use crate::entity::components::character_physics::{CharacterPhysics, FrameContext, Owner};
use crate::entity::components::objects::{Health, PlayerInput, WorldPosition};
use crate::entity::messages::{ComponentMessage, LocalBroadcast, MessageOutcome};
use crate::game::level::LevelManager;
use crate::networking::NetworkSink;
use crate::util::file_change_bus::{FileChangeBus, FileChanged, NotifyResponse};
use hecs::{Entity, World};
use log::{debug, trace, warn};
use std::time::Instant;

type CharacterQuery<'a> = (
    &'a mut CharacterPhysics,
    Option<&'a mut WorldPosition>,
    Option<&'a mut Health>,
    Option<&'a mut PlayerInput>,
);

/// Runs every [`CharacterPhysics`] of a world and routes messages and file changes to them.
#[derive(Default)]
pub struct CharacterPhysicsSystem {
    file_subscribers: FileChangeBus<Entity>,
    broadcasts: Vec<(Entity, LocalBroadcast)>,
    pending_removals: Vec<Entity>,
}

impl CharacterPhysicsSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the component to the entity, loads its settings and subscribes it to changes of its settings file.
    pub fn attach(
        &mut self,
        world: &mut World,
        entity: Entity,
        component: CharacterPhysics,
        levels: &LevelManager,
    ) -> Result<(), hecs::NoSuchEntity> {
        world.insert_one(entity, component)?;

        if let Ok((physics, position, health, input)) = world.query_one_mut::<CharacterQuery>(entity) {
            let mut owner = Owner {
                entity,
                position,
                health,
                input,
            };
            physics.init(&mut owner, levels);
        }

        self.file_subscribers.subscribe(entity);
        Ok(())
    }

    /// Removes the component right away, which tears its controller down.
    pub fn detach(&mut self, world: &mut World, entity: Entity) -> Option<CharacterPhysics> {
        self.file_subscribers.unsubscribe(&entity);
        world.remove_one::<CharacterPhysics>(entity).ok()
    }

    pub fn send(&mut self, world: &mut World, entity: Entity, message: ComponentMessage, player: Option<Entity>) {
        self.dispatch(world, [(entity, message)], player);
    }

    /// Delivers messages in order. Components asking to be removed are only removed once all messages went out.
    pub fn dispatch<I>(&mut self, world: &mut World, messages: I, player: Option<Entity>)
    where
        I: IntoIterator<Item = (Entity, ComponentMessage)>,
    {
        for (entity, message) in messages {
            let Ok(mut physics) = world.get::<&mut CharacterPhysics>(entity) else {
                warn!(
                    "Dropping {:?} for {:?}, it has no character physics",
                    message, entity
                );
                continue;
            };

            if physics.on_message(entity, &message, player) == MessageOutcome::Detach {
                self.pending_removals.push(entity);
            }
        }

        self.process_removals(world);
    }

    fn process_removals(&mut self, world: &mut World) {
        for entity in std::mem::take(&mut self.pending_removals) {
            if self.detach(world, entity).is_none() {
                debug!("{:?} was already gone", entity);
            }
        }
    }

    /// Forgets subscribers whose entity was despawned or lost its character physics in the meantime.
    fn prune_subscribers(&mut self, world: &World) {
        let before = self.file_subscribers.len();
        self.file_subscribers
            .retain(|&entity| world.satisfies::<&CharacterPhysics>(entity).unwrap_or(false));

        let pruned = before - self.file_subscribers.len();
        if pruned > 0 {
            trace!("Pruned {} stale file change subscribers", pruned);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.file_subscribers.len()
    }

    pub fn on_file_changed(&mut self, world: &mut World, levels: &LevelManager, event: &FileChanged) -> NotifyResponse {
        self.prune_subscribers(world);
        self.file_subscribers.dispatch(event, |&entity, event| {
            match world.query_one_mut::<CharacterQuery>(entity) {
                Ok((physics, position, health, input)) => {
                    let mut owner = Owner {
                        entity,
                        position,
                        health,
                        input,
                    };
                    physics.on_file_changed(&mut owner, levels, event)
                }
                Err(_) => NotifyResponse::Continue,
            }
        })
    }

    /// Steps all characters. The broadcasts of this frame are available through [`Self::broadcasts`] afterwards.
    pub fn update(&mut self, world: &mut World, levels: &LevelManager, network: &mut dyn NetworkSink, delta_time: f32) {
        let pre_update = Instant::now();
        self.broadcasts.clear();
        self.prune_subscribers(world);

        {
            let mut ctx = FrameContext {
                delta_time,
                levels,
                network: &mut *network,
                broadcasts: &mut self.broadcasts,
            };

            for (entity, (physics, position, health, input)) in world.query_mut::<CharacterQuery>() {
                let mut owner = Owner {
                    entity,
                    position,
                    health,
                    input,
                };
                physics.update(&mut owner, &mut ctx);
            }
        }

        for (entity, broadcast) in &self.broadcasts {
            if let LocalBroadcast::PositionChanged { position, .. } = broadcast {
                if let Ok(mut world_position) = world.get::<&mut WorldPosition>(*entity) {
                    world_position.0 = *position;
                }
            }
        }

        let duration = (Instant::now() - pre_update).as_millis();
        if duration > 6 {
            debug!("Character physics update took too long: {:?} ms", duration);
        }
    }

    /// To be called after the level changed, moves every character over to the new physics world.
    pub fn rebind_all(&mut self, world: &mut World, levels: &LevelManager) {
        for (entity, (physics, position, health, input)) in world.query_mut::<CharacterQuery>() {
            let mut owner = Owner {
                entity,
                position,
                health,
                input,
            };
            if let Err(err) = physics.rebind_world(&mut owner, levels) {
                debug!("Could not rebind {:?}: {}", entity, err);
            }
        }
    }

    pub fn broadcasts(&self) -> &[(Entity, LocalBroadcast)] {
        &self.broadcasts
    }

    pub fn broadcasts_for(&self, entity: Entity) -> impl Iterator<Item = &LocalBroadcast> {
        self.broadcasts
            .iter()
            .filter(move |(owner, _)| *owner == entity)
            .map(|(_, broadcast)| broadcast)
    }
}
