use crate::physics::physics_world::PhysicsWorld;
use log::trace;
use std::sync::{Arc, RwLock, Weak};

pub struct Level {
    name: String,
    physics_world: Option<Arc<RwLock<PhysicsWorld>>>,
}

impl Level {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physics_world: Some(Arc::new(RwLock::new(PhysicsWorld::new()))),
        }
    }

    /// A level that is still loading and has no collision world yet.
    pub fn without_physics(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physics_world: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn physics_world(&self) -> Option<&Arc<RwLock<PhysicsWorld>>> {
        self.physics_world.as_ref()
    }

    pub fn attach_physics_world(&mut self, world: PhysicsWorld) {
        self.physics_world = Some(Arc::new(RwLock::new(world)));
    }

    pub fn step(&self, delta_time: f32) {
        if let Some(world) = &self.physics_world {
            world
                .write()
                .expect("Physics world lock poisoned")
                .step(delta_time);
        }
    }
}

/// Owns the currently active level. Characters only ever hold [`Weak`] references to its physics world, so
/// switching or unloading a level makes them unbound.
#[derive(Default)]
pub struct LevelManager {
    current: Option<Level>,
}

impl LevelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the previously active level.
    pub fn change_level(&mut self, level: Level) -> Option<Level> {
        trace!("Switching to level {}", level.name());
        self.current.replace(level)
    }

    pub fn unload(&mut self) -> Option<Level> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&Level> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Level> {
        self.current.as_mut()
    }

    pub fn current_physics_world(&self) -> Option<Weak<RwLock<PhysicsWorld>>> {
        self.current
            .as_ref()
            .and_then(Level::physics_world)
            .map(Arc::downgrade)
    }

    pub fn step(&self, delta_time: f32) {
        if let Some(level) = &self.current {
            level.step(delta_time);
        }
    }
}
