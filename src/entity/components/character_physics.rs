use crate::entity::components::fall_monitor::{FallMonitor, FallOutcome};
use crate::entity::components::objects::{Health, PlayerInput, WorldPosition};
use crate::entity::messages::{ComponentMessage, LocalBroadcast, MessageOutcome};
use crate::error::CharacterError;
use crate::game::level::LevelManager;
use crate::networking::NetworkSink;
use crate::networking::messages::CharacterInformationMessage;
use crate::networking::sync_timer::SyncTimer;
use crate::physics::character_controller::CharacterController;
use crate::physics::collision_flags::CollisionFlags;
use crate::physics::physics_world::PhysicsWorld;
use crate::settings::movement_settings::{LoadedSettings, MovementSettings};
use crate::util::file_change_bus::{FileChanged, NotifyResponse};
use glam::Vec3;
use hecs::Entity;
use log::{debug, error, info, trace};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, Weak};

/// Everything a character needs from the outside for one frame.
pub struct FrameContext<'a> {
    pub delta_time: f32,
    pub levels: &'a LevelManager,
    pub network: &'a mut dyn NetworkSink,
    pub broadcasts: &'a mut Vec<(Entity, LocalBroadcast)>,
}

/// The owning entity and the sibling components a character collaborates with. All of them are optional.
pub struct Owner<'a> {
    pub entity: Entity,
    pub position: Option<&'a mut WorldPosition>,
    pub health: Option<&'a mut Health>,
    pub input: Option<&'a mut PlayerInput>,
}

impl Owner<'_> {
    fn world_position(&self) -> Vec3 {
        self.position.as_ref().map_or(Vec3::ZERO, |position| position.0)
    }
}

/// Drives a kinematic capsule from movement intents, kills characters that fall for too long and keeps the rest of
/// the entity as well as the server informed about where it is going.
pub struct CharacterPhysics {
    file_path: PathBuf,
    settings: MovementSettings,
    has_loaded_settings: bool,
    speed: f32,
    rotation_speed: f32,
    physics_world: Option<Weak<RwLock<PhysicsWorld>>>,
    controller: Option<CharacterController>,
    default_collision_flags: CollisionFlags,
    position: Vec3,
    wanted_direction: Vec3,
    move_direction: Vec3,
    should_jump: bool,
    fall_monitor: FallMonitor,
    sync_timer: SyncTimer,
}

impl CharacterPhysics {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            settings: MovementSettings::default(),
            has_loaded_settings: false,
            speed: 0.0,
            rotation_speed: 0.0,
            physics_world: None,
            controller: None,
            default_collision_flags: CollisionFlags::NONE,
            position: Vec3::ZERO,
            wanted_direction: Vec3::ZERO,
            move_direction: Vec3::ZERO,
            should_jump: false,
            fall_monitor: FallMonitor::default(),
            sync_timer: SyncTimer::default(),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn settings(&self) -> &MovementSettings {
        &self.settings
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn wanted_direction(&self) -> Vec3 {
        self.wanted_direction
    }

    /// Whether a jump has been requested but not performed yet.
    pub fn is_jumping(&self) -> bool {
        self.should_jump
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn controller(&self) -> Option<&CharacterController> {
        self.controller.as_ref()
    }

    pub fn default_collision_flags(&self) -> CollisionFlags {
        self.default_collision_flags
    }

    pub fn airborne_time(&self) -> f32 {
        self.fall_monitor.airborne_time()
    }

    pub fn is_bound(&self) -> bool {
        self.world().is_some()
    }

    fn world(&self) -> Option<Arc<RwLock<PhysicsWorld>>> {
        self.physics_world.as_ref().and_then(Weak::upgrade)
    }

    pub fn init(&mut self, owner: &mut Owner, levels: &LevelManager) {
        if let Err(err) = self.load_settings(owner, levels) {
            debug!("{:?} runs without a controller until a reload succeeds: {}", owner.entity, err);
        }
    }

    /// Reads the settings file and rebuilds the controller from it. On failure, nothing is changed.
    pub fn load_settings(&mut self, owner: &mut Owner, levels: &LevelManager) -> Result<(), CharacterError> {
        let loaded = match LoadedSettings::load(&self.file_path) {
            Ok(loaded) => loaded,
            Err(err) => {
                error!("Could not load the movement settings: {}", err);
                return Err(err);
            }
        };

        self.settings = loaded.settings;
        self.speed = self.settings.speed;
        self.rotation_speed = self.settings.sensitivity;

        if let Some(input) = owner.input.as_deref_mut() {
            input.set_sensitivity(self.rotation_speed);
        }

        if !self.has_loaded_settings {
            if let Some(position) = owner.position.as_deref_mut() {
                if position.0 == Vec3::ZERO {
                    position.0 = Vec3::new(0.0, loaded.spawn_height, 0.0);
                }
            }
        }
        self.has_loaded_settings = true;

        if !self.is_bound() && self.bind_to_world(levels).is_err() {
            debug!(
                "No physics world for {:?} yet, the controller will be built once there is one",
                owner.entity
            );
            return Ok(());
        }

        self.rebuild_controller(owner.entity, owner.world_position())
    }

    /// Picks up the physics world of the current level. Does nothing when there is none (yet).
    pub fn bind_to_world(&mut self, levels: &LevelManager) -> Result<(), CharacterError> {
        let world = levels
            .current_physics_world()
            .ok_or(CharacterError::WorldUnavailable)?;

        // The ghost of a controller without a live world went down with its level.
        if !self.is_bound() {
            self.controller = None;
        }
        self.physics_world = Some(world);
        Ok(())
    }

    /// Replaces the ghost and the controller with fresh ones built from the current settings.
    pub fn rebuild_controller(&mut self, owner: Entity, spawn_position: Vec3) -> Result<(), CharacterError> {
        let world = self.world().ok_or(CharacterError::WorldUnavailable)?;
        self.teardown_controller();

        let mut world = world.write().expect("Physics world lock poisoned");
        let ghost = world.insert_collider(CharacterController::build_ghost(
            &self.settings,
            spawn_position,
        ));

        let mut controller = CharacterController::new(ghost, self.settings, CollisionFlags::NONE);
        let flags = controller.collision_flags() | CollisionFlags::KINEMATIC_OBJECT;
        controller.set_collision_flags(&mut world, flags);
        self.default_collision_flags = controller.collision_flags();
        world.register_owner(ghost, owner);

        trace!("Built character controller for {:?} at {}", owner, spawn_position);
        self.controller = Some(controller);
        Ok(())
    }

    /// Removes the ghost from the world it lives in and releases the controller.
    pub fn teardown_controller(&mut self) {
        let Some(controller) = self.controller.take() else {
            return;
        };

        if let Some(world) = self.world() {
            world
                .write()
                .expect("Physics world lock poisoned")
                .drop_collider(controller.ghost(), true);
        }
    }

    /// Forgets the current world (e.g. after a level change) and rebuilds everything in the current level.
    pub fn rebind_world(&mut self, owner: &mut Owner, levels: &LevelManager) -> Result<(), CharacterError> {
        self.teardown_controller();
        self.physics_world = None;
        self.load_settings(owner, levels)
    }

    pub fn set_collision_flags(&mut self, flags: CollisionFlags) -> Result<(), CharacterError> {
        let world = self.world().ok_or(CharacterError::WorldUnavailable)?;
        let controller = self
            .controller
            .as_mut()
            .ok_or(CharacterError::ControllerUnbound)?;
        controller.set_collision_flags(&mut world.write().expect("Physics world lock poisoned"), flags);
        Ok(())
    }

    /// Undoes temporary states like no-clip or ragdolls.
    pub fn reset_collision_flags(&mut self) -> Result<(), CharacterError> {
        self.set_collision_flags(self.default_collision_flags)
    }

    pub fn on_message(&mut self, owner: Entity, message: &ComponentMessage, player: Option<Entity>) -> MessageOutcome {
        match *message {
            ComponentMessage::MoveObject {
                direction,
                should_jump,
            } => {
                self.move_direction = direction;
                self.wanted_direction = direction;
                self.should_jump = should_jump;
            }
            ComponentMessage::SyncPosition { position } => {
                self.position = position;
                if let (Some(world), Some(controller)) = (self.world(), &self.controller) {
                    world
                        .write()
                        .expect("Physics world lock poisoned")
                        .teleport_collider(controller.ghost(), position);
                }
            }
            ComponentMessage::Died => {
                if player != Some(owner) {
                    info!("Removing character physics of {:?}", owner);
                    return MessageOutcome::Detach;
                }
            }
        }

        MessageOutcome::Keep
    }

    pub fn on_file_changed(&mut self, owner: &mut Owner, levels: &LevelManager, event: &FileChanged) -> NotifyResponse {
        if !event.is_about(&self.file_path) {
            return NotifyResponse::Continue;
        }

        debug!("{:?} changed, reloading the movement settings", self.file_path);
        if let Err(err) = self.load_settings(owner, levels) {
            debug!("Keeping the previous settings of {:?}: {}", owner.entity, err);
        }
        NotifyResponse::Stop
    }

    pub fn update(&mut self, owner: &mut Owner, ctx: &mut FrameContext) {
        let delta_time = ctx.delta_time;
        self.forget_expired_world(owner.entity);

        let grounded = self
            .controller
            .as_ref()
            .is_none_or(CharacterController::can_jump);

        if self
            .fall_monitor
            .observe(grounded, owner.health.as_deref_mut(), delta_time)
            == FallOutcome::Died
        {
            debug!("{:?} fell to death", owner.entity);
            return;
        }

        self.sync_movement_data(owner.entity, grounded, ctx);

        if !self.is_bound() {
            if self.bind_to_world(ctx.levels).is_err() {
                self.discard_intent();
                return;
            }
            debug!("{:?} bound to the physics world", owner.entity);
        }

        if self.controller.is_none() && self.has_loaded_settings {
            let spawn_position = owner.world_position();
            if let Err(err) = self.rebuild_controller(owner.entity, spawn_position) {
                debug!("Could not build the controller of {:?}: {}", owner.entity, err);
            }
        }

        self.update_movement(owner.entity, ctx);
    }

    /// The ghost went down with its world, so does the controller. Falling needs a world to fall in.
    fn forget_expired_world(&mut self, owner: Entity) {
        if self.physics_world.is_none() || self.is_bound() {
            return;
        }

        debug!("The physics world of {:?} is gone", owner);
        self.physics_world = None;
        self.controller = None;
    }

    fn discard_intent(&mut self) {
        self.wanted_direction = Vec3::ZERO;
        self.should_jump = false;
    }

    fn sync_movement_data(&mut self, owner: Entity, grounded: bool, ctx: &mut FrameContext) {
        ctx.broadcasts.push((
            owner,
            LocalBroadcast::CharacterInfo {
                direction: self.wanted_direction,
                is_jumping: !grounded,
            },
        ));

        if self.sync_timer.tick(ctx.delta_time) {
            ctx.network.send_to_server(CharacterInformationMessage {
                object_id: owner.to_bits().get(),
                wanted_direction: self.wanted_direction,
                is_jumping: !grounded,
            });
        }
    }

    fn update_movement(&mut self, owner: Entity, ctx: &mut FrameContext) {
        let wanted_direction = std::mem::take(&mut self.wanted_direction);
        let should_jump = std::mem::take(&mut self.should_jump);

        let Some(world) = self.world() else {
            return;
        };
        let Some(controller) = self.controller.as_mut() else {
            return;
        };

        controller.set_walk_velocity(wanted_direction * self.speed);
        if should_jump && !controller.jump() {
            trace!("{:?} can't jump while airborne", owner);
        }

        let new_position = {
            let mut world = world.write().expect("Physics world lock poisoned");
            if !world.is_in_broadphase(controller.ghost()) {
                return;
            }

            if !controller.collision_flags().has_no_contact_response() {
                controller.update_action(&mut world, ctx.delta_time);
            }

            match controller.current_position(&world) {
                Some(position) => position,
                None => return,
            }
        };

        if new_position != self.position {
            self.change_position(owner, new_position, ctx);
        }
    }

    fn change_position(&mut self, owner: Entity, position: Vec3, ctx: &mut FrameContext) {
        self.position = position;
        ctx.broadcasts.push((
            owner,
            LocalBroadcast::PositionChanged {
                position,
                direction: self.move_direction,
            },
        ));
    }
}

impl Drop for CharacterPhysics {
    fn drop(&mut self) {
        self.teardown_controller();
    }
}
