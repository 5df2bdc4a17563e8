use charphys::entity::components::character_physics::CharacterPhysics;
use charphys::entity::entity_tracker::EntityTracker;
use charphys::entity::messages::{ComponentMessage, LocalBroadcast};
use charphys::entity::systems::character_physics_system::CharacterPhysicsSystem;
use charphys::game::level::{Level, LevelManager};
use charphys::networking::RecordingNetworkSink;
use charphys::physics::collision_flags::CollisionFlags;
use charphys::util::file_change_bus::{FileChanged, NotifyResponse};
use glam::Vec3;
use hecs::Entity;
use rapier3d::prelude::ColliderHandle;
use std::path::{Path, PathBuf};

const SETTINGS: &str = r#"{
    "PlayerCollisionHeight": 1.8,
    "PlayerCollisionRadius": 0.3,
    "PlayerStepHeight": 0.3,
    "PlayerGravityMultiplier": 1.0,
    "PlayerSpeed": 5.0,
    "PlayerSensitivity": 20.0,
    "PlayerFallSpeed": 50.0,
    "PlayerJumpSpeed": 6.0,
    "PlayerHeight": 2.0
}"#;

fn settings_file(name: &str, content: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("charphys-tests");
    std::fs::create_dir_all(&dir).expect("temp dir is writable");
    let path = dir.join(format!("{}-{}.json", name, std::process::id()));
    std::fs::write(&path, content).expect("settings file is writable");
    path
}

fn level_with_floor() -> Level {
    let level = Level::new("Arena");
    level
        .physics_world()
        .expect("fresh levels have a physics world")
        .write()
        .expect("lock")
        .insert_static_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(100.0, 0.5, 100.0));
    level.step(1.0 / 60.0);
    level
}

struct Harness {
    levels: LevelManager,
    tracker: EntityTracker,
    system: CharacterPhysicsSystem,
    network: RecordingNetworkSink,
}

impl Harness {
    fn new(level: Option<Level>) -> Self {
        let mut levels = LevelManager::new();
        if let Some(level) = level {
            levels.change_level(level);
        }

        Self {
            levels,
            tracker: EntityTracker::new(),
            system: CharacterPhysicsSystem::new(),
            network: RecordingNetworkSink::default(),
        }
    }

    fn spawn_player(&mut self, settings: &Path) -> Entity {
        let entity = self.tracker.spawn_player(Vec3::ZERO, 100);
        self.attach(entity, settings);
        entity
    }

    fn spawn_npc(&mut self, settings: &Path, position: Vec3) -> Entity {
        let entity = self.tracker.spawn_npc(position, 100);
        self.attach(entity, settings);
        entity
    }

    fn attach(&mut self, entity: Entity, settings: &Path) {
        self.system
            .attach(
                self.tracker.world_mut(),
                entity,
                CharacterPhysics::new(settings),
                &self.levels,
            )
            .expect("entity exists");
    }

    fn send(&mut self, entity: Entity, message: ComponentMessage) {
        let player = self.tracker.player();
        self.system
            .send(self.tracker.world_mut(), entity, message, player);
    }

    fn update(&mut self, delta_time: f32) {
        self.system.update(
            self.tracker.world_mut(),
            &self.levels,
            &mut self.network,
            delta_time,
        );
    }

    fn file_changed(&mut self, path: &Path) -> NotifyResponse {
        self.system.on_file_changed(
            self.tracker.world_mut(),
            &self.levels,
            &FileChanged::new(path),
        )
    }

    fn with_physics<R>(&self, entity: Entity, f: impl FnOnce(&CharacterPhysics) -> R) -> R {
        let physics = self
            .tracker
            .world()
            .get::<&CharacterPhysics>(entity)
            .expect("entity has character physics");
        f(&physics)
    }

    fn ghost(&self, entity: Entity) -> Option<ColliderHandle> {
        self.with_physics(entity, |physics| physics.controller().map(|controller| controller.ghost()))
    }

    fn world_contains(&self, ghost: ColliderHandle) -> bool {
        self.levels
            .current()
            .and_then(Level::physics_world)
            .is_some_and(|world| world.read().expect("lock").contains_collider(ghost))
    }

    fn position_changes(&self, entity: Entity) -> Vec<Vec3> {
        self.system
            .broadcasts_for(entity)
            .filter_map(|broadcast| match broadcast {
                LocalBroadcast::PositionChanged { position, .. } => Some(*position),
                LocalBroadcast::CharacterInfo { .. } => None,
            })
            .collect()
    }
}

#[test]
fn walking_sets_velocity_and_reports_position() {
    let path = settings_file("walking", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    harness.send(
        player,
        ComponentMessage::MoveObject {
            direction: Vec3::X,
            should_jump: false,
        },
    );
    harness.update(0.1);

    harness.with_physics(player, |physics| {
        let controller = physics.controller().expect("controller is built");
        assert_eq!(controller.walk_velocity(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(physics.wanted_direction(), Vec3::ZERO);
    });

    let changes = harness.position_changes(player);
    assert_eq!(changes.len(), 1);
    assert!(changes[0].x > 0.0);
    assert_eq!(harness.tracker.position_of(player), Some(changes[0]));
    harness.with_physics(player, |physics| assert_eq!(physics.position(), changes[0]));
}

#[test]
fn last_move_intent_of_a_frame_wins() {
    let path = settings_file("last-writer", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    harness.send(
        player,
        ComponentMessage::MoveObject {
            direction: Vec3::X,
            should_jump: true,
        },
    );
    harness.send(
        player,
        ComponentMessage::MoveObject {
            direction: Vec3::NEG_Z,
            should_jump: false,
        },
    );

    harness.with_physics(player, |physics| {
        assert_eq!(physics.wanted_direction(), Vec3::NEG_Z);
        assert!(!physics.is_jumping());
    });

    harness.update(0.1);
    harness.with_physics(player, |physics| {
        let controller = physics.controller().expect("controller is built");
        assert_eq!(controller.walk_velocity(), Vec3::new(0.0, 0.0, -5.0));
    });
}

#[test]
fn intent_is_drained_even_without_a_world() {
    let path = settings_file("drained", SETTINGS);
    let mut harness = Harness::new(None);
    let player = harness.spawn_player(&path);

    harness.send(
        player,
        ComponentMessage::MoveObject {
            direction: Vec3::X,
            should_jump: true,
        },
    );
    harness.update(0.1);

    harness.with_physics(player, |physics| {
        assert_eq!(physics.wanted_direction(), Vec3::ZERO);
        assert!(!physics.is_jumping());
        assert!(!physics.is_bound());
    });
}

#[test]
fn binds_lazily_once_the_level_has_a_world() {
    let path = settings_file("lazy-bind", SETTINGS);
    let mut harness = Harness::new(Some(Level::without_physics("Loading")));
    let player = harness.spawn_player(&path);

    harness.update(0.1);
    assert!(harness.ghost(player).is_none());

    harness.levels.change_level(level_with_floor());
    harness.update(0.1);

    let ghost = harness.ghost(player).expect("controller built after binding");
    assert!(harness.world_contains(ghost));
    harness.with_physics(player, |physics| assert!(physics.is_bound()));
}

#[test]
fn first_load_places_player_at_configured_height() {
    let path = settings_file("spawn-height", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    assert_eq!(
        harness.tracker.position_of(player),
        Some(Vec3::new(0.0, 2.0, 0.0))
    );
    let sensitivity = harness
        .tracker
        .world()
        .get::<&charphys::entity::components::objects::PlayerInput>(player)
        .expect("player has input")
        .sensitivity();
    assert!((sensitivity - 0.002).abs() < 1.0e-7);
}

#[test]
fn npc_spawn_position_is_kept() {
    let path = settings_file("npc-spawn", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let npc = harness.spawn_npc(&path, Vec3::new(4.0, 3.0, 4.0));

    assert_eq!(
        harness.tracker.position_of(npc),
        Some(Vec3::new(4.0, 3.0, 4.0))
    );
}

#[test]
fn falling_for_three_seconds_kills_once() {
    let path = settings_file("fall-death", SETTINGS);
    let mut harness = Harness::new(Some(Level::new("Void")));
    let player = harness.spawn_player(&path);

    let mut died_on = None;
    for frame in 0..20 {
        harness.update(0.25);
        if died_on.is_none() && harness.tracker.health_of(player) == Some(0) {
            died_on = Some(frame);
        }
    }

    // The first frame is still considered standing, then twelve quarter seconds of falling.
    assert_eq!(died_on, Some(12));
    assert_eq!(harness.tracker.health_of(player), Some(0));
    harness.with_physics(player, |physics| assert_eq!(physics.airborne_time(), 0.0));
}

#[test]
fn landing_resets_airborne_time() {
    let path = settings_file("landing", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    for _ in 0..120 {
        harness.update(1.0 / 60.0);
    }

    harness.with_physics(player, |physics| {
        assert!(physics.controller().expect("controller").can_jump());
        assert_eq!(physics.airborne_time(), 0.0);
    });
    assert_eq!(harness.tracker.health_of(player), Some(100));
}

#[test]
fn network_sync_is_rate_limited() {
    let path = settings_file("network-rate", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    for _ in 0..1000 {
        harness.update(0.001);
    }

    let sent = &harness.network.messages;
    assert!(sent.len() <= 100, "{} messages", sent.len());
    assert!(!sent.is_empty());
    assert!(
        sent.iter()
            .all(|message| message.object_id == player.to_bits().get())
    );
}

#[test]
fn character_info_is_broadcast_every_frame() {
    let path = settings_file("character-info", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    harness.send(
        player,
        ComponentMessage::MoveObject {
            direction: Vec3::Z,
            should_jump: false,
        },
    );
    harness.update(0.001);

    let infos: Vec<_> = harness
        .system
        .broadcasts_for(player)
        .filter(|broadcast| matches!(broadcast, LocalBroadcast::CharacterInfo { .. }))
        .collect();
    assert_eq!(
        infos,
        vec![&LocalBroadcast::CharacterInfo {
            direction: Vec3::Z,
            is_jumping: false,
        }]
    );
}

#[test]
fn reload_with_missing_field_keeps_everything() {
    let path = settings_file("broken-reload", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    let settings_before = harness.with_physics(player, |physics| *physics.settings());
    let ghost_before = harness.ghost(player).expect("controller is built");

    std::fs::write(&path, SETTINGS.replace("\"PlayerSpeed\": 5.0,", "")).expect("writable");
    assert_eq!(harness.file_changed(&path), NotifyResponse::Stop);

    harness.with_physics(player, |physics| assert_eq!(*physics.settings(), settings_before));
    assert_eq!(harness.ghost(player), Some(ghost_before));
    assert!(harness.world_contains(ghost_before));
}

#[test]
fn reload_rebuilds_controller() {
    let path = settings_file("reload", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);
    let ghost_before = harness.ghost(player).expect("controller is built");

    std::fs::write(&path, SETTINGS.replace("\"PlayerSpeed\": 5.0", "\"PlayerSpeed\": 7.0")).expect("writable");
    assert_eq!(harness.file_changed(&path), NotifyResponse::Stop);

    let ghost_after = harness.ghost(player).expect("controller is rebuilt");
    assert_ne!(ghost_before, ghost_after);
    assert!(!harness.world_contains(ghost_before));
    assert!(harness.world_contains(ghost_after));
    harness.with_physics(player, |physics| {
        assert_eq!(physics.settings().speed, 7.0);
        assert_eq!(physics.speed(), 7.0);
    });
}

#[test]
fn unrelated_file_changes_are_ignored() {
    let path = settings_file("unrelated", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);
    let ghost = harness.ghost(player);

    let response = harness.file_changed(&PathBuf::from("some/other/file.json"));

    assert_eq!(response, NotifyResponse::Continue);
    assert_eq!(harness.ghost(player), ghost);
}

#[test]
fn first_matching_subscriber_consumes_file_change() {
    let path = settings_file("shared", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let first = harness.spawn_npc(&path, Vec3::new(0.0, 2.0, 0.0));
    let second = harness.spawn_npc(&path, Vec3::new(5.0, 2.0, 0.0));
    let first_ghost = harness.ghost(first);
    let second_ghost = harness.ghost(second);

    assert_eq!(harness.file_changed(&path), NotifyResponse::Stop);

    assert_ne!(harness.ghost(first), first_ghost);
    assert_eq!(harness.ghost(second), second_ghost);
}

#[test]
fn dying_npc_loses_its_character_physics() {
    let path = settings_file("npc-death", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let _player = harness.spawn_player(&path);
    let npc = harness.spawn_npc(&path, Vec3::new(3.0, 2.0, 0.0));
    let ghost = harness.ghost(npc).expect("controller is built");

    harness.send(npc, ComponentMessage::Died);

    assert!(!harness.world_contains(ghost));
    assert!(
        harness
            .tracker
            .world()
            .get::<&CharacterPhysics>(npc)
            .is_err()
    );
    // The entity itself stays, only the component is gone.
    assert!(harness.tracker.position_of(npc).is_some());

    // Later messages for it are dropped.
    harness.send(npc, ComponentMessage::Died);
}

#[test]
fn dying_player_keeps_its_character_physics() {
    let path = settings_file("player-death", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);
    let ghost = harness.ghost(player).expect("controller is built");

    harness.send(player, ComponentMessage::Died);

    assert_eq!(harness.ghost(player), Some(ghost));
    assert!(harness.world_contains(ghost));
}

#[test]
fn position_sync_teleports_the_ghost() {
    let path = settings_file("sync", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);
    let ghost = harness.ghost(player).expect("controller is built");

    let target = Vec3::new(10.0, 5.0, -3.0);
    harness.send(player, ComponentMessage::SyncPosition { position: target });

    harness.with_physics(player, |physics| assert_eq!(physics.position(), target));
    let translation = harness
        .levels
        .current()
        .and_then(Level::physics_world)
        .expect("world")
        .read()
        .expect("lock")
        .collider_translation(ghost);
    assert_eq!(translation, Some(target));
}

#[test]
fn intangible_characters_are_not_stepped() {
    let path = settings_file("intangible", SETTINGS);
    let mut harness = Harness::new(Some(Level::new("Void")));
    let player = harness.spawn_player(&path);

    harness.update(0.1);
    assert_eq!(harness.position_changes(player).len(), 1);

    harness
        .tracker
        .world_mut()
        .get::<&mut CharacterPhysics>(player)
        .expect("physics")
        .set_collision_flags(CollisionFlags::KINEMATIC_OBJECT | CollisionFlags::NO_CONTACT_RESPONSE)
        .expect("controller is built");
    harness.update(0.1);
    assert!(harness.position_changes(player).is_empty());

    harness
        .tracker
        .world_mut()
        .get::<&mut CharacterPhysics>(player)
        .expect("physics")
        .reset_collision_flags()
        .expect("controller is built");
    harness.with_physics(player, |physics| {
        let controller = physics.controller().expect("controller");
        assert_eq!(controller.collision_flags(), physics.default_collision_flags());
        assert_eq!(physics.default_collision_flags(), CollisionFlags::KINEMATIC_OBJECT);
    });
    harness.update(0.1);
    assert_eq!(harness.position_changes(player).len(), 1);
}

#[test]
fn ghosts_outside_the_broadphase_are_not_moved() {
    let path = settings_file("broadphase", SETTINGS);
    let mut harness = Harness::new(Some(Level::new("Void")));
    let player = harness.spawn_player(&path);
    let ghost = harness.ghost(player).expect("controller is built");

    harness
        .levels
        .current()
        .and_then(Level::physics_world)
        .expect("world")
        .write()
        .expect("lock")
        .set_collider_enabled(ghost, false);

    harness.update(0.1);
    assert!(harness.position_changes(player).is_empty());
}

#[test]
fn ghost_owner_is_registered() {
    let path = settings_file("owner", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);
    let ghost = harness.ghost(player).expect("controller is built");

    let owner = harness
        .levels
        .current()
        .and_then(Level::physics_world)
        .expect("world")
        .read()
        .expect("lock")
        .owner_of(ghost);
    assert_eq!(owner, Some(player));
}

#[test]
fn level_change_moves_characters_to_the_new_world() {
    let path = settings_file("level-change", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);
    let old_ghost = harness.ghost(player).expect("controller is built");

    let old_level = harness
        .levels
        .change_level(level_with_floor())
        .expect("there was a level");
    harness
        .system
        .rebind_all(harness.tracker.world_mut(), &harness.levels);

    let old_world = old_level.physics_world().expect("world");
    assert!(!old_world.read().expect("lock").contains_collider(old_ghost));

    let new_ghost = harness.ghost(player).expect("controller is rebuilt");
    assert!(harness.world_contains(new_ghost));
}

#[test]
fn despawning_tears_the_controller_down() {
    let path = settings_file("despawn", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let npc = harness.spawn_npc(&path, Vec3::new(0.0, 2.0, 0.0));
    let ghost = harness.ghost(npc).expect("controller is built");

    harness.tracker.destroy_object(npc);

    assert!(!harness.world_contains(ghost));
}

#[test]
fn unloaded_level_is_replaced_on_the_next_frame() {
    let path = settings_file("unload", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    drop(harness.levels.unload());
    harness.update(0.1);
    harness.with_physics(player, |physics| assert!(!physics.is_bound()));

    harness.levels.change_level(level_with_floor());
    harness.update(0.1);

    let ghost = harness.ghost(player).expect("controller rebuilt in the new level");
    assert!(harness.world_contains(ghost));
    assert_eq!(harness.position_changes(player).len(), 1);
}

#[test]
fn falling_stops_counting_once_the_world_is_gone() {
    let path = settings_file("world-gone", SETTINGS);
    let mut harness = Harness::new(Some(Level::new("Void")));
    let player = harness.spawn_player(&path);

    for _ in 0..2 {
        harness.update(0.1);
    }
    harness.with_physics(player, |physics| assert!(physics.airborne_time() > 0.0));

    drop(harness.levels.change_level(Level::without_physics("Loading")));
    for _ in 0..40 {
        harness.update(0.1);
    }

    harness.with_physics(player, |physics| {
        assert!(!physics.is_bound());
        assert!(physics.controller().is_none());
        assert_eq!(physics.airborne_time(), 0.0);
    });
    assert_eq!(harness.tracker.health_of(player), Some(100));
}

#[test]
fn despawned_characters_stop_receiving_file_changes() {
    let path = settings_file("despawn-subscribers", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    harness.spawn_player(&path);
    let npc = harness.spawn_npc(&path, Vec3::new(3.0, 2.0, 0.0));
    assert_eq!(harness.system.subscriber_count(), 2);

    harness.tracker.destroy_object(npc);
    harness.update(1.0 / 60.0);
    assert_eq!(harness.system.subscriber_count(), 1);

    let other = settings_file("despawn-subscribers-other", SETTINGS);
    let npc = harness.spawn_npc(&other, Vec3::new(-3.0, 2.0, 0.0));
    harness.tracker.destroy_object(npc);
    assert_eq!(harness.file_changed(&other), NotifyResponse::Continue);
    assert_eq!(harness.system.subscriber_count(), 1);
}

#[test]
fn grounded_character_jumps() {
    let path = settings_file("jump", SETTINGS);
    let mut harness = Harness::new(Some(level_with_floor()));
    let player = harness.spawn_player(&path);

    for _ in 0..120 {
        harness.update(1.0 / 60.0);
    }
    let standing = harness.with_physics(player, |physics| {
        assert!(physics.controller().expect("controller").can_jump());
        physics.position()
    });

    harness.send(
        player,
        ComponentMessage::MoveObject {
            direction: Vec3::ZERO,
            should_jump: true,
        },
    );
    harness.with_physics(player, |physics| assert!(physics.is_jumping()));
    harness.update(1.0 / 60.0);

    harness.with_physics(player, |physics| {
        assert!(!physics.is_jumping());
        assert!(
            physics.position().y > standing.y,
            "{} is not above {}",
            physics.position(),
            standing
        );
    });
}
