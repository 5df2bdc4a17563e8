use anyhow::Context;
use charphys::entity::components::character_physics::CharacterPhysics;
use charphys::entity::entity_tracker::EntityTracker;
use charphys::entity::messages::{ComponentMessage, LocalBroadcast};
use charphys::entity::systems::character_physics_system::CharacterPhysicsSystem;
use charphys::game::level::{Level, LevelManager};
use charphys::networking::LoggingNetworkSink;
use charphys::settings::CliArgs;
use charphys::settings::movement_settings::LoadedSettings;
use charphys::util::file_change_bus::FileChanged;
use clap::Parser;
use glam::Vec3;
use log::{debug, info};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    log::trace!("Starting with args: {:?}", args);

    // Fail early with a proper message, the component itself would only log and keep going.
    LoadedSettings::load(&args.settings)
        .with_context(|| format!("Loading movement settings from {:?}", args.settings))?;

    let mut levels = LevelManager::new();
    levels.change_level(build_sandbox_level());

    let mut tracker = EntityTracker::new();
    let mut system = CharacterPhysicsSystem::new();
    let mut network = LoggingNetworkSink::default();

    let player = tracker.spawn_player(args.spawn.into(), 100);
    system
        .attach(
            tracker.world_mut(),
            player,
            CharacterPhysics::new(&args.settings),
            &levels,
        )
        .context("Attaching the character physics to the player")?;

    let direction: Vec3 = args.direction.into();
    for frame in 0..args.frames {
        if args.reload_after == Some(frame) {
            system.on_file_changed(
                tracker.world_mut(),
                &levels,
                &FileChanged::new(&args.settings),
            );
        }

        let message = ComponentMessage::MoveObject {
            direction,
            should_jump: args.jump_at == Some(frame),
        };
        let primary_player = tracker.player();
        system.send(tracker.world_mut(), player, message, primary_player);

        levels.step(args.delta_time);
        system.update(tracker.world_mut(), &levels, &mut network, args.delta_time);

        for broadcast in system.broadcasts_for(player) {
            if let LocalBroadcast::PositionChanged { position, .. } = broadcast {
                debug!("Frame {}: player at {}", frame, position);
            }
        }

        if tracker.health_of(player) == Some(0) {
            info!("The player fell to death on frame {}", frame);
            break;
        }
    }

    info!(
        "Player ended up at {} after sending {} movement updates",
        tracker.position_of(player).unwrap_or_default(),
        network.sent
    );

    Ok(())
}

fn build_sandbox_level() -> Level {
    let level = Level::new("Sandbox");
    if let Some(world) = level.physics_world() {
        let mut world = world.write().expect("Physics world lock poisoned");
        world.insert_static_box(Vec3::new(0.0, -0.5, 0.0), Vec3::new(100.0, 0.5, 100.0));
        // A small ledge to step onto.
        world.insert_static_box(Vec3::new(0.0, 0.1, 10.0), Vec3::new(2.0, 0.1, 2.0));
    }
    level
}
