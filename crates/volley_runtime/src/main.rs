//! Volley Runtime
//!
//! Headless host for a Volley world. It loads configuration, brings the
//! physics store up, then drives a fixed number of frames while firing on a
//! simple script, logging entity counts once per simulated second.
//!
//! Run with: cargo run -p volley_runtime
//!       or: RUST_LOG=debug VOLLEY_FRAMES=120 cargo run --bin volley

mod headless;
mod runtime_config;

use glam::Vec3;
use headless::HeadlessScene;
use runtime_config::RuntimeConfig;
use std::time::Duration;
use volley_physics::PhysicsBackend;
use volley_world::{EntityKind, FireOutcome, GameWorld, WorldError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("PANIC: {}", panic_info);
    }));

    let config = match RuntimeConfig::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Failed to load runtime config: {}", err);
            std::process::exit(2);
        }
    };
    config.print_summary();

    if let Err(err) = run(&config) {
        log::error!("Runtime stopped: {}", err);
        std::process::exit(1);
    }
}

fn run(config: &RuntimeConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut world = GameWorld::new(config.world.clone(), HeadlessScene::new());
    pollster::block_on(world.initialize())?;

    let frame_dt = config.frame_duration();
    let aim = Vec3::from_array(config.aim);
    let mut next_report = Duration::from_secs(1);
    let mut shots = 0u64;

    for frame in 1..=config.frames {
        if config.fire_every_frames > 0 && frame % config.fire_every_frames == 0 {
            let origin = muzzle_origin(&world, config.eye_height);
            let now = world.clock().now();
            match world.fire(origin, aim, now) {
                Ok(FireOutcome::Fired(_)) => shots += 1,
                Ok(FireOutcome::RateLimited) => {}
                // A full store only costs this shot
                Err(WorldError::Physics(err)) if err.is_per_body() => {
                    log::warn!("Shot dropped on frame {}: {}", frame, err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        let (time, report) = world.advance_frame(frame_dt)?;
        if report.invalid_retired > 0 {
            log::warn!("Frame {}: retired {} entities with lost bodies", frame, report.invalid_retired);
        }

        if time.now >= next_report {
            log_counts(&world, time.now);
            next_report += Duration::from_secs(1);
        }
    }

    let stats = world.scene().stats();
    log::info!(
        "Done after {} frames: {} shots, {} proxies attached, {} detached, {} live",
        config.frames,
        shots,
        stats.attached,
        stats.detached,
        stats.live()
    );
    Ok(())
}

/// Where the player's shots leave from: eye height above the player body
fn muzzle_origin(world: &GameWorld<HeadlessScene>, eye_height: f32) -> Vec3 {
    world
        .player_body()
        .and_then(|body| world.store().query(body).ok())
        .map(|snapshot| Vec3::from_array(snapshot.position) + Vec3::Y * eye_height)
        .unwrap_or(Vec3::Y * eye_height)
}

fn log_counts(world: &GameWorld<HeadlessScene>, now: Duration) {
    log::info!(
        "t={:.1}s projectiles={} trails={} flashes={} bodies={}",
        now.as_secs_f32(),
        world.count_of_kind(EntityKind::Projectile),
        world.count_of_kind(EntityKind::TrailParticle),
        world.count_of_kind(EntityKind::MuzzleFlash),
        world.store().body_count()
    );
}
