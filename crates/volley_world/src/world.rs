//! Game world - the host-facing facade tying every manager together

use crate::clock::{FrameTime, SimulationClock};
use crate::config::WorldConfig;
use crate::error::Result;
use crate::lifecycle;
use crate::projectile::{FireOutcome, ProjectileManager, ProjectileTick};
use crate::registry::{EntityId, EntityKind, EntityRegistry};
use crate::scene::RenderScene;
use crate::setup;
use crate::sync;
use crate::trail::{TrailManager, TrailTick};
use glam::Vec3;
use std::time::Duration;
use volley_physics::{BodyHandle, PhysicsBackend, PhysicsError, RigidBodyStore};

/// What one tick did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Proxies updated from the store
    pub synced: usize,
    /// Entities retired because their body handle stopped resolving
    pub invalid_retired: usize,
    pub projectiles: ProjectileTick,
    pub trails: TrailTick,
}

/// Physics-backed entity world.
///
/// Owns the rigid body store, the entity registry and every lifecycle
/// manager, and reports visual changes to the host's [`RenderScene`]. A frame
/// is `step_physics` followed by `tick`, or both at once via
/// [`GameWorld::advance_frame`].
pub struct GameWorld<S: RenderScene> {
    config: WorldConfig,
    store: RigidBodyStore,
    registry: EntityRegistry,
    scene: S,
    clock: SimulationClock,
    projectiles: ProjectileManager,
    trails: TrailManager,
    player: Option<EntityId>,
}

impl<S: RenderScene> GameWorld<S> {
    /// Create an uninitialized world.
    ///
    /// The physics substep cap is raised if needed so that one clamped clock
    /// delta is always simulated in full.
    pub fn new(config: WorldConfig, scene: S) -> Self {
        let config = config.with_covering_substeps();
        let store = RigidBodyStore::new(config.physics.clone());
        let clock = SimulationClock::new(&config.clock);
        let projectiles = ProjectileManager::new(config.projectile.clone());
        let trails = TrailManager::new(config.trail.clone(), config.seed);

        Self {
            config,
            store,
            registry: EntityRegistry::new(),
            scene,
            clock,
            projectiles,
            trails,
            player: None,
        }
    }

    /// Bring up the physics store and build the initial scene.
    ///
    /// Safe to await more than once; the scene is only built the first time.
    pub async fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;
        self.store.initialize().await?;
        if self.player.is_some() {
            return Ok(());
        }

        let now = self.clock.now();
        let layout = &self.config.setup;

        setup::spawn_ground(
            &mut self.registry,
            &mut self.store,
            &mut self.scene,
            layout.ground_height,
            now,
        )?;

        let player = setup::spawn_player(
            &mut self.registry,
            &mut self.store,
            &mut self.scene,
            Vec3::from_array(layout.player_spawn),
            now,
        )?;
        self.player = Some(player);

        let cubes = layout.cube_layout(self.config.seed.wrapping_add(1));
        for position in &cubes {
            setup::spawn_dynamic_cube(&mut self.registry, &mut self.store, &mut self.scene, *position, now)?;
        }

        log::info!(
            "World ready: player {}, {} props, {} bodies",
            player,
            cubes.len(),
            self.store.body_count()
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.store.is_initialized()
    }

    /// Advance the simulation by `dt` seconds
    pub fn step_physics(&mut self, dt: f32) -> Result<()> {
        self.store.step(dt)?;
        Ok(())
    }

    /// Reconcile entities with the stepped simulation.
    ///
    /// Runs transform sync, retires entities with lost bodies, then updates
    /// projectiles and trail particles. Call it after
    /// [`GameWorld::step_physics`] with the same `dt`. Lifetimes and
    /// cooldowns are measured against `now` alone.
    pub fn tick(&mut self, now: Duration, dt: f32) -> Result<TickReport> {
        if !self.store.is_initialized() {
            return Err(PhysicsError::NotInitialized.into());
        }
        log::trace!("Tick at {:?} after a {:.4}s step", now, dt);

        let sync = sync::sync_transforms(&mut self.registry, &self.store, &mut self.scene)?;
        let mut report = TickReport {
            synced: sync.synced,
            ..Default::default()
        };

        for id in sync.invalid {
            if lifecycle::retire(&mut self.registry, &mut self.store, &mut self.scene, id) {
                report.invalid_retired += 1;
            }
        }

        report.projectiles = self.projectiles.tick(
            &mut self.registry,
            &mut self.store,
            &mut self.scene,
            &mut self.trails,
            now,
        )?;
        report.trails = self.trails.tick(&mut self.registry, &mut self.scene, now);

        Ok(report)
    }

    /// Advance the clock by a host-measured delta, step physics and tick
    pub fn advance_frame(&mut self, raw_dt: Duration) -> Result<(FrameTime, TickReport)> {
        if !self.store.is_initialized() {
            return Err(PhysicsError::NotInitialized.into());
        }

        let frame = self.clock.advance(raw_dt);
        self.step_physics(frame.dt_secs())?;
        let report = self.tick(frame.now, frame.dt_secs())?;
        Ok((frame, report))
    }

    /// Fire a projectile from `origin` along `direction`
    pub fn fire(&mut self, origin: Vec3, direction: Vec3, now: Duration) -> Result<FireOutcome> {
        self.projectiles.try_fire(
            &mut self.registry,
            &mut self.store,
            &mut self.scene,
            origin,
            direction,
            now,
        )
    }

    /// Live entities of one kind
    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.registry.count_of_kind(kind)
    }

    /// Age of a live entity at `now`
    pub fn age_of(&self, id: EntityId, now: Duration) -> Option<Duration> {
        self.registry.age_of(id, now)
    }

    /// Player entity, once the world is initialized
    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Body the external player controller drives
    pub fn player_body(&self) -> Option<BodyHandle> {
        self.player
            .and_then(|id| self.registry.get(id))
            .and_then(|entity| entity.body())
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn store(&self) -> &RigidBodyStore {
        &self.store
    }

    /// Mutable store access for the player controller
    pub fn store_mut(&mut self) -> &mut RigidBodyStore {
        &mut self.store
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingScene;

    fn world() -> GameWorld<RecordingScene> {
        let mut world = GameWorld::new(WorldConfig::default(), RecordingScene::new());
        pollster::block_on(world.initialize()).unwrap();
        world
    }

    #[test]
    fn test_initialize_builds_scene() {
        let world = world();
        assert_eq!(world.count_of_kind(EntityKind::Player), 1);
        assert_eq!(world.count_of_kind(EntityKind::StaticGeometry), 1);
        assert_eq!(world.count_of_kind(EntityKind::DynamicProp), 5);
        assert!(world.player_body().is_some());
        assert_eq!(world.scene().attached_count(), 7);
    }

    #[test]
    fn test_initialize_twice_does_not_duplicate() {
        let mut world = world();
        pollster::block_on(world.initialize()).unwrap();
        assert_eq!(world.registry().len(), 7);
        assert_eq!(world.store().body_count(), 7);
    }

    #[test]
    fn test_uninitialized_world_refuses_work() {
        let mut world = GameWorld::new(WorldConfig::default(), RecordingScene::new());

        assert!(world.tick(Duration::ZERO, 0.0).unwrap_err().is_fatal());
        assert!(world.advance_frame(Duration::from_millis(16)).unwrap_err().is_fatal());
        assert!(world
            .fire(Vec3::ZERO, Vec3::NEG_Z, Duration::ZERO)
            .unwrap_err()
            .is_fatal());
        assert!(world.step_physics(1.0 / 60.0).unwrap_err().is_fatal());
        assert_eq!(world.clock().frame(), 0);
    }

    #[test]
    fn test_advance_frame_moves_clock_and_props() {
        let mut world = world();
        let (frame, report) = world.advance_frame(Duration::from_millis(20)).unwrap();
        assert_eq!(frame.now, Duration::from_millis(20));
        // Everything with a body except the player
        assert_eq!(report.synced, 6);
    }

    #[test]
    fn test_substeps_cover_the_clamped_delta() {
        let world = GameWorld::new(WorldConfig::default(), RecordingScene::new());
        let physics = world.store().config();
        let clamp = world.clock().max_delta().as_secs_f32();
        assert!(physics.max_substeps as f32 * physics.timestep > clamp + physics.timestep * 0.5);
    }

    #[test]
    fn test_bad_trail_config_stops_startup() {
        let config = WorldConfig::default().with_trail(crate::trail::TrailConfig {
            jitter: f32::NAN,
            ..Default::default()
        });
        let mut world = GameWorld::new(config, RecordingScene::new());

        let err = pollster::block_on(world.initialize()).unwrap_err();
        assert!(matches!(err, crate::error::WorldError::InvalidConfig(_)));
        assert!(err.is_fatal());
        assert!(!world.is_initialized());
    }

    #[test]
    fn test_lost_body_is_retired_on_tick() {
        let mut world = world();
        let cube = world.registry().iter_kind(EntityKind::DynamicProp).next().unwrap().id();
        let body = world.registry().get(cube).unwrap().body().unwrap();
        world.store_mut().remove_body(body);

        let report = world.tick(Duration::ZERO, 0.0).unwrap();
        assert_eq!(report.invalid_retired, 1);
        assert!(world.registry().get(cube).is_none());
    }
}
