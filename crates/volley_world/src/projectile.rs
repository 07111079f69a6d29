//! Projectile Lifecycle Manager
//!
//! Fires rounds under a cooldown, keeps them pointed along their velocity,
//! drops smoke behind them and retires them once their lifetime runs out.
//! Every shot also leaves a short-lived muzzle flash.

use crate::error::Result;
use crate::lifecycle;
use crate::orientation::look_rotation;
use crate::registry::{EntityDesc, EntityId, EntityKind, EntityRegistry, EntityState};
use crate::scene::{ProxyMesh, RenderScene, VisualProxy};
use crate::trail::TrailManager;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use volley_physics::{
    BodyDesc, BodyHandle, ColliderDesc, ColliderShape, PhysicsBackend, PhysicsError, PhysicsMaterial,
};

/// Projectile configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Minimum time between shots, in milliseconds
    pub cooldown_ms: u64,
    /// Distance ahead of the origin the round appears at
    pub muzzle_offset: f32,
    /// Initial speed in m/s
    pub speed: f32,
    /// Time before a round is retired, in milliseconds
    pub lifetime_ms: u64,
    /// Time between trail particles, in milliseconds
    pub trail_interval_ms: u64,
    /// Capsule collider radius
    pub collider_radius: f32,
    /// Capsule collider half height
    pub collider_half_height: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Gravity scale
    pub gravity_scale: f32,
    /// Surface material
    pub material: PhysicsMaterial,
    /// Visual cylinder radius
    pub visual_radius: f32,
    /// Visual cylinder length
    pub visual_length: f32,
    /// Round colour (0xRRGGBB)
    pub color: u32,
    /// Muzzle flash lifetime, in milliseconds
    pub flash_lifetime_ms: u64,
    /// Muzzle flash sphere radius
    pub flash_radius: f32,
    /// Muzzle flash colour (0xRRGGBB)
    pub flash_color: u32,
    /// Muzzle flash opacity
    pub flash_opacity: f32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 125,
            muzzle_offset: 0.5,
            speed: 50.0,
            lifetime_ms: 10_000,
            trail_interval_ms: 50,
            collider_radius: 0.05,
            collider_half_height: 0.15,
            linear_damping: 0.5,
            gravity_scale: 1.0,
            material: PhysicsMaterial::projectile(),
            visual_radius: 0.018,
            visual_length: 0.084,
            color: 0xff0000,
            flash_lifetime_ms: 50,
            flash_radius: 0.05,
            flash_color: 0xffff00,
            flash_opacity: 0.8,
        }
    }
}

impl ProjectileConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    pub fn trail_interval(&self) -> Duration {
        Duration::from_millis(self.trail_interval_ms)
    }

    pub fn flash_lifetime(&self) -> Duration {
        Duration::from_millis(self.flash_lifetime_ms)
    }

    /// Set initial speed
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    /// Set cooldown
    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = cooldown_ms;
        self
    }

    /// Set lifetime
    pub fn with_lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    /// Set muzzle offset
    pub fn with_muzzle_offset(mut self, offset: f32) -> Self {
        self.muzzle_offset = offset;
        self
    }

    /// Set linear damping
    pub fn with_linear_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping;
        self
    }

    /// Set gravity scale
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    fn body_desc(&self, position: Vec3) -> BodyDesc {
        BodyDesc::dynamic()
            .with_position(position.x, position.y, position.z)
            .with_damping(self.linear_damping, 0.0)
            .with_gravity_scale(self.gravity_scale)
            .with_ccd(true)
            .with_collider(
                ColliderDesc::new(ColliderShape::capsule(self.collider_half_height, self.collider_radius))
                    .with_material(self.material),
            )
    }
}

/// Per-projectile metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileState {
    /// Normalised firing direction
    pub initial_direction: Vec3,
    /// When the last trail particle was emitted; `None` until the first one
    pub last_trail_spawn_at: Option<Duration>,
}

/// Fire-rate limiter
#[derive(Debug, Clone)]
pub struct FireControl {
    last_fire_at: Option<Duration>,
    cooldown: Duration,
}

impl FireControl {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            last_fire_at: None,
            cooldown,
        }
    }

    /// Whether a shot at `now` is outside the cooldown window
    pub fn ready(&self, now: Duration) -> bool {
        self.last_fire_at
            .map_or(true, |last| now.saturating_sub(last) >= self.cooldown)
    }

    pub fn record(&mut self, now: Duration) {
        self.last_fire_at = Some(now);
    }

    pub fn last_fire_at(&self) -> Option<Duration> {
        self.last_fire_at
    }
}

/// Result of a fire request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A projectile was spawned
    Fired(EntityId),
    /// Still inside the cooldown window; nothing happened
    RateLimited,
}

impl FireOutcome {
    /// Id of the spawned projectile, if any
    pub fn fired(self) -> Option<EntityId> {
        match self {
            Self::Fired(id) => Some(id),
            Self::RateLimited => None,
        }
    }
}

/// Counters from one projectile tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileTick {
    /// Projectiles re-oriented along their velocity
    pub oriented: usize,
    /// Trail particles emitted
    pub trails_emitted: usize,
    /// Projectiles retired, expired or invalid
    pub retired: usize,
    /// Muzzle flashes retired
    pub flashes_retired: usize,
}

/// Spawns, updates and retires projectiles and muzzle flashes
pub struct ProjectileManager {
    config: ProjectileConfig,
    fire: FireControl,
}

impl ProjectileManager {
    pub fn new(config: ProjectileConfig) -> Self {
        let fire = FireControl::new(config.cooldown());
        Self { config, fire }
    }

    pub fn config(&self) -> &ProjectileConfig {
        &self.config
    }

    pub fn fire_control(&self) -> &FireControl {
        &self.fire
    }

    /// Fire a projectile from `origin` along `direction`.
    ///
    /// Inside the cooldown window this returns [`FireOutcome::RateLimited`]
    /// without touching anything. A zero direction fires along -Z.
    pub fn try_fire<B, S>(
        &mut self,
        registry: &mut EntityRegistry,
        backend: &mut B,
        scene: &mut S,
        origin: Vec3,
        direction: Vec3,
        now: Duration,
    ) -> Result<FireOutcome>
    where
        B: PhysicsBackend + ?Sized,
        S: RenderScene + ?Sized,
    {
        if !backend.is_initialized() {
            return Err(PhysicsError::NotInitialized.into());
        }

        if !self.fire.ready(now) {
            log::trace!("Fire request at {:?} rate limited", now);
            return Ok(FireOutcome::RateLimited);
        }
        self.fire.record(now);

        let direction = match direction.try_normalize() {
            Some(direction) => direction,
            None => Vec3::NEG_Z,
        };
        let spawn_at = origin + direction * self.config.muzzle_offset;
        let orientation = look_rotation(direction).unwrap_or_default();

        let body = backend.create_body(self.config.body_desc(spawn_at))?;

        let proxy = VisualProxy::new(
            ProxyMesh::Cylinder {
                radius: self.config.visual_radius,
                length: self.config.visual_length,
            },
            self.config.color,
        )
        .with_position(spawn_at)
        .with_orientation(orientation)
        .with_emissive();

        let desc = EntityDesc::new(EntityKind::Projectile, proxy, now)
            .with_body(body)
            .with_time_to_live(self.config.lifetime())
            .with_state(EntityState::Projectile(ProjectileState {
                initial_direction: direction,
                last_trail_spawn_at: None,
            }));

        let id = match registry.register(desc) {
            Ok(id) => id,
            Err(err) => {
                backend.remove_body(body);
                return Err(err.into());
            }
        };

        if let Some(entity) = registry.get(id) {
            scene.attach(&entity.proxy);
        }

        if let Err(err) = self.launch(backend, body, direction) {
            lifecycle::retire(registry, backend, scene, id);
            return Err(err);
        }

        self.spawn_flash(registry, scene, spawn_at, now)?;

        log::debug!("Fired projectile {} from {:?} along {:?}", id, spawn_at, direction);
        Ok(FireOutcome::Fired(id))
    }

    fn launch<B>(&self, backend: &mut B, body: BodyHandle, direction: Vec3) -> Result<()>
    where
        B: PhysicsBackend + ?Sized,
    {
        let mass = backend.mass(body)?;
        let impulse = direction * self.config.speed * mass;
        backend.apply_impulse(body, impulse.to_array())?;
        Ok(())
    }

    fn spawn_flash<S>(
        &self,
        registry: &mut EntityRegistry,
        scene: &mut S,
        position: Vec3,
        now: Duration,
    ) -> Result<EntityId>
    where
        S: RenderScene + ?Sized,
    {
        let proxy = VisualProxy::new(
            ProxyMesh::Sphere {
                radius: self.config.flash_radius,
            },
            self.config.flash_color,
        )
        .with_position(position)
        .with_opacity(self.config.flash_opacity);

        let id = registry.register(
            EntityDesc::new(EntityKind::MuzzleFlash, proxy, now).with_time_to_live(self.config.flash_lifetime()),
        )?;
        if let Some(entity) = registry.get(id) {
            scene.attach(&entity.proxy);
        }
        Ok(id)
    }

    /// Orient, emit trails for and expire every live projectile, then expire
    /// muzzle flashes.
    ///
    /// Projectiles whose body no longer resolves are force-retired. Only
    /// `NotInitialized` aborts the pass.
    pub fn tick<B, S>(
        &mut self,
        registry: &mut EntityRegistry,
        backend: &mut B,
        scene: &mut S,
        trails: &mut TrailManager,
        now: Duration,
    ) -> Result<ProjectileTick>
    where
        B: PhysicsBackend + ?Sized,
        S: RenderScene + ?Sized,
    {
        let mut report = ProjectileTick::default();
        let interval = self.config.trail_interval();

        for id in registry.snapshot_of_kind(EntityKind::Projectile) {
            let Some(entity) = registry.get_mut(id) else {
                continue;
            };
            let Some(body) = entity.body() else {
                continue;
            };

            let snapshot = match backend.query(body) {
                Ok(snapshot) => snapshot,
                Err(PhysicsError::InvalidHandle(handle)) => {
                    log::warn!("Projectile {} lost its body {:?}, retiring", id, handle);
                    lifecycle::retire(registry, backend, scene, id);
                    report.retired += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            // Hold the last orientation while the round is at rest
            let velocity = Vec3::from_array(snapshot.linear_velocity);
            if velocity != Vec3::ZERO {
                if let Some(orientation) = look_rotation(velocity) {
                    entity.proxy.orientation = orientation;
                    scene.set_transform(&entity.proxy, entity.proxy.position, orientation);
                    report.oriented += 1;
                }
            }

            let mut emit_trail = false;
            if let EntityState::Projectile(state) = &mut entity.state {
                emit_trail = state
                    .last_trail_spawn_at
                    .map_or(true, |last| now.saturating_sub(last) >= interval);
                if emit_trail {
                    state.last_trail_spawn_at = Some(now);
                }
            }
            let position = entity.proxy.position;
            let expired = entity.is_expired(now);

            if emit_trail && trails.spawn(registry, scene, position, now)?.is_some() {
                report.trails_emitted += 1;
            }

            if expired {
                log::trace!("Projectile {} expired", id);
                lifecycle::retire(registry, backend, scene, id);
                report.retired += 1;
            }
        }

        for id in registry.snapshot_of_kind(EntityKind::MuzzleFlash) {
            let expired = registry.get(id).is_some_and(|flash| flash.is_expired(now));
            if expired && lifecycle::retire_visual(registry, scene, id) {
                report.flashes_retired += 1;
            }
        }

        Ok(report)
    }
}
