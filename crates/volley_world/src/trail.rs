//! Particle Trail Manager - decorative smoke with age-based decay

use crate::error::{RegistryError, WorldError};
use crate::lifecycle;
use crate::registry::{EntityDesc, EntityId, EntityKind, EntityRegistry, EntityState};
use crate::scene::{ProxyMesh, RenderScene, VisualProxy};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smoke trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    /// How long each particle lives, in milliseconds
    pub lifetime_ms: u64,
    /// Opacity at birth
    pub base_opacity: f32,
    /// Uniform scale at birth
    pub initial_scale: f32,
    /// Scale added by the end of the particle's life
    pub growth_factor: f32,
    /// Maximum positional jitter per axis, applied once at spawn
    pub jitter: f32,
    /// Sphere radius
    pub radius: f32,
    /// Colour (0xRRGGBB)
    pub color: u32,
    /// Live particle cap; spawns beyond it are dropped
    pub max_particles: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: 1000,
            base_opacity: 0.5,
            initial_scale: 1.0,
            growth_factor: 2.0,
            jitter: 0.01,
            radius: 0.03,
            color: 0x888888,
            max_particles: 2048,
        }
    }
}

impl TrailConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }

    /// Reject non-finite or negative sizes; jitter is drawn from them
    pub fn validate(&self) -> crate::error::Result<()> {
        let fields = [
            ("base_opacity", self.base_opacity),
            ("initial_scale", self.initial_scale),
            ("growth_factor", self.growth_factor),
            ("jitter", self.jitter),
            ("radius", self.radius),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(WorldError::InvalidConfig(format!("trail.{} must be finite, got {}", name, value)));
            }
        }
        if self.jitter < 0.0 || self.radius <= 0.0 {
            return Err(WorldError::InvalidConfig(format!(
                "trail jitter must be >= 0 and radius > 0, got {} and {}",
                self.jitter, self.radius
            )));
        }
        Ok(())
    }

    /// Opacity and scale of a particle of the given age.
    ///
    /// Both are pure functions of `age / lifetime`: opacity fades linearly
    /// from `base_opacity` to zero while scale grows from `initial_scale` by
    /// `growth_factor`.
    pub fn appearance(&self, age: Duration) -> (f32, f32) {
        let lifetime = self.lifetime();
        let life_ratio = if lifetime.is_zero() {
            0.0
        } else {
            (1.0 - age.as_secs_f32() / lifetime.as_secs_f32()).clamp(0.0, 1.0)
        };

        let opacity = life_ratio * self.base_opacity;
        let scale = self.initial_scale + (1.0 - life_ratio) * self.growth_factor;
        (opacity, scale)
    }
}

/// Per-particle metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TrailState {
    pub lifetime: Duration,
    pub initial_scale: f32,
}

/// Counters from one trail tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrailTick {
    pub updated: usize,
    pub retired: usize,
}

/// Spawns and decays trail particles
pub struct TrailManager {
    config: TrailConfig,
    rng: ChaCha8Rng,
}

impl TrailManager {
    /// Create a manager whose jitter is drawn from a seeded generator
    pub fn new(config: TrailConfig, seed: u64) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &TrailConfig {
        &self.config
    }

    /// Spawn a particle near `position`.
    ///
    /// Returns `Ok(None)` when the particle cap is reached.
    pub fn spawn<S>(
        &mut self,
        registry: &mut EntityRegistry,
        scene: &mut S,
        position: Vec3,
        now: Duration,
    ) -> Result<Option<EntityId>, RegistryError>
    where
        S: RenderScene + ?Sized,
    {
        if registry.count_of_kind(EntityKind::TrailParticle) >= self.config.max_particles {
            log::debug!("Trail particle cap ({}) reached, dropping spawn", self.config.max_particles);
            return Ok(None);
        }

        let position = position + self.jitter();
        let mut proxy = VisualProxy::new(ProxyMesh::Sphere { radius: self.config.radius }, self.config.color)
            .with_position(position)
            .with_opacity(self.config.base_opacity);
        proxy.scale = self.config.initial_scale;

        let lifetime = self.config.lifetime();
        let id = registry.register(
            EntityDesc::new(EntityKind::TrailParticle, proxy, now)
                .with_time_to_live(lifetime)
                .with_state(EntityState::Trail(TrailState {
                    lifetime,
                    initial_scale: self.config.initial_scale,
                })),
        )?;

        if let Some(entity) = registry.get(id) {
            scene.attach(&entity.proxy);
        }
        Ok(Some(id))
    }

    /// Fade and grow every particle; retire the ones past their lifetime
    pub fn tick<S>(&mut self, registry: &mut EntityRegistry, scene: &mut S, now: Duration) -> TrailTick
    where
        S: RenderScene + ?Sized,
    {
        let mut report = TrailTick::default();

        for id in registry.snapshot_of_kind(EntityKind::TrailParticle) {
            let Some(entity) = registry.get_mut(id) else {
                continue;
            };

            if entity.is_expired(now) {
                lifecycle::retire_visual(registry, scene, id);
                report.retired += 1;
                continue;
            }

            let (opacity, scale) = self.config.appearance(entity.age(now));
            entity.proxy.opacity = opacity;
            entity.proxy.scale = scale;
            scene.set_appearance(&entity.proxy, scale, opacity);
            report.updated += 1;
        }

        report
    }

    fn jitter(&mut self) -> Vec3 {
        let j = self.config.jitter;
        if j <= 0.0 {
            return Vec3::ZERO;
        }
        Vec3::new(
            self.rng.gen_range(-j..=j),
            self.rng.gen_range(-j..=j),
            self.rng.gen_range(-j..=j),
        )
    }
}
