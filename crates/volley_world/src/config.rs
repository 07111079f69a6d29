//! World configuration

use crate::clock::ClockConfig;
use crate::error::Result;
use crate::projectile::ProjectileConfig;
use crate::setup::SceneSetupConfig;
use crate::trail::TrailConfig;
use serde::{Deserialize, Serialize};
use volley_physics::PhysicsConfig;

/// Everything a [`GameWorld`](crate::world::GameWorld) is built from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub physics: PhysicsConfig,
    pub projectile: ProjectileConfig,
    pub trail: TrailConfig,
    pub clock: ClockConfig,
    pub setup: SceneSetupConfig,
    /// Seed for trail jitter and prop scattering
    pub seed: u64,
}

impl WorldConfig {
    /// Set physics config
    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Set projectile config
    pub fn with_projectile(mut self, projectile: ProjectileConfig) -> Self {
        self.projectile = projectile;
        self
    }

    /// Set trail config
    pub fn with_trail(mut self, trail: TrailConfig) -> Self {
        self.trail = trail;
        self
    }

    /// Set scene layout
    pub fn with_setup(mut self, setup: SceneSetupConfig) -> Self {
        self.setup = setup;
        self
    }

    /// Set RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Substeps needed to simulate one clamped frame plus the sub-timestep
    /// remainder a previous frame can leave in the accumulator
    pub fn required_substeps(&self) -> u32 {
        let timestep = self.physics.timestep;
        if !(timestep.is_finite() && timestep > 0.0) {
            return self.physics.max_substeps;
        }
        let per_frame = (self.clock.max_delta().as_secs_f32() / timestep).ceil();
        (per_frame as u32).saturating_add(1)
    }

    /// Raise the physics substep cap so the store never discards time the
    /// clock has already handed out
    pub fn with_covering_substeps(mut self) -> Self {
        let required = self.required_substeps();
        if self.physics.max_substeps < required {
            log::debug!(
                "Raising max_substeps from {} to {} to cover a {}ms frame",
                self.physics.max_substeps,
                required,
                self.clock.max_delta_ms
            );
            self.physics.max_substeps = required;
        }
        self
    }

    /// Check every section for values the world cannot run with
    pub fn validate(&self) -> Result<()> {
        self.physics.validate()?;
        self.trail.validate()?;
        self.setup.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorldError;

    #[test]
    fn test_default_needs_seven_substeps() {
        let config = WorldConfig::default();
        assert!(config.required_substeps() >= 7);
        assert!(config.physics.max_substeps < config.required_substeps());

        let covered = config.with_covering_substeps();
        assert_eq!(covered.physics.max_substeps, covered.required_substeps());
    }

    #[test]
    fn test_larger_cap_is_kept() {
        let mut config = WorldConfig::default();
        config.physics.max_substeps = 32;
        config.clock = ClockConfig { max_delta_ms: 20 };
        assert_eq!(config.with_covering_substeps().physics.max_substeps, 32);
    }

    #[test]
    fn test_validate_reports_each_section() {
        assert!(WorldConfig::default().validate().is_ok());

        let mut config = WorldConfig::default();
        config.physics.timestep = 0.0;
        assert!(matches!(config.validate(), Err(WorldError::Physics(_))));

        let mut config = WorldConfig::default();
        config.setup.scatter_half_extent = f32::INFINITY;
        assert!(matches!(config.validate(), Err(WorldError::InvalidConfig(_))));
    }
}
