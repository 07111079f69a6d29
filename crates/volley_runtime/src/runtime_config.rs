//! Runtime Configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment variables: `VOLLEY_FRAMES`, `VOLLEY_FRAME_MS`, `VOLLEY_SEED`
//! 2. Config file: `VOLLEY_CONFIG`, else the first of `volley.toml` and
//!    `config/volley.toml` that exists
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! frames = 600
//! frame_ms = 16
//! fire_every_frames = 10
//! aim = [0.0, 0.05, -1.0]
//!
//! [world]
//! seed = 7
//!
//! [world.projectile]
//! speed = 40.0
//! cooldown_ms = 100
//!
//! [world.physics]
//! gravity = [0.0, -9.81, 0.0]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use volley_world::WorldConfig;

const SEARCH_PATHS: &[&str] = &["volley.toml", "config/volley.toml"];

/// Host configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// World tunables
    pub world: WorldConfig,
    /// Frames to simulate before exiting
    pub frames: u64,
    /// Simulated host frame length, in milliseconds
    pub frame_ms: u64,
    /// Fire once every this many frames; 0 never fires
    pub fire_every_frames: u64,
    /// Firing direction
    pub aim: [f32; 3],
    /// Height above the player's feet shots leave from
    pub eye_height: f32,

    /// Where the config was loaded from
    #[serde(skip)]
    pub config_path: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            frames: 600,
            frame_ms: 16,
            fire_every_frames: 10,
            aim: [0.0, 0.05, -1.0],
            eye_height: 1.5,
            config_path: None,
        }
    }
}

impl RuntimeConfig {
    /// Load from file, then apply environment overrides
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match std::env::var("VOLLEY_CONFIG") {
            Ok(path) => {
                let mut config = Self::load_from_file(Path::new(&path))?;
                config.config_path = Some(path);
                config
            }
            Err(_) => Self::search()?,
        };

        if let Some(path) = &config.config_path {
            log::info!("Loaded runtime config from {}", path);
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn search() -> Result<Self, Box<dyn std::error::Error>> {
        for path in SEARCH_PATHS {
            if Path::new(path).is_file() {
                let mut config = Self::load_from_file(Path::new(path))?;
                config.config_path = Some(path.to_string());
                return Ok(config);
            }
        }
        Ok(Self::default())
    }

    /// Parse a TOML file; missing keys keep their defaults
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `VOLLEY_*` overrides from a variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(frames) = parse_var(&lookup, "VOLLEY_FRAMES") {
            self.frames = frames;
        }
        if let Some(frame_ms) = parse_var(&lookup, "VOLLEY_FRAME_MS") {
            self.frame_ms = frame_ms;
        }
        if let Some(seed) = parse_var(&lookup, "VOLLEY_SEED") {
            self.world.seed = seed;
            log::info!("Seed from env: {}", seed);
        }
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn print_summary(&self) {
        log::info!("Runtime Configuration:");
        log::info!("  Frames: {} x {} ms", self.frames, self.frame_ms);
        log::info!("  Fire every {} frames along {:?}", self.fire_every_frames, self.aim);
        log::info!("  Seed: {}", self.world.seed);
        if let Some(path) = &self.config_path {
            log::info!("  Config: {}", path);
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a number", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.frames, 600);
        assert_eq!(config.frame_duration(), Duration::from_millis(16));
        assert_eq!(config.world.projectile.cooldown_ms, 125);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            frames = 30

            [world.projectile]
            speed = 12.5

            [world.trail]
            lifetime_ms = 400
            "#,
        )
        .unwrap();

        assert_eq!(config.frames, 30);
        assert_eq!(config.frame_ms, 16);
        assert_eq!(config.world.projectile.speed, 12.5);
        assert_eq!(config.world.projectile.lifetime_ms, 10_000);
        assert_eq!(config.world.trail.lifetime_ms, 400);
        assert_eq!(config.world.physics.max_substeps, 4);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("VOLLEY_FRAMES", "12"),
            ("VOLLEY_SEED", " 99 "),
            ("VOLLEY_FRAME_MS", "fast"),
        ]
        .into_iter()
        .collect();

        let mut config = RuntimeConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.frames, 12);
        assert_eq!(config.world.seed, 99);
        assert_eq!(config.frame_ms, 16);
    }
}
