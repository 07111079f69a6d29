//! Physics materials defining surface properties

use serde::{Deserialize, Serialize};

/// Physics material defining friction, restitution and density
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterial {
    /// Friction coefficient (0 = frictionless, 1 = high friction)
    pub friction: f32,
    /// Restitution/bounciness (0 = no bounce, 1 = perfect bounce)
    pub restitution: f32,
    /// Density for mass calculation (kg/m³)
    pub density: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
            density: 1.0,
        }
    }
}

impl PhysicsMaterial {
    /// Create a new physics material
    pub fn new(friction: f32, restitution: f32, density: f32) -> Self {
        Self {
            friction,
            restitution,
            density,
        }
    }

    /// Low-friction, non-bouncy material used for character capsules
    pub fn character() -> Self {
        Self::new(0.1, 0.0, 1.0)
    }

    /// Slick and slightly bouncy, for small fast rounds
    pub fn projectile() -> Self {
        Self::new(0.1, 0.5, 1.0)
    }

    /// Ground surface
    pub fn ground() -> Self {
        Self::new(0.5, 0.0, 1.0)
    }

    /// Set friction
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// Set restitution
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Set density
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(PhysicsMaterial::character().friction, 0.1);
        assert_eq!(PhysicsMaterial::character().restitution, 0.0);
        assert_eq!(PhysicsMaterial::projectile().restitution, 0.5);
        assert_eq!(PhysicsMaterial::ground().friction, 0.5);
    }

    #[test]
    fn test_builders_override_one_field() {
        let material = PhysicsMaterial::ground().with_restitution(0.25).with_friction(0.9);
        assert_eq!(material, PhysicsMaterial::new(0.9, 0.25, 1.0));
    }
}
