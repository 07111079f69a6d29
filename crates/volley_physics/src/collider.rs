//! Collider shapes and descriptions

use crate::material::PhysicsMaterial;
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Collision shape type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Capsule aligned along Y axis
    Capsule { half_height: f32, radius: f32 },
    /// Box with half-extents
    Cuboid { half_extents: [f32; 3] },
    /// Cylinder aligned along Y axis
    Cylinder { half_height: f32, radius: f32 },
    /// Sphere with radius
    Ball { radius: f32 },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Cuboid {
            half_extents: [0.5, 0.5, 0.5],
        }
    }
}

impl ColliderShape {
    /// Create a capsule shape (Y-aligned)
    pub fn capsule(half_height: f32, radius: f32) -> Self {
        Self::Capsule { half_height, radius }
    }

    /// Create a box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Cuboid {
            half_extents: [hx, hy, hz],
        }
    }

    /// Create a cylinder shape (Y-aligned)
    pub fn cylinder(half_height: f32, radius: f32) -> Self {
        Self::Cylinder { half_height, radius }
    }

    /// Create a sphere shape
    pub fn ball(radius: f32) -> Self {
        Self::Ball { radius }
    }

    pub(crate) fn to_rapier(self) -> rapier::SharedShape {
        match self {
            Self::Capsule { half_height, radius } => rapier::SharedShape::capsule_y(half_height, radius),
            Self::Cuboid { half_extents: [hx, hy, hz] } => rapier::SharedShape::cuboid(hx, hy, hz),
            Self::Cylinder { half_height, radius } => rapier::SharedShape::cylinder(half_height, radius),
            Self::Ball { radius } => rapier::SharedShape::ball(radius),
        }
    }
}

/// Description of the collider attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderDesc {
    /// Collision shape
    pub shape: ColliderShape,
    /// Position offset from the parent body
    pub offset: [f32; 3],
    /// Physics material
    pub material: PhysicsMaterial,
}

impl Default for ColliderDesc {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            offset: [0.0, 0.0, 0.0],
            material: PhysicsMaterial::default(),
        }
    }
}

impl ColliderDesc {
    /// Create a new collider description with a shape
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            ..Default::default()
        }
    }

    /// Set position offset
    pub fn with_offset(mut self, x: f32, y: f32, z: f32) -> Self {
        self.offset = [x, y, z];
        self
    }

    /// Set material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    pub(crate) fn to_rapier_builder(&self) -> rapier::ColliderBuilder {
        rapier::ColliderBuilder::new(self.shape.to_rapier())
            .translation(rapier::Vector::new(self.offset[0], self.offset[1], self.offset[2]))
            .friction(self.material.friction)
            .restitution(self.material.restitution)
            .density(self.material.density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::PhysicsBackend;
    use crate::body::BodyDesc;
    use crate::store::RigidBodyStore;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn mass_of(collider: ColliderDesc) -> f32 {
        let mut store = RigidBodyStore::default();
        pollster::block_on(store.initialize()).unwrap();
        let body = store.create_body(BodyDesc::dynamic().with_collider(collider)).unwrap();
        store.mass(body).unwrap()
    }

    #[test]
    fn test_mass_follows_shape_volume() {
        let ball = mass_of(ColliderDesc::new(ColliderShape::ball(0.5)));
        assert_relative_eq!(ball, 4.0 / 3.0 * PI * 0.125, max_relative = 1e-3);

        let cylinder = mass_of(ColliderDesc::new(ColliderShape::cylinder(0.5, 0.5)));
        assert_relative_eq!(cylinder, PI * 0.25, max_relative = 1e-3);

        // Two hemispheres plus the shaft
        let capsule = mass_of(ColliderDesc::new(ColliderShape::capsule(0.15, 0.05)));
        let expected = PI * 0.05f32.powi(2) * 0.3 + 4.0 / 3.0 * PI * 0.05f32.powi(3);
        assert_relative_eq!(capsule, expected, max_relative = 1e-3);
    }

    #[test]
    fn test_density_scales_mass() {
        let heavy = ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5))
            .with_material(PhysicsMaterial::default().with_density(3.0));
        assert_relative_eq!(mass_of(heavy), 3.0, max_relative = 1e-4);
    }

    #[test]
    fn test_offset_keeps_body_origin() {
        let mut store = RigidBodyStore::default();
        pollster::block_on(store.initialize()).unwrap();
        let body = store
            .create_body(
                BodyDesc::dynamic()
                    .with_position(1.0, 2.0, 3.0)
                    .with_collider(ColliderDesc::new(ColliderShape::capsule(0.5, 0.5)).with_offset(0.0, 0.5, 0.0)),
            )
            .unwrap();
        assert_eq!(store.query(body).unwrap().position, [1.0, 2.0, 3.0]);
    }
}
