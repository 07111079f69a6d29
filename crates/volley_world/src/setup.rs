//! Initial scene: ground, player capsule and scattered props

use crate::error::{Result, WorldError};
use crate::registry::{EntityDesc, EntityId, EntityKind, EntityRegistry};
use crate::scene::{ProxyMesh, RenderScene, VisualProxy};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use volley_physics::{BodyDesc, ColliderDesc, ColliderShape, PhysicsBackend, PhysicsMaterial};

const PLAYER_RADIUS: f32 = 0.5;
const PLAYER_HALF_HEIGHT: f32 = 0.5;
const GROUND_HALF_EXTENT: f32 = 500.0;
const GROUND_HALF_THICKNESS: f32 = 0.1;
const CUBE_SIZE: f32 = 1.0;

/// Layout of the initial scene
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSetupConfig {
    /// Player spawn point
    pub player_spawn: [f32; 3],
    /// Height of the ground collider's centre
    pub ground_height: f32,
    /// Explicit cube positions
    pub cube_positions: Vec<[f32; 3]>,
    /// Additional cubes dropped at random over the play area
    pub scattered_cubes: usize,
    /// Half size of the square the scattered cubes land in
    pub scatter_half_extent: f32,
    /// Drop height of scattered cubes
    pub scatter_height: f32,
}

impl Default for SceneSetupConfig {
    fn default() -> Self {
        Self {
            player_spawn: [0.0, 2.0, 0.0],
            ground_height: -2.1,
            cube_positions: Vec::new(),
            scattered_cubes: 5,
            scatter_half_extent: 5.0,
            scatter_height: 5.0,
        }
    }
}

impl SceneSetupConfig {
    /// Scene with no props
    pub fn empty() -> Self {
        Self {
            scattered_cubes: 0,
            ..Default::default()
        }
    }

    /// Reject non-finite coordinates; the scatter range is drawn from them
    pub fn validate(&self) -> Result<()> {
        let scalars = [
            ("ground_height", self.ground_height),
            ("scatter_half_extent", self.scatter_half_extent),
            ("scatter_height", self.scatter_height),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(WorldError::InvalidConfig(format!("setup.{} must be finite, got {}", name, value)));
            }
        }

        let mut points = std::iter::once(&self.player_spawn).chain(&self.cube_positions);
        if let Some(bad) = points.find(|p| !p.iter().all(|v| v.is_finite())) {
            return Err(WorldError::InvalidConfig(format!("setup position {:?} is not finite", bad)));
        }
        Ok(())
    }

    /// Every cube position, explicit ones first
    pub fn cube_layout(&self, seed: u64) -> Vec<Vec3> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let spread = self.scatter_half_extent.abs();

        let scattered = (0..self.scattered_cubes).map(|_| {
            let x = if spread > 0.0 { rng.gen_range(-spread..spread) } else { 0.0 };
            let z = if spread > 0.0 { rng.gen_range(-spread..spread) } else { 0.0 };
            Vec3::new(x, self.scatter_height, z)
        });

        self.cube_positions
            .iter()
            .copied()
            .map(Vec3::from_array)
            .chain(scattered)
            .collect()
    }
}

/// Register a body-backed entity, releasing the body if registration fails
fn spawn_body_entity<B, S>(
    registry: &mut EntityRegistry,
    backend: &mut B,
    scene: &mut S,
    kind: EntityKind,
    desc: BodyDesc,
    proxy: VisualProxy,
    now: Duration,
) -> Result<EntityId>
where
    B: PhysicsBackend + ?Sized,
    S: RenderScene + ?Sized,
{
    let body = backend.create_body(desc)?;
    let id = match registry.register(EntityDesc::new(kind, proxy, now).with_body(body)) {
        Ok(id) => id,
        Err(err) => {
            backend.remove_body(body);
            return Err(err.into());
        }
    };

    if let Some(entity) = registry.get(id) {
        scene.attach(&entity.proxy);
    }
    log::debug!("Spawned {:?} {}", kind, id);
    Ok(id)
}

/// Spawn the player capsule.
///
/// Rotations are locked so the capsule never tips over. The collider sits
/// half a unit above the body origin.
pub fn spawn_player<B, S>(
    registry: &mut EntityRegistry,
    backend: &mut B,
    scene: &mut S,
    position: Vec3,
    now: Duration,
) -> Result<EntityId>
where
    B: PhysicsBackend + ?Sized,
    S: RenderScene + ?Sized,
{
    let desc = BodyDesc::dynamic()
        .with_position(position.x, position.y, position.z)
        .with_damping(0.5, 0.5)
        .with_locked_rotations()
        .with_collider(
            ColliderDesc::new(ColliderShape::capsule(PLAYER_HALF_HEIGHT, PLAYER_RADIUS))
                .with_offset(0.0, PLAYER_HALF_HEIGHT, 0.0)
                .with_material(PhysicsMaterial::character()),
        );
    let proxy = VisualProxy::new(
        ProxyMesh::Capsule {
            radius: PLAYER_RADIUS,
            half_height: PLAYER_HALF_HEIGHT,
        },
        0x00ff00,
    )
    .with_position(position);

    spawn_body_entity(registry, backend, scene, EntityKind::Player, desc, proxy, now)
}

/// Spawn the static ground slab
pub fn spawn_ground<B, S>(
    registry: &mut EntityRegistry,
    backend: &mut B,
    scene: &mut S,
    height: f32,
    now: Duration,
) -> Result<EntityId>
where
    B: PhysicsBackend + ?Sized,
    S: RenderScene + ?Sized,
{
    let desc = BodyDesc::fixed().with_position(0.0, height, 0.0).with_collider(
        ColliderDesc::new(ColliderShape::cuboid(
            GROUND_HALF_EXTENT,
            GROUND_HALF_THICKNESS,
            GROUND_HALF_EXTENT,
        ))
        .with_material(PhysicsMaterial::ground()),
    );
    let proxy = VisualProxy::new(
        ProxyMesh::Plane {
            width: GROUND_HALF_EXTENT * 2.0,
            depth: GROUND_HALF_EXTENT * 2.0,
        },
        0x808080,
    )
    .with_position(Vec3::new(0.0, height, 0.0));

    spawn_body_entity(registry, backend, scene, EntityKind::StaticGeometry, desc, proxy, now)
}

/// Spawn a unit cube that falls and tumbles
pub fn spawn_dynamic_cube<B, S>(
    registry: &mut EntityRegistry,
    backend: &mut B,
    scene: &mut S,
    position: Vec3,
    now: Duration,
) -> Result<EntityId>
where
    B: PhysicsBackend + ?Sized,
    S: RenderScene + ?Sized,
{
    let half = CUBE_SIZE / 2.0;
    let desc = BodyDesc::dynamic()
        .with_position(position.x, position.y, position.z)
        .with_collider(ColliderDesc::new(ColliderShape::cuboid(half, half, half)));
    let proxy = VisualProxy::new(ProxyMesh::Cuboid { size: [CUBE_SIZE; 3] }, 0xff0000).with_position(position);

    spawn_body_entity(registry, backend, scene, EntityKind::DynamicProp, desc, proxy, now)
}
