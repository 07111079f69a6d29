//! Volley World - entity lifecycle on top of the rigid body store
//!
//! Reconciles the authoritative simulation in [`volley_physics`] with the
//! short-lived gameplay entities a shooter produces every frame.
//!
//! # Frame
//!
//! ```text
//! SimulationClock ─► RigidBodyStore::step ─► sync_transforms
//!                                                  │
//!                  RenderScene ◄─ TrailManager ◄─ ProjectileManager
//! ```
//!
//! Every entity lives in the [`EntityRegistry`]; managers take snapshots of
//! the ids they care about and retire entities through [`lifecycle`] so the
//! body, the proxy and the registry entry always go together.
//!
//! # Example
//!
//! ```ignore
//! use volley_world::prelude::*;
//!
//! let mut world = GameWorld::new(WorldConfig::default(), RecordingScene::new());
//! pollster::block_on(world.initialize())?;
//!
//! let now = world.clock().now();
//! world.fire(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z, now)?;
//! world.advance_frame(Duration::from_millis(16))?;
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod orientation;
pub mod projectile;
pub mod registry;
pub mod scene;
pub mod setup;
pub mod sync;
pub mod trail;
pub mod world;

pub mod prelude {
    //! Common imports for world functionality
    pub use crate::clock::{ClockConfig, FrameTime, SimulationClock};
    pub use crate::config::WorldConfig;
    pub use crate::error::{RegistryError, Result, WorldError};
    pub use crate::orientation::look_rotation;
    pub use crate::projectile::{FireOutcome, ProjectileConfig, ProjectileManager, ProjectileState};
    pub use crate::registry::{Entity, EntityDesc, EntityId, EntityKind, EntityRegistry, EntityState};
    pub use crate::scene::{ProxyId, ProxyMesh, RecordingScene, RenderScene, VisualProxy};
    pub use crate::setup::SceneSetupConfig;
    pub use crate::sync::{sync_transforms, SyncReport};
    pub use crate::trail::{TrailConfig, TrailManager, TrailState};
    pub use crate::world::{GameWorld, TickReport};
    pub use glam::{Quat, Vec3};
    pub use std::time::Duration;
}

pub use prelude::*;
