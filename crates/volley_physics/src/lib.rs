//! Volley Physics - Rigid Body Store on Rapier 3D
//!
//! This crate owns the authoritative simulation state for Volley: every rigid
//! body, its collider, and the pipeline that steps them.
//!
//! # Features
//!
//! - Static and dynamic rigid bodies with a single attached collider
//! - Capsule, cuboid, cylinder and ball shapes
//! - Physics materials (friction, restitution, density)
//! - Fixed-timestep stepping with a substep cap
//! - Idempotent removal and handle validation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 RigidBodyStore                   │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────┐ │
//! │  │ RigidBodySet│  │ ColliderSet │  │ Config  │ │
//! │  └─────────────┘  └─────────────┘  └─────────┘ │
//! │  ┌─────────────────────────────────────────────┐│
//! │  │           PhysicsPipeline                   ││
//! │  │  (integration, collision, solver)          ││
//! │  └─────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//!              PhysicsBackend (trait)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use volley_physics::prelude::*;
//!
//! let mut store = RigidBodyStore::new(PhysicsConfig::default());
//! pollster::block_on(store.initialize())?;
//!
//! let body = store.create_body(
//!     BodyDesc::dynamic()
//!         .with_position(0.0, 10.0, 0.0)
//!         .with_collider(ColliderDesc::new(ColliderShape::cuboid(0.5, 0.5, 0.5))),
//! )?;
//!
//! store.step(1.0 / 60.0)?;
//! let snapshot = store.query(body)?;
//! ```

pub mod backend;
pub mod body;
pub mod collider;
pub mod config;
pub mod error;
pub mod material;
pub mod store;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::backend::PhysicsBackend;
    pub use crate::body::{BodyDesc, BodyHandle, BodyKind, BodySnapshot};
    pub use crate::collider::{ColliderDesc, ColliderShape};
    pub use crate::config::PhysicsConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::material::PhysicsMaterial;
    pub use crate::store::RigidBodyStore;
}

pub use prelude::*;
