//! Error types for the world layer

use crate::registry::{EntityId, EntityKind};
use thiserror::Error;
use volley_physics::{BodyHandle, PhysicsError};

/// Registry invariant violations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// This kind of entity must be backed by a simulation body
    #[error("{0:?} entities require a simulation body")]
    KindRequiresBody(EntityKind),

    /// This kind of entity must not own a simulation body
    #[error("{0:?} entities cannot own a simulation body")]
    KindForbidsBody(EntityKind),

    /// The body already belongs to another entity
    #[error("Body {body:?} is already registered to entity {owner}")]
    BodyAlreadyRegistered { body: BodyHandle, owner: EntityId },
}

/// World errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    /// Error from the rigid body store
    #[error(transparent)]
    Physics(#[from] PhysicsError),

    /// Error from the entity registry
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration the world cannot run with
    #[error("Invalid world config: {0}")]
    InvalidConfig(String),
}

impl WorldError {
    /// Whether the host must stop: the physics backend was never readied
    /// or the configuration was rejected at startup
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Physics(PhysicsError::NotInitialized | PhysicsError::InvalidConfig(_)) | Self::InvalidConfig(_)
        )
    }
}

/// Result type for world operations
pub type Result<T> = std::result::Result<T, WorldError>;
