//! Error types for the rigid body store

use thiserror::Error;

/// Physics system errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    /// Handle was never issued, or its body has already been removed
    #[error("Invalid body handle: {0:?}")]
    InvalidHandle(crate::body::BodyHandle),

    /// The store refused to allocate another body
    #[error("Physics resources exhausted (capacity {capacity} bodies)")]
    ResourceExhausted { capacity: usize },

    /// The store was used before `initialize` completed
    #[error("Physics backend not initialized")]
    NotInitialized,

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),
}

impl PhysicsError {
    /// Whether this error only concerns a single body.
    ///
    /// Per-body failures are contained by callers; everything else is a
    /// contract violation that should stop the frame.
    pub fn is_per_body(&self) -> bool {
        matches!(self, Self::InvalidHandle(_) | Self::ResourceExhausted { .. })
    }
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
