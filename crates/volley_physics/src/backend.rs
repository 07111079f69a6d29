//! Physics-engine abstraction consumed by the gameplay layer

use crate::body::{BodyDesc, BodyHandle, BodySnapshot};
use crate::error::Result;

/// Contract every simulation backend offers to the lifecycle managers.
///
/// Operations on unknown handles fail with `InvalidHandle`, except
/// `remove_body`, which tolerates double retirement.
pub trait PhysicsBackend {
    /// Whether the backend finished initialising
    fn is_initialized(&self) -> bool;

    /// Advance the whole world by `dt` seconds
    fn step(&mut self, dt: f32) -> Result<()>;

    /// Allocate a body and its collider
    fn create_body(&mut self, desc: BodyDesc) -> Result<BodyHandle>;

    /// Instantaneous velocity change; no-op on static bodies
    fn apply_impulse(&mut self, handle: BodyHandle, impulse: [f32; 3]) -> Result<()>;

    /// Release a body and its collider. Returns `false` if nothing was removed.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;

    /// Snapshot of position, orientation and velocity
    fn query(&self, handle: BodyHandle) -> Result<BodySnapshot>;

    /// Mass of a body, computed from its collider density
    fn mass(&self, handle: BodyHandle) -> Result<f32>;

    /// Whether `handle` refers to a live body
    fn contains(&self, handle: BodyHandle) -> bool;

    /// Number of live bodies
    fn body_count(&self) -> usize;
}
