//! Rigid body handles and descriptions

use crate::collider::ColliderDesc;
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Handle to a rigid body in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub(crate) rapier::RigidBodyHandle);

/// Type of rigid body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BodyKind {
    /// Never moves, infinite mass
    Static,
    /// Fully simulated
    #[default]
    Dynamic,
}

impl From<BodyKind> for rapier::RigidBodyType {
    fn from(kind: BodyKind) -> Self {
        match kind {
            BodyKind::Static => rapier::RigidBodyType::Fixed,
            BodyKind::Dynamic => rapier::RigidBodyType::Dynamic,
        }
    }
}

/// Description for creating a rigid body together with its collider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDesc {
    /// Type of rigid body
    pub kind: BodyKind,
    /// Initial position
    pub position: [f32; 3],
    /// Initial rotation (quaternion: x, y, z, w)
    pub rotation: [f32; 4],
    /// Linear damping (air resistance)
    pub linear_damping: f32,
    /// Angular damping (rotational resistance)
    pub angular_damping: f32,
    /// Gravity scale (0 = no gravity, 1 = normal)
    pub gravity_scale: f32,
    /// Prevent the body from tipping over
    pub lock_rotations: bool,
    /// Enable continuous collision detection
    pub ccd: bool,
    /// Attached collider
    pub collider: ColliderDesc,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            position: [0.0, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 1.0],
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            lock_rotations: false,
            ccd: false,
            collider: ColliderDesc::default(),
        }
    }
}

impl BodyDesc {
    /// Create a static body description
    pub fn fixed() -> Self {
        Self {
            kind: BodyKind::Static,
            ..Default::default()
        }
    }

    /// Create a dynamic body description
    pub fn dynamic() -> Self {
        Self {
            kind: BodyKind::Dynamic,
            ..Default::default()
        }
    }

    /// Set position
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = [x, y, z];
        self
    }

    /// Set rotation (quaternion: x, y, z, w)
    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    /// Set linear and angular damping
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    /// Set gravity scale
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    /// Lock all rotation axes
    pub fn with_locked_rotations(mut self) -> Self {
        self.lock_rotations = true;
        self
    }

    /// Enable CCD
    pub fn with_ccd(mut self, enabled: bool) -> Self {
        self.ccd = enabled;
        self
    }

    /// Set the attached collider
    pub fn with_collider(mut self, collider: ColliderDesc) -> Self {
        self.collider = collider;
        self
    }

    pub(crate) fn to_rapier_builder(&self, ccd_allowed: bool) -> rapier::RigidBodyBuilder {
        let [x, y, z, w] = self.rotation;
        let rotation = UnitQuaternion::from_quaternion(Quaternion::new(w, x, y, z));
        let position = rapier::Isometry::from_parts(
            rapier::Translation::new(self.position[0], self.position[1], self.position[2]),
            rotation,
        );

        let mut builder = rapier::RigidBodyBuilder::new(self.kind.into())
            .position(position)
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .gravity_scale(self.gravity_scale)
            .ccd_enabled(self.ccd && ccd_allowed);

        if self.lock_rotations {
            builder = builder.locked_axes(rapier::LockedAxes::ROTATION_LOCKED);
        }

        builder
    }
}

/// Read-only view of a body's state after the last step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySnapshot {
    /// World-space position
    pub position: [f32; 3],
    /// Orientation (quaternion: x, y, z, w)
    pub orientation: [f32; 4],
    /// Linear velocity
    pub linear_velocity: [f32; 3],
}

impl BodySnapshot {
    pub(crate) fn from_rapier(body: &rapier::RigidBody) -> Self {
        let pos = body.translation();
        let rot = body.rotation();
        let vel = body.linvel();
        Self {
            position: [pos.x, pos.y, pos.z],
            orientation: [rot.i, rot.j, rot.k, rot.w],
            linear_velocity: [vel.x, vel.y, vel.z],
        }
    }
}
