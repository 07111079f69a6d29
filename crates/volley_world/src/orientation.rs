//! Look-direction rotations for elongated proxies

use glam::{Mat3, Quat, Vec3};

/// Rotation that points a Y-aligned mesh (cylinder, capsule) along `direction`.
///
/// Builds a look-at basis with world up +Y (local -Z towards the target),
/// then turns a quarter around local X so the mesh's long axis follows.
/// Falls back to +Z as up when `direction` is vertical. Returns `None` for a
/// zero or non-finite direction.
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let forward = direction.normalize_or_zero();
    if forward == Vec3::ZERO || !forward.is_finite() {
        return None;
    }

    let z_axis = -forward;
    let mut x_axis = Vec3::Y.cross(z_axis);
    if x_axis.length_squared() < 1e-8 {
        x_axis = Vec3::Z.cross(z_axis);
    }
    let x_axis = x_axis.normalize();
    let y_axis = z_axis.cross(x_axis);

    let look = Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, z_axis));
    Some((look * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn long_axis(rotation: Quat) -> Vec3 {
        rotation * Vec3::Y
    }

    #[test]
    fn test_long_axis_follows_direction() {
        for direction in [
            Vec3::NEG_Z,
            Vec3::X,
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-0.3, -0.2, 0.9),
        ] {
            let rotation = look_rotation(direction).unwrap();
            let alignment = long_axis(rotation).dot(direction.normalize());
            assert_abs_diff_eq!(alignment.abs(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_vertical_direction_uses_fallback_up() {
        let rotation = look_rotation(Vec3::Y).unwrap();
        assert!(rotation.is_finite());
        assert_abs_diff_eq!(long_axis(rotation).dot(Vec3::Y).abs(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_direction_has_no_rotation() {
        assert_eq!(look_rotation(Vec3::ZERO), None);
    }
}
