//! Math type aliases and spherical-coordinate helpers.
//!
//! Linear algebra is provided by `nalgebra`; this module only names the
//! f32 types used by geometry generation.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// Angle around the Y axis, counter-clockwise when looking from above.
///
/// Returns a value in `[-π, π]`, measured from the -X axis towards +Z.
pub fn azimuth(v: &Vec3) -> f32 {
    v.z.atan2(-v.x)
}

/// Angle above the XZ plane, with +Y mapping to `-π/2`.
pub fn inclination(v: &Vec3) -> f32 {
    (-v.y).atan2((v.x * v.x + v.z * v.z).sqrt())
}

/// Normalize `v` and scale it to `length`.
///
/// Zero-length vectors are returned unchanged, since they have no direction.
/// The vector is divided by its largest component first, so tiny vectors
/// whose squared norm underflows still keep their direction.
pub fn with_length(v: &Vec3, length: f32) -> Vec3 {
    let largest = v.amax();
    if largest == 0.0 {
        return *v;
    }
    (v / largest).normalize() * length
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_azimuth_axes() {
        assert_eq!(azimuth(&Vec3::new(-1.0, 0.0, 0.0)), 0.0);
        assert_eq!(azimuth(&Vec3::new(1.0, 0.0, 0.0)), PI);
        assert!((azimuth(&Vec3::new(0.0, 0.0, 1.0)) - FRAC_PI_2).abs() < 1e-6);
        assert!((azimuth(&Vec3::new(0.0, 0.0, -1.0)) + FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_inclination_poles() {
        assert!((inclination(&Vec3::new(0.0, 1.0, 0.0)) + FRAC_PI_2).abs() < 1e-6);
        assert!((inclination(&Vec3::new(0.0, -1.0, 0.0)) - FRAC_PI_2).abs() < 1e-6);
        assert_eq!(inclination(&Vec3::new(1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_with_length() {
        let v = with_length(&Vec3::new(3.0, 0.0, 4.0), 10.0);
        assert!((v.norm() - 10.0).abs() < 1e-5);
        assert!((v.x - 6.0).abs() < 1e-5);

        let zero = with_length(&Vec3::zeros(), 2.0);
        assert_eq!(zero, Vec3::zeros());
    }

    #[test]
    fn test_with_length_tiny_vector() {
        let v = with_length(&Vec3::new(1e-25, 0.0, -1e-25), 2.0);
        assert!((v.norm() - 2.0).abs() < 1e-5);
        assert!(v.x > 0.0 && v.z < 0.0);

        let subnormal = with_length(&Vec3::new(0.0, f32::MIN_POSITIVE / 4.0, 0.0), 1.0);
        assert!((subnormal.y - 1.0).abs() < 1e-6);
    }
}
