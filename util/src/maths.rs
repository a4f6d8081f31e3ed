//! Utility maths functions
//!
//! Conversions from a unit quaternion `(qw, qx, qy, qz)` into the roll,
//! pitch and yaw Euler angles (intrinsic Z-Y-X rotation order).

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the yaw (rotation about Z) of a quaternion, in the range `[-pi, pi]`.
pub fn quat_to_yaw<T>(qw: T, qx: T, qy: T, qz: T) -> T
where
    T: Float
{
    let two = T::one() + T::one();

    let sin_term = two * (qx * qy + qw * qz);
    let cos_term = qw * qw + qx * qx - qy * qy - qz * qz;

    sin_term.atan2(cos_term)
}

/// Get the pitch (rotation about Y) of a quaternion, in the range
/// `[-pi/2, pi/2]`.
///
/// At the gimbal lock singularities the `asin` argument can drift past
/// +/-1 numerically, in which case the result is clamped to +/-pi/2.
pub fn quat_to_pitch<T>(qw: T, qx: T, qy: T, qz: T) -> T
where
    T: Float
{
    let two = T::one() + T::one();
    let half_pi = T::from(std::f64::consts::FRAC_PI_2).unwrap();

    let sin_pitch = -two * (qx * qz - qw * qy);

    if sin_pitch >= T::one() {
        half_pi
    }
    else if sin_pitch <= -T::one() {
        -half_pi
    }
    else {
        sin_pitch.asin()
    }
}

/// Get the roll (rotation about X) of a quaternion, in the range
/// `[-pi, pi]`.
pub fn quat_to_roll<T>(qw: T, qx: T, qy: T, qz: T) -> T
where
    T: Float
{
    let two = T::one() + T::one();

    let sin_term = two * (qy * qz + qw * qx);
    let cos_term = qw * qw - qx * qx - qy * qy + qz * qz;

    sin_term.atan2(cos_term)
}

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const TOL: f64 = 1e-9;

    fn euler(roll: f64, pitch: f64, yaw: f64) -> (f64, f64, f64) {
        let q = UnitQuaternion::from_euler_angles(roll, pitch, yaw);
        let q = q.quaternion();
        (
            quat_to_roll(q.w, q.i, q.j, q.k),
            quat_to_pitch(q.w, q.i, q.j, q.k),
            quat_to_yaw(q.w, q.i, q.j, q.k),
        )
    }

    #[test]
    fn test_identity() {
        assert_eq!(quat_to_yaw(1.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(quat_to_pitch(1.0, 0.0, 0.0, 0.0), 0.0);
        assert_eq!(quat_to_roll(1.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_pure_yaw() {
        for &yaw in &[0.3, -1.2, FRAC_PI_2, -FRAC_PI_2, 3.0] {
            let (r, p, y) = euler(0.0, 0.0, yaw);
            assert!(r.abs() < TOL);
            assert!(p.abs() < TOL);
            assert!((y - yaw).abs() < TOL, "yaw {} != {}", y, yaw);
        }
    }

    #[test]
    fn test_facing_backwards() {
        // Half turn about Z, w == 0 so the yaw numerator is zero
        let yaw = quat_to_yaw(0.0, 0.0, 0.0, 1.0f64);
        assert!((yaw.abs() - PI).abs() < TOL);
    }

    #[test]
    fn test_matches_nalgebra() {
        let cases = [
            (0.1, 0.2, 0.3),
            (-0.5, 0.4, -2.0),
            (1.0, -FRAC_PI_4, 0.7),
            (-2.5, 0.05, 1.5),
        ];

        for &(roll, pitch, yaw) in cases.iter() {
            let expected = UnitQuaternion::from_euler_angles(roll, pitch, yaw).euler_angles();
            let (r, p, y) = euler(roll, pitch, yaw);
            assert!((r - expected.0).abs() < TOL);
            assert!((p - expected.1).abs() < TOL);
            assert!((y - expected.2).abs() < TOL);
        }
    }

    #[test]
    fn test_pitch_clamped_at_gimbal_lock() {
        // Slightly non-unit quaternion pushing the asin argument past 1
        let h = FRAC_PI_4.cos() * 1.0001;
        assert_eq!(quat_to_pitch(h, 0.0, h, 0.0), FRAC_PI_2);
        assert_eq!(quat_to_pitch(h, 0.0, -h, 0.0), -FRAC_PI_2);
    }

    #[test]
    fn test_f32() {
        let yaw = quat_to_yaw(FRAC_PI_4.cos() as f32, 0.0, 0.0, FRAC_PI_4.sin() as f32);
        assert!((yaw - FRAC_PI_2 as f32).abs() < 1e-6);
    }
}
