//! Quaternion algebra on `glam::DQuat`.
//!
//! Convention: scalar-first `(w, x, y, z)` when written out, an orientation
//! quaternion maps body-frame vectors into the world frame, and incremental
//! rotations are composed on the right (`product(current, delta)`), i.e. in
//! the body frame.

use glam::{DQuat, DVec3};
use std::f64::consts::FRAC_PI_2;

/// Hamilton product `q1 ⊗ q2`.
///
/// Valid for the pure (non-unit) quaternions used by [`rotate_vector`].
pub fn product(q1: DQuat, q2: DQuat) -> DQuat {
    DQuat::from_xyzw(
        q1.w * q2.x + q1.x * q2.w + q1.y * q2.z - q1.z * q2.y,
        q1.w * q2.y - q1.x * q2.z + q1.y * q2.w + q1.z * q2.x,
        q1.w * q2.z + q1.x * q2.y - q1.y * q2.x + q1.z * q2.w,
        q1.w * q2.w - q1.x * q2.x - q1.y * q2.y - q1.z * q2.z,
    )
}

/// Conjugate; the inverse rotation for unit quaternions.
pub fn conjugate(q: DQuat) -> DQuat {
    DQuat::from_xyzw(-q.x, -q.y, -q.z, q.w)
}

/// Rotation of `theta` radians about `axis`, which must already be unit length.
pub fn axis_angle_to_quaternion(axis: DVec3, theta: f64) -> DQuat {
    let (sin, cos) = (theta * 0.5).sin_cos();
    DQuat::from_xyzw(axis.x * sin, axis.y * sin, axis.z * sin, cos)
}

/// `q ⊗ (0, v) ⊗ q*`, vector part.
///
/// With an orientation `q` this takes a body-frame vector into the world
/// frame; pass `conjugate(q)` to go the other way.
pub fn rotate_vector(v: DVec3, q: DQuat) -> DVec3 {
    let pure = DQuat::from_xyzw(v.x, v.y, v.z, 0.0);
    let rotated = product(product(q, pure), conjugate(q));
    DVec3::new(rotated.x, rotated.y, rotated.z)
}

/// Scale to unit norm. Zero or non-finite input is returned unchanged.
pub fn renormalize(q: DQuat) -> DQuat {
    let norm = q.length();
    if norm > 0.0 && norm.is_finite() {
        q * norm.recip()
    } else {
        q
    }
}

/// (roll, pitch, yaw) in radians, ZYX sequence.
///
/// Pitch saturates at ±π/2 when the asin argument leaves [-1, 1].
pub fn to_euler(q: DQuat) -> (f64, f64, f64) {
    let (w, x, y, z) = (q.w, q.x, q.y, q.z);

    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));

    let sinp = 2.0 * (w * y - z * x);
    let pitch = if sinp.abs() >= 1.0 {
        FRAC_PI_2.copysign(sinp)
    } else {
        sinp.asin()
    };

    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

    (roll, pitch, yaw)
}

/// Inverse of [`to_euler`].
pub fn euler_to_quaternion(yaw: f64, pitch: f64, roll: f64) -> DQuat {
    let (sy, cy) = (yaw * 0.5).sin_cos();
    let (sp, cp) = (pitch * 0.5).sin_cos();
    let (sr, cr) = (roll * 0.5).sin_cos();

    DQuat::from_xyzw(
        cy * cp * sr - sy * sp * cr,
        sy * cp * sr + cy * sp * cr,
        sy * cp * cr - cy * sp * sr,
        cy * cp * cr + sy * sp * sr,
    )
}
