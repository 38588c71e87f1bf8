//! Vector helpers shared by the correction stages.

use glam::DVec3;

/// Scale `v` to unit length. A zero vector stays zero instead of becoming NaN.
pub fn normalize(v: DVec3) -> DVec3 {
    let magnitude = v.length();
    if magnitude == 0.0 {
        DVec3::ZERO
    } else {
        v / magnitude
    }
}

/// Angle between two vectors in radians.
///
/// Returns `None` when either vector has zero length or the result is not
/// finite, so callers can skip a correction instead of propagating NaN.
pub fn angle_between(u: DVec3, v: DVec3) -> Option<f64> {
    let denominator = u.length() * v.length();
    if !(denominator > 0.0) || !denominator.is_finite() {
        return None;
    }
    let cosine = (u.dot(v) / denominator).clamp(-1.0, 1.0);
    let angle = cosine.acos();
    angle.is_finite().then_some(angle)
}

/// Per-axis degrees to radians.
pub fn degrees_to_radians(v: DVec3) -> DVec3 {
    DVec3::new(v.x.to_radians(), v.y.to_radians(), v.z.to_radians())
}
