//! Orientation estimation from IMU samples.
//!
//! Three estimators share one integration core:
//!
//! - [`integrate_gyro`]: gyro integration only; drifts without bound.
//! - [`correct_tilt`]: adds accelerometer feedback that pulls the estimated
//!   "up" toward the measured specific force (fixes pitch/roll drift).
//! - [`correct_yaw`]: adds magnetometer feedback that pulls the horizontal
//!   field direction toward a reference heading (fixes yaw drift).
//!
//! All three take a finite, time-ordered slice of converted [`ImuSample`]s and
//! return an [`OrientationSequence`] index-aligned with it. They are pure and
//! independent, so callers may run them concurrently.

pub mod fusion;
pub mod quaternion;
pub mod types;
pub mod vector;

pub use fusion::{
    correct_tilt, correct_yaw, correct_yaw_with_reference, integrate_gyro, AttitudeEstimator,
    CorrectionStats, Gains, HeadingReference, Pipeline,
};
pub use types::{GyroUnits, ImuSample, OrientationSequence, RawImuSample};
