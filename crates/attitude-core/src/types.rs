use crate::quaternion;
use crate::vector::{degrees_to_radians, normalize};
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Unit the gyroscope channel was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GyroUnits {
    /// Degrees per second (the usual logger output).
    #[default]
    Degrees,
    /// Radians per second.
    Radians,
}

/// IMU reading as it comes out of a recording, before any conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawImuSample {
    /// Seconds since the start of the recording.
    pub time: f64,
    /// Angular velocity in the recording's gyro unit.
    pub gyro: DVec3,
    /// Specific force (m/s^2).
    pub accel: DVec3,
    /// Magnetic field (gauss).
    pub mag: DVec3,
}

/// Converted IMU sample consumed by the estimators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// Seconds, expected to be increasing.
    pub time: f64,
    /// Angular velocity (rad/s).
    pub gyro: DVec3,
    /// Unit specific-force direction (zero if the raw reading was zero).
    pub accel: DVec3,
    /// Unit magnetic-field direction (zero if the raw reading was zero).
    pub mag: DVec3,
}

impl ImuSample {
    pub fn new(time: f64, gyro: DVec3, accel: DVec3, mag: DVec3) -> Self {
        Self {
            time,
            gyro,
            accel,
            mag,
        }
    }

    /// Build a sample from a raw reading.
    ///
    /// Gyro is converted to rad/s; accelerometer and magnetometer are
    /// normalized over the three axes of this sample only.
    pub fn from_raw(raw: &RawImuSample, units: GyroUnits) -> Self {
        let gyro = match units {
            GyroUnits::Degrees => degrees_to_radians(raw.gyro),
            GyroUnits::Radians => raw.gyro,
        };
        Self {
            time: raw.time,
            gyro,
            accel: normalize(raw.accel),
            mag: normalize(raw.mag),
        }
    }
}

/// Orientation estimates, one per input sample and index-aligned with it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrientationSequence(Vec<DQuat>);

impl OrientationSequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub(crate) fn push(&mut self, orientation: DQuat) {
        self.0.push(orientation);
    }

    /// (roll, pitch, yaw) in radians for every entry.
    pub fn euler_angles(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.0.iter().map(|q| quaternion::to_euler(*q))
    }

    /// Largest deviation of any entry's norm from 1.
    pub fn max_norm_error(&self) -> f64 {
        self.0
            .iter()
            .map(|q| (q.length() - 1.0).abs())
            .fold(0.0, f64::max)
    }
}

impl Deref for OrientationSequence {
    type Target = [DQuat];

    fn deref(&self) -> &[DQuat] {
        &self.0
    }
}

impl FromIterator<DQuat> for OrientationSequence {
    fn from_iter<I: IntoIterator<Item = DQuat>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
