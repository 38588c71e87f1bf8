use crate::quaternion::{axis_angle_to_quaternion, conjugate, product, renormalize, rotate_vector};
use crate::types::{ImuSample, OrientationSequence};
use crate::vector::{angle_between, normalize};
use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// World "up"; a level body at rest measures specific force along it.
pub const WORLD_UP: DVec3 = DVec3::Z;

/// Feedback gains, constant for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gains {
    /// Accelerometer (tilt) correction strength.
    pub alpha: f64,
    /// Magnetometer (heading) correction strength.
    pub alpha2: f64,
}

impl Default for Gains {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            alpha2: 1e-5,
        }
    }
}

/// Horizontal direction the heading correction steers the magnetometer toward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadingReference {
    /// Horizontal projection of the first sample's magnetometer reading,
    /// taken in the world frame of the initial orientation.
    #[default]
    FirstSample,
    /// Fixed world-frame horizontal direction `[x, y]`.
    Fixed([f64; 2]),
}

/// Which corrections run on top of gyro integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// Gyro integration only.
    Gyro,
    /// Gyro integration plus accelerometer tilt correction.
    Tilt,
    /// Tilt correction plus magnetometer heading correction.
    Yaw,
}

impl Pipeline {
    pub const ALL: [Pipeline; 3] = [Pipeline::Gyro, Pipeline::Tilt, Pipeline::Yaw];

    pub fn name(self) -> &'static str {
        match self {
            Pipeline::Gyro => "gyro",
            Pipeline::Tilt => "tilt",
            Pipeline::Yaw => "yaw",
        }
    }

    fn corrects_tilt(self) -> bool {
        matches!(self, Pipeline::Tilt | Pipeline::Yaw)
    }

    fn corrects_yaw(self) -> bool {
        matches!(self, Pipeline::Yaw)
    }

    /// Run this pipeline over `samples` starting from the identity orientation.
    pub fn run(
        self,
        samples: &[ImuSample],
        gains: Gains,
        reference: HeadingReference,
    ) -> OrientationSequence {
        AttitudeEstimator::new(self, gains, DQuat::IDENTITY)
            .with_heading_reference(reference)
            .run(samples)
    }
}

/// Counters for corrections that could not be applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionStats {
    /// Integration steps taken (samples after the first).
    pub steps: u64,
    /// Steps with zero or non-finite angular velocity.
    pub gyro_idle: u64,
    /// Tilt corrections skipped for a zero or non-finite accelerometer reading.
    pub tilt_skipped: u64,
    /// Heading corrections skipped for a zero magnetometer reading or horizontal projection.
    pub yaw_skipped: u64,
}

enum HeadingState {
    /// Waiting for the first sample to fix the reference.
    Pending(HeadingReference),
    /// Unit horizontal reference direction.
    Resolved(DVec2),
    /// Reference was degenerate; heading correction is off for this run.
    Disabled,
}

/// Incremental orientation estimator.
///
/// Feed samples in time order via [`AttitudeEstimator::update`]. The first
/// sample only establishes the starting point; every later sample integrates
/// the gyro over the elapsed interval and applies the corrections enabled by
/// the [`Pipeline`].
pub struct AttitudeEstimator {
    pipeline: Pipeline,
    gains: Gains,
    initial: DQuat,
    orientation: DQuat,
    last_time: Option<f64>,
    heading: HeadingState,
    stats: CorrectionStats,
}

impl AttitudeEstimator {
    pub fn new(pipeline: Pipeline, gains: Gains, initial: DQuat) -> Self {
        Self {
            pipeline,
            gains,
            initial,
            orientation: initial,
            last_time: None,
            heading: HeadingState::Pending(HeadingReference::default()),
            stats: CorrectionStats::default(),
        }
    }

    pub fn with_heading_reference(mut self, reference: HeadingReference) -> Self {
        self.heading = HeadingState::Pending(reference);
        self
    }

    /// Process one sample and return the orientation estimate for it.
    pub fn update(&mut self, sample: &ImuSample) -> DQuat {
        let Some(prev_time) = self.last_time.replace(sample.time) else {
            if self.pipeline.corrects_yaw() {
                self.resolve_heading(sample);
            }
            return self.orientation;
        };

        self.stats.steps += 1;

        let mut q = match gyro_step(self.orientation, sample.gyro, sample.time - prev_time) {
            Some(q) => q,
            None => {
                self.stats.gyro_idle += 1;
                self.orientation
            }
        };

        if self.pipeline.corrects_tilt() {
            match tilt_step(q, sample.accel, self.gains.alpha) {
                Some(corrected) => q = corrected,
                None => {
                    self.stats.tilt_skipped += 1;
                    tracing::trace!(time = sample.time, "Tilt correction skipped");
                }
            }
        }

        if self.pipeline.corrects_yaw() {
            if let HeadingState::Resolved(reference) = self.heading {
                match yaw_step(q, sample.mag, reference, self.gains.alpha2) {
                    Some(corrected) => q = corrected,
                    None => {
                        self.stats.yaw_skipped += 1;
                        tracing::trace!(time = sample.time, "Heading correction skipped");
                    }
                }
            }
        }

        self.orientation = q;
        q
    }

    /// Process a whole sequence, returning one orientation per sample.
    ///
    /// Continues from the current state; [`AttitudeEstimator::stats`] covers
    /// every sample seen so far.
    pub fn run(&mut self, samples: &[ImuSample]) -> OrientationSequence {
        let mut sequence = OrientationSequence::with_capacity(samples.len());
        for sample in samples {
            sequence.push(self.update(sample));
        }
        tracing::debug!(
            pipeline = self.pipeline.name(),
            samples = samples.len(),
            gyro_idle = self.stats.gyro_idle,
            tilt_skipped = self.stats.tilt_skipped,
            yaw_skipped = self.stats.yaw_skipped,
            "Orientation pass complete"
        );
        sequence
    }

    /// Current orientation estimate.
    pub fn orientation(&self) -> DQuat {
        self.orientation
    }

    pub fn stats(&self) -> CorrectionStats {
        self.stats
    }

    /// Horizontal heading reference in use, once resolved.
    pub fn heading_reference(&self) -> Option<DVec2> {
        match self.heading {
            HeadingState::Resolved(reference) => Some(reference),
            _ => None,
        }
    }

    /// Return to the initial orientation and forget the heading reference.
    pub fn reset(&mut self, reference: HeadingReference) {
        self.orientation = self.initial;
        self.last_time = None;
        self.heading = HeadingState::Pending(reference);
        self.stats = CorrectionStats::default();
    }

    fn resolve_heading(&mut self, first: &ImuSample) {
        let HeadingState::Pending(reference) = self.heading else {
            return;
        };
        let direction = match reference {
            HeadingReference::FirstSample => rotate_vector(first.mag, self.orientation).truncate(),
            HeadingReference::Fixed([x, y]) => DVec2::new(x, y),
        };
        let direction = direction.normalize_or_zero();
        self.heading = if direction == DVec2::ZERO {
            tracing::warn!(?reference, "Heading reference is degenerate, heading correction disabled");
            HeadingState::Disabled
        } else {
            tracing::debug!(x = direction.x, y = direction.y, "Heading reference set");
            HeadingState::Resolved(direction)
        };
    }
}

/// Integrate one gyro reading over `dt` seconds, composing in the body frame.
///
/// Returns `None` for zero or non-finite angular velocity, or when the swept
/// angle is not finite (NaN or infinite timestamps). A non-positive `dt` is
/// used as-is and yields a zero or reversed rotation.
pub fn gyro_step(orientation: DQuat, gyro: DVec3, dt: f64) -> Option<DQuat> {
    let rate = gyro.length();
    if !(rate > 0.0) || !rate.is_finite() {
        return None;
    }
    let axis = gyro / rate;
    let theta = rate * dt;
    if !theta.is_finite() {
        return None;
    }
    let delta = axis_angle_to_quaternion(axis, theta);
    Some(renormalize(product(orientation, delta)))
}

/// Pull the estimated accelerometer direction toward world up by `alpha` of
/// the tilt error.
///
/// Returns `None` when the reading is zero or non-finite. Already-aligned (or
/// exactly inverted) readings have no defined tilt axis and return the
/// orientation unchanged.
pub fn tilt_step(orientation: DQuat, accel: DVec3, alpha: f64) -> Option<DQuat> {
    let accel_world = rotate_vector(accel, orientation);
    let phi = angle_between(accel_world, WORLD_UP)?;

    // accel_world × up: rotating about it carries accel_world toward up.
    let tilt_axis = normalize(DVec3::new(accel_world.y, -accel_world.x, 0.0));
    if tilt_axis == DVec3::ZERO {
        return Some(orientation);
    }
    Some(rotate_in_world(orientation, tilt_axis, alpha * phi))
}

/// Pull the horizontal magnetometer heading toward `reference` by `alpha2` of
/// the yaw error.
///
/// `reference` must be a unit horizontal direction. Returns `None` when the
/// reading is zero or has no horizontal component.
pub fn yaw_step(orientation: DQuat, mag: DVec3, reference: DVec2, alpha2: f64) -> Option<DQuat> {
    if !(mag.length_squared() > 0.0) {
        return None;
    }
    let heading = rotate_vector(mag, orientation).truncate();
    if !(heading.length_squared() > 0.0) || !heading.is_finite() {
        return None;
    }
    // Signed angle from reference to measured heading, about world up.
    let yaw_error = reference.perp_dot(heading).atan2(reference.dot(heading));
    Some(rotate_in_world(orientation, WORLD_UP, -alpha2 * yaw_error))
}

/// Apply a world-frame rotation to `orientation`, composed on the right after
/// mapping the axis into the body frame.
fn rotate_in_world(orientation: DQuat, world_axis: DVec3, angle: f64) -> DQuat {
    let body_axis = rotate_vector(world_axis, conjugate(orientation));
    let correction = axis_angle_to_quaternion(normalize(body_axis), angle);
    renormalize(product(orientation, correction))
}

/// Gyro-only orientation sequence starting at `initial`.
pub fn integrate_gyro(samples: &[ImuSample], initial: DQuat) -> OrientationSequence {
    AttitudeEstimator::new(Pipeline::Gyro, Gains::default(), initial).run(samples)
}

/// Gyro integration with accelerometer tilt correction of strength `alpha`.
pub fn correct_tilt(samples: &[ImuSample], alpha: f64) -> OrientationSequence {
    let gains = Gains { alpha, alpha2: 0.0 };
    Pipeline::Tilt.run(samples, gains, HeadingReference::default())
}

/// Tilt correction plus heading correction against the first sample's
/// magnetometer heading.
pub fn correct_yaw(samples: &[ImuSample], alpha: f64, alpha2: f64) -> OrientationSequence {
    correct_yaw_with_reference(samples, alpha, alpha2, HeadingReference::FirstSample)
}

pub fn correct_yaw_with_reference(
    samples: &[ImuSample],
    alpha: f64,
    alpha2: f64,
    reference: HeadingReference,
) -> OrientationSequence {
    Pipeline::Yaw.run(samples, Gains { alpha, alpha2 }, reference)
}
