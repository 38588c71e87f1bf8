//! End-to-end behaviour of the three estimators on synthetic recordings.

use approx::assert_abs_diff_eq;
use attitude_core::quaternion::{conjugate, product, rotate_vector, to_euler};
use attitude_core::vector::angle_between;
use attitude_core::{
    correct_tilt, correct_yaw, correct_yaw_with_reference, integrate_gyro, AttitudeEstimator,
    Gains, HeadingReference, ImuSample, OrientationSequence, Pipeline,
};
use glam::{DQuat, DVec3};
use std::f64::consts::PI;

const DT: f64 = 0.01;

/// Unit field with a 53° downward dip, pointing north along +X.
fn dipped_north() -> DVec3 {
    DVec3::new(0.6, 0.0, -0.8)
}

fn constant_recording(n: usize, gyro: DVec3, accel: DVec3, mag: DVec3) -> Vec<ImuSample> {
    (0..n)
        .map(|i| ImuSample::new(i as f64 * DT, gyro, accel, mag))
        .collect()
}

fn tilt_error(q: DQuat, accel: DVec3) -> f64 {
    angle_between(rotate_vector(accel, q), DVec3::Z).unwrap()
}

fn all_pipelines(samples: &[ImuSample], gains: Gains) -> Vec<(Pipeline, OrientationSequence)> {
    Pipeline::ALL
        .iter()
        .map(|&p| (p, p.run(samples, gains, HeadingReference::FirstSample)))
        .collect()
}

#[test]
fn still_level_body_stays_at_identity() {
    let samples = constant_recording(500, DVec3::ZERO, DVec3::Z, DVec3::X);

    for (pipeline, seq) in all_pipelines(&samples, Gains::default()) {
        assert_eq!(seq.len(), samples.len());
        for (i, q) in seq.iter().enumerate() {
            assert!(
                q.abs_diff_eq(DQuat::IDENTITY, 1e-15),
                "{} entry {i} drifted to {q:?}",
                pipeline.name()
            );
        }
    }
}

#[test]
fn half_turn_about_z_in_one_second() {
    let samples = [
        ImuSample::new(0.0, DVec3::ZERO, DVec3::Z, DVec3::X),
        ImuSample::new(1.0, DVec3::new(0.0, 0.0, PI), DVec3::Z, DVec3::X),
    ];

    let gyro = integrate_gyro(&samples, DQuat::IDENTITY);
    assert_eq!(gyro[0], DQuat::IDENTITY);
    assert_abs_diff_eq!(gyro[1].w, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(gyro[1].x, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(gyro[1].y, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(gyro[1].z, 1.0, epsilon = 1e-12);

    // Accelerometer already agrees with up, so tilt correction adds nothing.
    let tilt = correct_tilt(&samples, 0.05);
    assert!(tilt[1].abs_diff_eq(gyro[1], 1e-12));
}

#[test]
fn integrate_gyro_starts_at_given_orientation() {
    let initial = DQuat::from_rotation_y(0.25);
    let samples = constant_recording(3, DVec3::ZERO, DVec3::Z, DVec3::X);
    let seq = integrate_gyro(&samples, initial);
    assert!(seq.iter().all(|q| *q == initial));
}

#[test]
fn norm_stays_unit_over_long_runs() {
    let samples: Vec<ImuSample> = (0..20_000)
        .map(|i| {
            let t = i as f64 * DT;
            let gyro = DVec3::new(1.3 * (0.7 * t).sin(), -0.8 * (1.1 * t).cos(), 0.5 + 0.2 * (3.0 * t).sin());
            let accel = DVec3::new(0.1 * (2.0 * t).sin(), 0.1 * (1.5 * t).cos(), 1.0).normalize();
            let mag = DVec3::new((0.3 * t).cos(), (0.3 * t).sin(), -0.8).normalize();
            ImuSample::new(t, gyro, accel, mag)
        })
        .collect();

    let gains = Gains {
        alpha: 0.05,
        alpha2: 0.001,
    };
    for (pipeline, seq) in all_pipelines(&samples, gains) {
        let err = seq.max_norm_error();
        assert!(err < 1e-9, "{} norm error {err}", pipeline.name());
        assert!(seq.iter().all(|q| q.is_finite()));
    }
}

#[test]
fn tilt_correction_bounds_gyro_bias_drift() {
    let bias = DVec3::new(0.02, -0.01, 0.0);
    let samples = constant_recording(3000, bias, DVec3::Z, dipped_north());

    let gyro = integrate_gyro(&samples, DQuat::IDENTITY);
    let tilt = correct_tilt(&samples, 0.05);

    let gyro_err = tilt_error(*gyro.last().unwrap(), DVec3::Z);
    let tilt_err = tilt_error(*tilt.last().unwrap(), DVec3::Z);

    assert!(gyro_err > 0.5, "gyro-only error {gyro_err}");
    assert!(tilt_err < 0.01, "tilt-corrected error {tilt_err}");
    assert!(tilt_err < gyro_err);
}

#[test]
fn no_tilt_gain_matches_gyro_only() {
    let samples = constant_recording(300, DVec3::new(0.02, -0.01, 0.03), DVec3::Z, DVec3::X);
    let gyro = integrate_gyro(&samples, DQuat::IDENTITY);
    let tilt = correct_tilt(&samples, 0.0);
    for (a, b) in gyro.iter().zip(tilt.iter()) {
        assert!(a.abs_diff_eq(*b, 1e-12));
    }
}

#[test]
fn tilt_correction_converges_to_true_tilt() {
    // Body held still, rolled 0.3 rad and yawed 1 rad; estimator starts level.
    let truth = product(DQuat::from_rotation_z(1.0), DQuat::from_rotation_x(0.3));
    let accel = rotate_vector(DVec3::Z, conjugate(truth));
    let samples = constant_recording(3000, DVec3::ZERO, accel, DVec3::X);

    let tilt = correct_tilt(&samples, 0.05);
    assert_abs_diff_eq!(tilt_error(tilt[0], accel), 0.3, epsilon = 1e-9);
    assert!(tilt_error(*tilt.last().unwrap(), accel) < 1e-3);

    let (roll, pitch, _) = to_euler(*tilt.last().unwrap());
    assert_abs_diff_eq!(roll, 0.3, epsilon = 1e-3);
    assert_abs_diff_eq!(pitch, 0.0, epsilon = 1e-3);
}

#[test]
fn yaw_correction_bounds_heading_drift() {
    let bias = DVec3::new(0.0, 0.0, 0.01);
    let samples = constant_recording(3000, bias, DVec3::Z, dipped_north());

    // alpha2 raised well above the recording default so it settles within 30 s.
    let tilt = correct_tilt(&samples, 0.05);
    let yaw = correct_yaw(&samples, 0.05, 0.01);

    let heading = |seq: &OrientationSequence| -> Vec<f64> {
        seq.euler_angles().map(|(_, _, yaw)| yaw.abs()).collect()
    };
    let tilt_heading = heading(&tilt);
    let yaw_heading = heading(&yaw);

    let tilt_final = *tilt_heading.last().unwrap();
    let yaw_late_max = yaw_heading[samples.len() / 2..]
        .iter()
        .copied()
        .fold(0.0, f64::max);

    assert!(tilt_final > 0.25, "tilt-only heading drift {tilt_final}");
    assert!(yaw_late_max < 0.02, "heading error {yaw_late_max}");
    // Bounded: the second half does not keep growing.
    assert_abs_diff_eq!(
        yaw_heading[samples.len() / 2],
        *yaw_heading.last().unwrap(),
        epsilon = 1e-3
    );
}

#[test]
fn fixed_reference_pulls_heading_to_north() {
    // Body yawed 0.4 rad from north, not rotating; reference fixed at +X.
    let truth = DQuat::from_rotation_z(0.4);
    let mag = rotate_vector(dipped_north(), conjugate(truth));
    let samples = constant_recording(4000, DVec3::ZERO, DVec3::Z, mag);

    let seq = correct_yaw_with_reference(&samples, 0.05, 0.01, HeadingReference::Fixed([1.0, 0.0]));
    let (_, _, yaw) = to_euler(*seq.last().unwrap());
    assert_abs_diff_eq!(yaw, 0.4, epsilon = 0.01);
}

#[test]
fn non_monotonic_time_is_accepted() {
    let times = [0.0, 1.0, 1.0, 0.5, 2.0];
    let samples: Vec<ImuSample> = times
        .iter()
        .map(|&t| ImuSample::new(t, DVec3::new(0.0, 0.0, 0.2), DVec3::Z, DVec3::X))
        .collect();

    let seq = integrate_gyro(&samples, DQuat::IDENTITY);
    let yaws: Vec<f64> = seq.euler_angles().map(|(_, _, yaw)| yaw).collect();
    assert_abs_diff_eq!(yaws[1], 0.2, epsilon = 1e-12);
    // Duplicate timestamp: no rotation.
    assert_abs_diff_eq!(yaws[2], 0.2, epsilon = 1e-12);
    // Going back in time rotates backwards.
    assert_abs_diff_eq!(yaws[3], 0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(yaws[4], 0.4, epsilon = 1e-12);
}

#[test]
fn zero_readings_never_produce_nan() {
    let mut samples = constant_recording(50, DVec3::new(0.1, 0.0, 0.05), DVec3::Z, DVec3::X);
    samples[10].accel = DVec3::ZERO;
    samples[20].mag = DVec3::ZERO;
    samples[30].gyro = DVec3::ZERO;
    samples[40] = ImuSample::new(samples[40].time, DVec3::ZERO, DVec3::ZERO, DVec3::ZERO);

    for (pipeline, seq) in all_pipelines(&samples, Gains::default()) {
        assert!(
            seq.iter().all(|q| q.is_finite()),
            "{} produced a non-finite orientation",
            pipeline.name()
        );
    }
}

#[test]
fn nan_timestamp_only_skips_neighbouring_steps() {
    let mut samples = constant_recording(6, DVec3::new(0.0, 0.0, 0.2), DVec3::Z, DVec3::X);
    samples[2].time = f64::NAN;

    for (pipeline, seq) in all_pipelines(&samples, Gains::default()) {
        assert!(
            seq.iter().all(|q| q.is_finite()),
            "{} produced a non-finite orientation",
            pipeline.name()
        );
    }

    // Steps into and out of the bad sample are idle, the rest integrate.
    let mut est = AttitudeEstimator::new(Pipeline::Gyro, Gains::default(), DQuat::IDENTITY);
    let seq = est.run(&samples);
    assert_eq!(est.stats().gyro_idle, 2);
    let (_, _, yaw) = to_euler(*seq.last().unwrap());
    assert_abs_diff_eq!(yaw, 0.2 * 3.0 * DT, epsilon = 1e-12);
}

#[test]
fn pipelines_are_independent_of_each_other() {
    let samples = constant_recording(400, DVec3::new(0.01, 0.02, 0.03), DVec3::Z, dipped_north());
    let first = Pipeline::Yaw.run(&samples, Gains::default(), HeadingReference::FirstSample);
    let _ = Pipeline::Gyro.run(&samples, Gains::default(), HeadingReference::FirstSample);
    let second = Pipeline::Yaw.run(&samples, Gains::default(), HeadingReference::FirstSample);
    assert_eq!(first, second);
}
