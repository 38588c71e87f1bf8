use anyhow::{Context, Result};
use attitude_config::{AppConfig, OutputConfig};
use attitude_core::{
    AttitudeEstimator, CorrectionStats, Gains, GyroUnits, HeadingReference, ImuSample,
    OrientationSequence, Pipeline,
};
use clap::Parser;
use glam::DQuat;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "imu-attitude")]
#[command(about = "Estimate orientation from a recorded IMU session", long_about = None)]
struct Cli {
    /// CSV recording with time, gyroscope, accelerometer and magnetometer columns.
    #[arg(value_name = "RECORDING")]
    recording: PathBuf,

    /// Config file (defaults to the platform config directory).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Tilt correction gain.
    #[arg(long)]
    alpha: Option<f64>,

    /// Heading correction gain.
    #[arg(long)]
    alpha2: Option<f64>,

    /// Directory to write one CSV per pipeline into.
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Pipelines to run, e.g. `gyro,yaw`.
    #[arg(long, value_delimiter = ',', value_parser = parse_pipeline)]
    pipelines: Option<Vec<Pipeline>>,

    /// Gyroscope columns are already in rad/s.
    #[arg(long, default_value_t = false)]
    gyro_radians: bool,
}

fn parse_pipeline(s: &str) -> Result<Pipeline, String> {
    Pipeline::ALL
        .into_iter()
        .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown pipeline `{s}` (expected gyro, tilt or yaw)"))
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) {
    if let Some(alpha) = cli.alpha {
        config.gains.alpha = alpha;
    }
    if let Some(alpha2) = cli.alpha2 {
        config.gains.alpha2 = alpha2;
    }
    if let Some(pipelines) = &cli.pipelines {
        config.output = OutputConfig::select(pipelines);
    }
    if cli.gyro_radians {
        config.input.gyro_units = GyroUnits::Radians;
    }
}

fn estimate(
    pipeline: Pipeline,
    samples: &[ImuSample],
    gains: Gains,
    reference: HeadingReference,
) -> (OrientationSequence, CorrectionStats) {
    let mut estimator =
        AttitudeEstimator::new(pipeline, gains, DQuat::IDENTITY).with_heading_reference(reference);
    let sequence = estimator.run(samples);
    (sequence, estimator.stats())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "attitude_app=info,attitude_core=info,attitude_recording=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => attitude_config::load_config_from(path),
        None => attitude_config::load_config(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        warn!(?e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    apply_overrides(&mut config, &cli);

    let gains = config.gains;
    let reference = config.heading.reference;
    let pipelines = config.output.pipelines();
    info!(
        alpha = gains.alpha,
        alpha2 = gains.alpha2,
        ?reference,
        units = ?config.input.gyro_units,
        ?pipelines,
        "Config loaded"
    );
    if pipelines.is_empty() {
        warn!("No pipelines enabled, nothing to do");
        return Ok(());
    }

    let recording = attitude_recording::load_recording(&cli.recording)
        .with_context(|| format!("loading {}", cli.recording.display()))?;
    let times = recording.times();
    let samples: Arc<[ImuSample]> = recording.to_samples(config.input.gyro_units).into();

    // Pipelines share nothing but the input, so each runs on its own blocking thread.
    let handles: Vec<_> = pipelines
        .iter()
        .map(|&pipeline| {
            let samples = Arc::clone(&samples);
            let handle = tokio::task::spawn_blocking(move || {
                estimate(pipeline, &samples, gains, reference)
            });
            (pipeline, handle)
        })
        .collect();

    for (pipeline, handle) in handles {
        let (sequence, stats) = handle
            .await
            .with_context(|| format!("{} pipeline panicked", pipeline.name()))?;

        if let Some(&last) = sequence.last() {
            let (roll, pitch, yaw) = attitude_core::quaternion::to_euler(last);
            info!(
                pipeline = pipeline.name(),
                roll_deg = roll.to_degrees(),
                pitch_deg = pitch.to_degrees(),
                yaw_deg = yaw.to_degrees(),
                norm_error = sequence.max_norm_error(),
                alpha = gains.alpha,
                alpha2 = gains.alpha2,
                "Final orientation"
            );
        }
        if stats.tilt_skipped > 0 || stats.yaw_skipped > 0 {
            warn!(pipeline = pipeline.name(), ?stats, "Some corrections were skipped");
        }

        if let Some(dir) = &cli.output {
            attitude_recording::export_to_dir(dir, pipeline.name(), &times, &sequence)
                .with_context(|| format!("exporting {} pipeline", pipeline.name()))?;
        }
    }

    Ok(())
}
