use crate::error::RecordingError;
use attitude_core::{GyroUnits, ImuSample, RawImuSample};
use glam::DVec3;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every recording must carry. Others are ignored.
pub const COLUMNS: [&str; 10] = [
    "time",
    "gyroscope.X",
    "gyroscope.Y",
    "gyroscope.Z",
    "accelerometer.X",
    "accelerometer.Y",
    "accelerometer.Z",
    "magnetometer.X",
    "magnetometer.Y",
    "magnetometer.Z",
];

#[derive(Debug, Deserialize)]
struct Row {
    time: f64,
    #[serde(rename = "gyroscope.X")]
    gyro_x: f64,
    #[serde(rename = "gyroscope.Y")]
    gyro_y: f64,
    #[serde(rename = "gyroscope.Z")]
    gyro_z: f64,
    #[serde(rename = "accelerometer.X")]
    accel_x: f64,
    #[serde(rename = "accelerometer.Y")]
    accel_y: f64,
    #[serde(rename = "accelerometer.Z")]
    accel_z: f64,
    #[serde(rename = "magnetometer.X")]
    mag_x: f64,
    #[serde(rename = "magnetometer.Y")]
    mag_y: f64,
    #[serde(rename = "magnetometer.Z")]
    mag_z: f64,
}

impl From<Row> for RawImuSample {
    fn from(row: Row) -> Self {
        RawImuSample {
            time: row.time,
            gyro: DVec3::new(row.gyro_x, row.gyro_y, row.gyro_z),
            accel: DVec3::new(row.accel_x, row.accel_y, row.accel_z),
            mag: DVec3::new(row.mag_x, row.mag_y, row.mag_z),
        }
    }
}

/// A recorded IMU session, exactly as read.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    samples: Vec<RawImuSample>,
}

impl Recording {
    pub fn new(samples: Vec<RawImuSample>) -> Result<Self, RecordingError> {
        if samples.is_empty() {
            return Err(RecordingError::Empty);
        }
        Ok(Self { samples })
    }

    pub fn raw(&self) -> &[RawImuSample] {
        &self.samples
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Number of steps whose timestamp does not increase.
    pub fn non_increasing_steps(&self) -> usize {
        self.samples
            .windows(2)
            .filter(|pair| !(pair[1].time > pair[0].time))
            .count()
    }

    /// Converted samples for the estimators (gyro to rad/s, per-sample unit
    /// accelerometer and magnetometer vectors).
    pub fn to_samples(&self, units: GyroUnits) -> Vec<ImuSample> {
        self.samples
            .iter()
            .map(|raw| ImuSample::from_raw(raw, units))
            .collect()
    }
}

/// Parse a recording from CSV text with a header row.
pub fn parse_recording<R: Read>(reader: R) -> Result<Recording, RecordingError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if let Some(&missing) = COLUMNS.iter().find(|col| !headers.iter().any(|h| h == **col)) {
        return Err(RecordingError::MissingColumn(missing));
    }

    let samples = reader
        .deserialize::<Row>()
        .map(|row| row.map(RawImuSample::from))
        .collect::<Result<Vec<_>, _>>()?;

    let recording = Recording::new(samples)?;

    let non_increasing = recording.non_increasing_steps();
    if non_increasing > 0 {
        tracing::warn!(non_increasing, "Recording timestamps are not strictly increasing");
    }

    Ok(recording)
}

/// Load a recording from a CSV file.
pub fn load_recording(path: &Path) -> Result<Recording, RecordingError> {
    let file = File::open(path).map_err(|source| RecordingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let recording = parse_recording(file)?;
    tracing::info!(?path, rows = recording.raw().len(), "Loaded recording");
    Ok(recording)
}
