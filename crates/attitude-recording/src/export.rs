use crate::error::RecordingError;
use attitude_core::quaternion::to_euler;
use attitude_core::OrientationSequence;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct OrientationRow {
    time: f64,
    w: f64,
    x: f64,
    y: f64,
    z: f64,
    roll_deg: f64,
    pitch_deg: f64,
    yaw_deg: f64,
}

/// Write one row per orientation: time, quaternion components and
/// roll/pitch/yaw in degrees.
pub fn write_orientations<W: Write>(
    writer: W,
    times: &[f64],
    sequence: &OrientationSequence,
) -> Result<(), RecordingError> {
    if times.len() != sequence.len() {
        return Err(RecordingError::LengthMismatch {
            times: times.len(),
            orientations: sequence.len(),
        });
    }

    let mut csv = csv::Writer::from_writer(writer);
    for (&time, q) in times.iter().zip(sequence.iter()) {
        let (roll, pitch, yaw) = to_euler(*q);
        csv.serialize(OrientationRow {
            time,
            w: q.w,
            x: q.x,
            y: q.y,
            z: q.z,
            roll_deg: roll.to_degrees(),
            pitch_deg: pitch.to_degrees(),
            yaw_deg: yaw.to_degrees(),
        })?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write `sequence` to `<dir>/<name>.csv`, creating `dir` if needed.
pub fn export_to_dir(
    dir: &Path,
    name: &str,
    times: &[f64],
    sequence: &OrientationSequence,
) -> Result<PathBuf, RecordingError> {
    let io_err = |source| RecordingError::Io {
        path: dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(dir).map_err(io_err)?;

    let path = dir.join(format!("{name}.csv"));
    let file = std::fs::File::create(&path).map_err(|source| RecordingError::Io {
        path: path.clone(),
        source,
    })?;
    write_orientations(std::io::BufWriter::new(file), times, sequence)?;

    tracing::info!(?path, rows = sequence.len(), "Exported orientations");
    Ok(path)
}
