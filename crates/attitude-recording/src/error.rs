use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Failed to access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Recording is missing column `{0}`")]
    MissingColumn(&'static str),
    #[error("Recording contains no samples")]
    Empty,
    #[error("{times} timestamps but {orientations} orientations")]
    LengthMismatch { times: usize, orientations: usize },
}
