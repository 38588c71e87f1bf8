//! CSV recordings in, orientation tables out.

pub mod error;
pub mod export;
pub mod recording;

pub use error::RecordingError;
pub use export::{export_to_dir, write_orientations};
pub use recording::{load_recording, parse_recording, Recording};
