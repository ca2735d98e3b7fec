//! Microphone access and capture for holdclip.

mod clip;
mod permission;
mod record;

pub use clip::{Clip, ClipError};
pub use permission::{PermissionError, PermissionManager};
pub use record::{MIN_DB, Recorder, RecorderError, RecordingHandle, peak_db_fs};
