//! Core types and configuration for holdclip.
//!
//! This crate provides platform-agnostic types that can be used across
//! all holdclip sub-crates.

mod config;
mod event;
mod gesture;
mod state;

pub use config::{Config, ConfigManager};
pub use event::{AudioEvent, CaptureActivity};
pub use gesture::{GestureEvent, LONG_PRESS_THRESHOLD, PressGesture};
pub use state::{PermissionState, RecordingStatus};

/// Application name
pub const APP_NAME: &str = "holdclip";

/// Pretty application name for display
pub const APP_NAME_PRETTY: &str = "Holdclip";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";
