// Re-export from sub-crates
pub use holdclip_core::{
    APP_NAME, APP_NAME_PRETTY, AudioEvent, Config, ConfigManager, DEFAULT_LOG_LEVEL, GestureEvent,
    LONG_PRESS_THRESHOLD, PermissionState, PressGesture, RecordingStatus,
};
pub use holdclip_audio::{
    Clip, ClipError, PermissionError, PermissionManager, Recorder, RecorderError, RecordingHandle,
};

// App-specific modules
pub mod clips;
pub mod config_ext;
pub mod controller;
pub mod event;
pub mod icon;
pub mod notify;
pub mod pipeline;

// Version from this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
