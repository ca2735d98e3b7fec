//! Application events for the tao event loop.

use crate::icon::MicState;
use crate::{Clip, PermissionState};

/// Events for the tao event loop, raised by the capture and finalize
/// stages.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The tray icon state has changed
    IconChanged(MicState),
    /// The microphone permission state has changed
    PermissionChanged(PermissionState),
    /// A finalized clip is ready to publish
    ClipReady(Clip),
    /// A clip failed to finalize
    AudioError(String),
}
