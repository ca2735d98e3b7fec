//! Event types for audio capture.
//!
//! These events are emitted by the capture layer to communicate with the
//! UI without depending on any specific windowing framework.

/// Events emitted from inside an active capture stream.
#[derive(Debug, Clone)]
pub enum AudioEvent {
    /// The first non-silent fragment arrived on the stream
    MicLive,
}

/// State tracked across fragments of one capture session.
#[derive(Debug, Clone, Default)]
pub struct CaptureActivity {
    /// Whether non-silent audio has been heard yet
    pub mic_live: bool,
}
