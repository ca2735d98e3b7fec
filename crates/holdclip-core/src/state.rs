//! Permission and recording state types.

/// Grant state of the microphone, as resolved by the permission manager.
///
/// Transitions happen only through an explicit request outcome or an
/// external platform notification; nothing here changes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// No request has been resolved yet
    Prompt,
    /// Microphone access is granted
    Granted,
    /// The user or platform refused access
    Denied,
    /// Capture support is absent or no input device is present
    NotFound,
}

/// The minimal recording state exposed to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingStatus {
    /// Not recording
    #[default]
    Inactive,
    /// A capture session is live
    Recording,
}
