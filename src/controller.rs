//! Recording lifecycle orchestration.
//!
//! Sits between the gesture wiring and the capture layer: a confirmed
//! long press starts a session, its release stops one. Status flips are
//! optimistic; the UI state changes before the hardware catches up.

use tao::event_loop::EventLoopProxy;
use tracing::{error, info, warn};

use crate::event::AppEvent;
use crate::icon::MicState;
use crate::pipeline::{ClipPipeline, SubmitResult};
use crate::{
    AudioEvent, PermissionManager, PermissionState, Recorder, RecordingHandle, RecordingStatus,
};

/// Owner of the active capture session.
///
/// A session exists exactly while the status is `Recording`: starting
/// creates the stream/handle pair, stopping consumes them. Nothing is
/// shared across attempts.
pub struct RecorderController {
    permissions: PermissionManager,
    recorder: Recorder,
    pipeline: ClipPipeline,
    active: Option<RecordingHandle>,
    status: RecordingStatus,
    events: EventLoopProxy<AppEvent>,
}

impl RecorderController {
    pub fn new(
        permissions: PermissionManager,
        pipeline: ClipPipeline,
        events: EventLoopProxy<AppEvent>,
    ) -> Self {
        Self {
            permissions,
            recorder: Recorder::new(),
            pipeline,
            active: None,
            status: RecordingStatus::Inactive,
            events,
        }
    }

    pub fn status(&self) -> RecordingStatus {
        self.status
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permissions.state()
    }

    /// Begin a capture session.
    ///
    /// Without a grant this only issues the permission request and
    /// returns; the user presses again once access is resolved. One
    /// attempt per press, no blocking wait.
    pub fn start_recording(&mut self) {
        if self.permissions.state() != PermissionState::Granted {
            let outcome = self.permissions.request();
            info!(state = ?outcome, "permission requested, capture deferred to the next press");
            return;
        }

        self.status = RecordingStatus::Recording;
        self.set_icon(MicState::Activating);

        let (device, config) = match self.permissions.device() {
            Ok(pair) => pair,
            Err(err) => {
                warn!(error = %err, "capture device unavailable");
                self.status = RecordingStatus::Inactive;
                self.set_icon(MicState::Idle);
                return;
            }
        };

        let proxy = self.events.clone();
        let on_event = move |event: AudioEvent| match event {
            AudioEvent::MicLive => {
                proxy
                    .send_event(AppEvent::IconChanged(MicState::Active))
                    .ok();
            }
        };

        match self.recorder.start(&device, &config, on_event) {
            Ok((stream, handle)) => {
                // The stream handle belongs to the permission manager for
                // the lifetime of the session.
                self.permissions.hold(stream);
                self.active = Some(handle);
            }
            Err(err) => {
                error!(error = %err, "failed to start recording");
                self.status = RecordingStatus::Inactive;
                self.set_icon(MicState::Idle);
            }
        }
    }

    /// End the capture session and submit the clip for finalization.
    ///
    /// The status flips to `Inactive` immediately even though the clip
    /// only materializes once the pipeline finishes.
    pub fn stop_recording(&mut self) {
        self.status = RecordingStatus::Inactive;
        self.set_icon(MicState::Idle);

        let Some(mut handle) = self.active.take() else {
            return;
        };

        match handle.finish() {
            Ok(Some(data)) => match self.pipeline.submit(data) {
                SubmitResult::Sent => {}
                SubmitResult::Discarded => info!("recording produced no clip"),
            },
            Ok(None) => warn!("recording finished but no data was recorded"),
            Err(err) => error!(error = ?err, "failed to finish recording"),
        }

        self.permissions.release();
    }

    fn set_icon(&self, state: MicState) {
        self.events.send_event(AppEvent::IconChanged(state)).ok();
    }
}
