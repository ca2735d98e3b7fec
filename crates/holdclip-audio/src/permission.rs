//! Microphone permission lifecycle.
//!
//! The manager owns the audio host, the choice of input device, and the
//! live capture stream while a recording runs. Grantability can only be
//! proven by actually opening the device, so a request builds a throwaway
//! probe stream and drops it immediately; the microphone never stays open
//! outside an active recording.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream, SupportedStreamConfig};
use thiserror::Error;
use tracing::{info, warn};

use holdclip_core::PermissionState;

#[derive(Debug, Error)]
pub enum PermissionError {
    /// Recording was attempted without a resolved grant
    #[error("microphone access is not granted ({0:?})")]
    NotGranted(PermissionState),
    /// The granted device disappeared or lost its configuration
    #[error("input device unavailable")]
    DeviceUnavailable,
}

type ChangeCallback = Box<dyn Fn(PermissionState) + Send>;

/// Owner of the microphone access grant and the held capture stream.
pub struct PermissionManager {
    host: Host,
    preferred: Option<String>,
    state: PermissionState,
    held: Option<Stream>,
    on_change: Option<ChangeCallback>,
}

impl PermissionManager {
    /// Manager over the default audio host. `preferred` names an input
    /// device to use instead of the system default.
    pub fn new(preferred: Option<String>) -> Self {
        Self {
            host: cpal::default_host(),
            preferred,
            state: PermissionState::Prompt,
            held: None,
            on_change: None,
        }
    }

    /// Install a callback fired on every state transition, whether it came
    /// from a request outcome or an external notification.
    pub fn with_on_change(mut self, on_change: impl Fn(PermissionState) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(on_change));
        self
    }

    /// Current grant state.
    pub fn state(&self) -> PermissionState {
        self.state
    }

    /// Whether a capture stream is currently held.
    pub fn holds_stream(&self) -> bool {
        self.held.is_some()
    }

    /// Ask the platform for microphone access and return the outcome.
    ///
    /// Failures never propagate as errors; they resolve into the
    /// [`PermissionState`] taxonomy and the UI renders guidance from there.
    pub fn request(&mut self) -> PermissionState {
        let outcome = self.probe();
        self.set_state(outcome);
        outcome
    }

    fn probe(&self) -> PermissionState {
        // A backend that cannot even enumerate devices has no capture
        // support; fail without attempting acquisition.
        if let Err(err) = self.host.input_devices() {
            warn!(error = %err, "audio backend unavailable");
            return PermissionState::NotFound;
        }

        let Some(device) = self.select_device() else {
            info!("no input device present");
            return PermissionState::NotFound;
        };

        let config = match device.default_input_config() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "input device has no usable configuration");
                return state_from_config_error(&err);
            }
        };

        match device.build_input_stream_raw(
            &config.config(),
            config.sample_format(),
            |_: &cpal::Data, _: &cpal::InputCallbackInfo| {},
            |err| warn!(error = %err, "probe stream error"),
            None,
        ) {
            Ok(probe) => {
                // The probe only had to confirm grantability.
                drop(probe);
                info!(device = %device.name().unwrap_or_else(|_| "unknown".into()), "microphone access granted");
                PermissionState::Granted
            }
            Err(err) => {
                warn!(error = %err, "microphone probe failed");
                state_from_build_error(&err)
            }
        }
    }

    /// Borrow the granted device and its stream configuration so a recorder
    /// can be constructed against it.
    pub fn device(&mut self) -> Result<(Device, SupportedStreamConfig), PermissionError> {
        if self.state != PermissionState::Granted {
            return Err(PermissionError::NotGranted(self.state));
        }

        let Some(device) = self.select_device() else {
            self.set_state(PermissionState::NotFound);
            return Err(PermissionError::DeviceUnavailable);
        };

        match device.default_input_config() {
            Ok(config) => Ok((device, config)),
            Err(err) => {
                warn!(error = %err, "input device lost its stream configuration");
                self.set_state(state_from_config_error(&err));
                Err(PermissionError::DeviceUnavailable)
            }
        }
    }

    /// Take ownership of a live capture stream for the duration of a
    /// recording.
    pub fn hold(&mut self, stream: Stream) {
        if self.held.is_some() {
            warn!("replacing a capture stream that was still held");
            self.release();
        }
        self.held = Some(stream);
    }

    /// Stop and drop the held capture stream. Idempotent; calling with no
    /// held stream is a no-op.
    pub fn release(&mut self) {
        if let Some(stream) = self.held.take() {
            stream.pause().ok();
            info!("capture stream released");
        }
    }

    /// Apply a permission change reported by the platform rather than by a
    /// request made here.
    pub fn apply_external_change(&mut self, state: PermissionState) {
        self.set_state(state);
    }

    fn set_state(&mut self, state: PermissionState) {
        if self.state == state {
            return;
        }
        self.state = state;
        if let Some(on_change) = &self.on_change {
            on_change(state);
        }
    }

    fn select_device(&self) -> Option<Device> {
        if let Some(preferred) = self.preferred.as_deref() {
            let found = self
                .host
                .input_devices()
                .ok()
                .and_then(|mut devices| devices.find(|d| d.name().is_ok_and(|n| n == preferred)));
            match found {
                Some(device) => return Some(device),
                None => warn!(
                    device = preferred,
                    "configured input device not found, falling back to default"
                ),
            }
        }
        self.host.default_input_device()
    }
}

/// Map a configuration failure onto the permission taxonomy: a vanished
/// device is `NotFound`, everything else collapses to `Denied`.
fn state_from_config_error(err: &cpal::DefaultStreamConfigError) -> PermissionState {
    match err {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => PermissionState::NotFound,
        _ => PermissionState::Denied,
    }
}

fn state_from_build_error(err: &cpal::BuildStreamError) -> PermissionState {
    match err {
        cpal::BuildStreamError::DeviceNotAvailable => PermissionState::NotFound,
        _ => PermissionState::Denied,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn release_without_stream_is_noop() {
        let mut manager = PermissionManager::new(None);

        manager.release();
        manager.release();

        assert!(!manager.holds_stream());
        assert_eq!(manager.state(), PermissionState::Prompt);
    }

    #[test]
    fn device_requires_grant() {
        let mut manager = PermissionManager::new(None);

        match manager.device() {
            Err(PermissionError::NotGranted(state)) => {
                assert_eq!(state, PermissionState::Prompt);
            }
            other => panic!("expected NotGranted, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn external_change_synchronizes_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut manager = PermissionManager::new(None)
            .with_on_change(move |state| sink.lock().unwrap().push(state));

        manager.apply_external_change(PermissionState::Granted);
        manager.apply_external_change(PermissionState::Granted);
        manager.apply_external_change(PermissionState::Denied);

        assert_eq!(manager.state(), PermissionState::Denied);
        // Repeated identical notifications do not re-fire the callback.
        assert_eq!(
            *seen.lock().unwrap(),
            vec![PermissionState::Granted, PermissionState::Denied]
        );
    }

    #[test]
    fn vanished_device_maps_to_not_found() {
        assert_eq!(
            state_from_config_error(&cpal::DefaultStreamConfigError::DeviceNotAvailable),
            PermissionState::NotFound
        );
        assert_eq!(
            state_from_build_error(&cpal::BuildStreamError::DeviceNotAvailable),
            PermissionState::NotFound
        );
    }

    #[test]
    fn unexpected_failures_collapse_to_denied() {
        assert_eq!(
            state_from_config_error(&cpal::DefaultStreamConfigError::StreamTypeNotSupported),
            PermissionState::Denied
        );
        assert_eq!(
            state_from_build_error(&cpal::BuildStreamError::InvalidArgument),
            PermissionState::Denied
        );
    }
}
