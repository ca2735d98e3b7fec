//! Asynchronous clip finalization.
//!
//! `stop_recording` hands raw container bytes over and returns
//! immediately; validation happens off the UI thread and the finished
//! clip comes back through the event loop as [`AppEvent::ClipReady`].

use tao::event_loop::EventLoopProxy;
use tokio::runtime::Runtime;
use tracing::{error, info};

use crate::event::AppEvent;
use crate::{Clip, ClipError};

/// Finalization pipeline for recorded clips.
pub struct ClipPipeline {
    runtime: Runtime,
    events: EventLoopProxy<AppEvent>,
}

pub enum SubmitResult {
    Sent,
    Discarded,
}

impl ClipPipeline {
    /// Create a new pipeline instance.
    pub fn new(events: EventLoopProxy<AppEvent>) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()?;

        Ok(Self { runtime, events })
    }

    /// Submit finalized container bytes. Non-blocking; submissions are
    /// processed in order.
    pub fn submit(&self, data: Vec<u8>) -> SubmitResult {
        if data.is_empty() {
            return SubmitResult::Discarded;
        }

        info!(
            bytes = data.len(),
            bytes_mb = data.len() as f64 / (1024.0 * 1024.0),
            "clip submitted for finalization"
        );

        let events = self.events.clone();
        self.runtime.spawn(async move {
            match Clip::from_wav(data) {
                Ok(clip) => {
                    info!(
                        duration_seconds = clip.duration().as_secs_f64(),
                        frames = clip.frames(),
                        "clip finalized"
                    );
                    events.send_event(AppEvent::ClipReady(clip)).ok();
                }
                Err(ClipError::Empty) => {
                    info!("no audio captured, clip discarded");
                }
                Err(err) => {
                    error!(error = %err, "clip failed to finalize");
                    events
                        .send_event(AppEvent::AudioError(err.to_string()))
                        .ok();
                }
            }
        });

        SubmitResult::Sent
    }
}
