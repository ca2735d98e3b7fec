//! Finalized clip data.

use std::io::Cursor;
use std::time::Duration;

use hound::WavReader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipError {
    /// The container bytes do not parse as WAV
    #[error("clip container is not valid wav: {0}")]
    BadContainer(#[from] hound::Error),
    /// A well-formed container holding zero audio frames
    #[error("clip contains no audio frames")]
    Empty,
}

/// A finalized recording: one self-contained WAV object plus the metadata
/// read back out of its header.
#[derive(Debug, Clone)]
pub struct Clip {
    data: Vec<u8>,
    frames: u32,
    channels: u16,
    sample_rate: u32,
}

impl Clip {
    /// Validate finalized container bytes and wrap them as a clip.
    pub fn from_wav(data: Vec<u8>) -> Result<Self, ClipError> {
        let (frames, spec) = {
            let reader = WavReader::new(Cursor::new(&data[..]))?;
            (reader.duration(), reader.spec())
        };
        if frames == 0 {
            return Err(ClipError::Empty);
        }
        Ok(Self {
            data,
            frames,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    /// The playable container bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Audio frames per channel.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(f64::from(self.frames) / f64::from(self.sample_rate))
    }
}
