//! Capture stream and in-memory clip assembly. There is only ever one
//! active recording; the stream handle itself is held by the permission
//! manager, this module owns the data side.
//!
//! Fragments arriving from the device callback are appended straight into
//! a WAV container growing in memory. WAV is the one container format the
//! whole system uses; finalizing the writer stitches the fragments into a
//! single playable object.

use std::io::{self, Cursor, Seek, SeekFrom, Write};
use std::sync::Arc;

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, Sample};
use hound::WavWriter;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{error, info};

use holdclip_core::{AudioEvent, CaptureActivity};

#[derive(Debug, Error)]
pub enum RecorderError {
    /// generic anyhow error
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    /// Sample format not supported
    #[error("sample format not supported: {0}")]
    SampleFormatNotSupported(String),
    /// Build stream error
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    /// The stream was built but refused to start
    #[error(transparent)]
    Play(#[from] cpal::PlayStreamError),
}

type Result<T> = std::result::Result<T, RecorderError>;
type WavWriterHandle = Arc<Mutex<Option<WavWriter<ClipBuffer>>>>;

/// A cheaply cloneable handle to the bytes being recorded. The wav writer
/// does not give its sink back on finalize, so the buffer lives behind an
/// Arc<Mutex> and is unwrapped once the writer is gone.
#[derive(Clone)]
struct ClipBuffer {
    inner: Arc<Mutex<Cursor<Vec<u8>>>>,
}

impl ClipBuffer {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Cursor::new(Vec::with_capacity(8 * 1024)))),
        }
    }

    fn try_into_inner(self) -> Result<Vec<u8>> {
        let owned = Arc::try_unwrap(self.inner)
            .map_err(|_| RecorderError::Anyhow(anyhow!("clip buffer is still shared")))?;
        Ok(owned.into_inner().into_inner())
    }
}

impl Seek for ClipBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.lock().seek(pos)
    }
}

impl Write for ClipBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

/// Builds capture streams bound to the fixed WAV container format.
#[derive(Debug, Default)]
pub struct Recorder;

impl Recorder {
    pub fn new() -> Self {
        Self
    }

    /// Start capturing from `device`. Returns the live stream (to be held
    /// by the permission manager) and the handle that finalizes the clip.
    ///
    /// `on_event` is called from the device callback thread; the first
    /// non-silent fragment raises [`AudioEvent::MicLive`].
    pub fn start<F>(
        &self,
        device: &cpal::Device,
        config: &cpal::SupportedStreamConfig,
        on_event: F,
    ) -> Result<(cpal::Stream, RecordingHandle)>
    where
        F: Fn(AudioEvent) + Send + 'static,
    {
        info!(
            device_name = %device.name().unwrap_or_else(|_| "unknown".into()),
            config = ?config,
            "recording from device"
        );

        let spec = wav_spec_from_config(config);

        let buffer = ClipBuffer::new();
        let writer =
            WavWriter::new(buffer.clone(), spec).map_err(|e| RecorderError::Anyhow(e.into()))?;
        let writer = Arc::new(Mutex::new(Some(writer)));

        // The device callback runs on its own thread.
        let writer_2 = writer.clone();

        let err_fn = move |err| {
            error!("an error occurred on stream: {}", err);
        };

        let mut activity = CaptureActivity::default();
        let stream_config = config.config();

        let stream = match config.sample_format() {
            cpal::SampleFormat::I8 => device.build_input_stream(
                &stream_config,
                move |data: &[i8], _: &_| {
                    write_fragment::<i8, i8, F>(data, &mut activity, &writer_2, &on_event)
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &_| {
                    write_fragment::<i16, i16, F>(data, &mut activity, &writer_2, &on_event)
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I32 => device.build_input_stream(
                &stream_config,
                move |data: &[i32], _: &_| {
                    write_fragment::<i32, i32, F>(data, &mut activity, &writer_2, &on_event)
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &_| {
                    write_fragment::<f32, f32, F>(data, &mut activity, &writer_2, &on_event)
                },
                err_fn,
                None,
            )?,
            sample_format => {
                return Err(RecorderError::SampleFormatNotSupported(format!(
                    "{:?}",
                    sample_format
                )));
            }
        };

        stream.play()?;

        Ok((
            stream,
            RecordingHandle {
                writer,
                buffer: Some(buffer),
            },
        ))
    }
}

/// Handle to the data of the active recording. You must call `finish` to
/// receive the clip bytes; dropping an unfinished handle finalizes it as a
/// safety net.
pub struct RecordingHandle {
    writer: WavWriterHandle,
    // Presence of the buffer indicates the recording has not been
    // finalized yet.
    buffer: Option<ClipBuffer>,
}

impl RecordingHandle {
    /// Finalize the container and return the clip bytes. Returns `None`
    /// when the handle was already finished.
    pub fn finish(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(buffer) = self.buffer.take() else {
            return Ok(None);
        };
        info!("finalizing clip container");
        // Taking the writer makes the device callback drop any fragments
        // that still arrive while the stream winds down.
        if let Some(writer) = self.writer.lock().take() {
            writer
                .finalize()
                .map_err(|e| RecorderError::Anyhow(anyhow!("Failed to finalize writer: {}", e)))?;
        }
        let data = buffer.try_into_inner()?;
        Ok(Some(data))
    }
}

impl Drop for RecordingHandle {
    fn drop(&mut self) {
        if self.buffer.is_some() {
            if let Err(e) = self.finish() {
                error!("failed to finalize recording: {}", e);
            }
        }
    }
}

fn wav_spec_from_config(config: &cpal::SupportedStreamConfig) -> hound::WavSpec {
    hound::WavSpec {
        channels: config.channels(),
        sample_rate: config.sample_rate().0,
        bits_per_sample: (config.sample_format().sample_size() * 8) as _,
        sample_format: wav_sample_format(config.sample_format()),
    }
}

fn wav_sample_format(format: cpal::SampleFormat) -> hound::SampleFormat {
    if format.is_float() {
        hound::SampleFormat::Float
    } else {
        hound::SampleFormat::Int
    }
}

fn write_fragment<T, U, F>(
    input: &[T],
    activity: &mut CaptureActivity,
    writer: &WavWriterHandle,
    on_event: &F,
) where
    T: Sample + Copy,
    U: Sample + hound::Sample + FromSample<T>,
    f32: FromSample<T>,
    F: Fn(AudioEvent),
{
    // Zero-size fragments carry no audio.
    if input.is_empty() {
        return;
    }
    if !activity.mic_live && peak_db_fs(input) > MIN_DB {
        activity.mic_live = true;
        on_event(AudioEvent::MicLive);
    }
    if let Some(mut guard) = writer.try_lock() {
        if let Some(writer) = guard.as_mut() {
            for &sample in input.iter() {
                writer.write_sample(U::from_sample(sample)).ok();
            }
        }
    }
}

/// Silence floor for level metering.
pub const MIN_DB: f32 = -96.0;

/// Peak level of a fragment in dBFS, regardless of its sample type.
pub fn peak_db_fs<T>(data: &[T]) -> f32
where
    T: Sample + Copy,
    f32: FromSample<T>,
{
    let peak = data
        .iter()
        .fold(0.0f32, |max, &sample| f32::from_sample(sample).abs().max(max));
    (20.0 * peak.log10()).clamp(MIN_DB, 0.0)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn test_writer() -> (WavWriterHandle, ClipBuffer) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let buffer = ClipBuffer::new();
        let writer = WavWriter::new(buffer.clone(), spec).unwrap();
        (Arc::new(Mutex::new(Some(writer))), buffer)
    }

    fn handle_with_fragments(fragments: &[&[i16]]) -> RecordingHandle {
        let (writer, buffer) = test_writer();
        let mut activity = CaptureActivity::default();
        for fragment in fragments {
            write_fragment::<i16, i16, _>(fragment, &mut activity, &writer, &|_| {});
        }
        RecordingHandle {
            writer,
            buffer: Some(buffer),
        }
    }

    #[test]
    fn finish_yields_parseable_container() {
        let mut handle = handle_with_fragments(&[&[0, 1_000, -1_000], &[32_000]]);

        let data = handle.finish().unwrap().unwrap();

        let reader = hound::WavReader::new(Cursor::new(&data[..])).unwrap();
        assert_eq!(reader.duration(), 4);
        assert_eq!(reader.spec().sample_rate, 8_000);
    }

    #[test]
    fn finish_twice_returns_none() {
        let mut handle = handle_with_fragments(&[&[1, 2, 3]]);

        assert!(handle.finish().unwrap().is_some());
        assert!(handle.finish().unwrap().is_none());
    }

    #[test]
    fn zero_size_fragments_are_discarded() {
        let mut handle = handle_with_fragments(&[&[], &[5, 6], &[]]);

        let data = handle.finish().unwrap().unwrap();

        let reader = hound::WavReader::new(Cursor::new(&data[..])).unwrap();
        assert_eq!(reader.duration(), 2);
    }

    #[test]
    fn mic_live_fires_once_on_first_loud_fragment() {
        let (writer, _buffer) = test_writer();
        let mut activity = CaptureActivity::default();
        let events = Cell::new(0u32);
        let on_event = |_: AudioEvent| events.set(events.get() + 1);

        write_fragment::<i16, i16, _>(&[0, 0, 0], &mut activity, &writer, &on_event);
        assert_eq!(events.get(), 0);

        write_fragment::<i16, i16, _>(&[20_000], &mut activity, &writer, &on_event);
        write_fragment::<i16, i16, _>(&[20_000], &mut activity, &writer, &on_event);
        assert_eq!(events.get(), 1);
    }

    #[test]
    fn peak_db_fs_clamps_silence_to_floor() {
        assert_eq!(peak_db_fs::<f32>(&[]), MIN_DB);
        assert_eq!(peak_db_fs(&[0.0f32, 0.0]), MIN_DB);
        assert_eq!(peak_db_fs(&[0i16, 0]), MIN_DB);
    }

    #[test]
    fn peak_db_fs_full_scale_is_zero() {
        assert!(peak_db_fs(&[1.0f32]).abs() < 1e-6);
    }

    #[test]
    fn peak_db_fs_half_scale_is_about_minus_six() {
        let db = peak_db_fs(&[0.5f32, -0.25]);
        assert!((db + 6.02).abs() < 0.1, "got {db}");
    }

    #[test]
    fn wav_sample_format_maps_floats_and_ints() {
        assert_eq!(
            wav_sample_format(cpal::SampleFormat::F32),
            hound::SampleFormat::Float
        );
        assert_eq!(
            wav_sample_format(cpal::SampleFormat::I16),
            hound::SampleFormat::Int
        );
    }
}
