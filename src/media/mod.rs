//! External media collaborators.
//!
//! Decoding, audio track writing and video encoding are delegated to ffmpeg
//! (and hound for the intermediate WAV track). The render pipeline only sees
//! the traits below, so tests can substitute in-memory fakes.

pub mod decode;
pub mod encode;
pub mod ffmpeg;

use std::path::Path;

use crate::error::Result;
use crate::render::Frame;

pub use decode::FfmpegDecoder;
pub use encode::{FfmpegVideoWriter, WavTrackWriter};
pub use ffmpeg::find_ffmpeg;

/// A stream of mono PCM samples.
pub trait PcmSource {
    /// Fills `buf` with up to `buf.len()` samples. Returns 0 at end of stream.
    fn read_samples(&mut self, buf: &mut [f32]) -> Result<usize>;
}

/// Opens audio files as PCM streams resampled to a target rate.
pub trait Decoder {
    type Source: PcmSource;

    fn open(&self, path: &Path, sample_rate: u32) -> Result<Self::Source>;
}

/// Receives the concatenated audio track.
pub trait SampleSink {
    fn write_samples(&mut self, samples: &[f32]) -> Result<()>;
}

/// Receives rendered frames in presentation order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;
}
