//! Decoded clip storage and per-frame window extraction.
//!
//! Clips are concatenated into one global sample index space in input order.
//! A window is always taken from a single clip: near the end of a clip it is
//! zero-padded instead of continuing into the next one, so each frame only
//! ever shows audio belonging to one caption.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::media::{Decoder, PcmSource, SampleSink};

/// Samples pulled from the decoder per read.
const READ_CHUNK: usize = 4096;

/// One input to the render: a caption and the audio file it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipInput {
    pub caption: String,
    pub path: PathBuf,
}

/// Decoded samples of one input file.
#[derive(Debug, Clone)]
pub struct Clip {
    pub caption: String,
    pub samples: Vec<f32>,
}

/// A fixed-length slice of one clip, zero-padded on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleWindow {
    pub samples: Vec<f32>,
    pub clip_index: usize,
}

/// All decoded clips plus their cumulative end offsets.
#[derive(Debug, Clone)]
pub struct SampleStore {
    clips: Vec<Clip>,
    /// `ends[i]` is the global index one past the last sample of clip `i`.
    ends: Vec<usize>,
    sample_rate: u32,
}

impl SampleStore {
    /// Builds a store from already decoded clips.
    pub fn from_clips(clips: Vec<Clip>, sample_rate: u32) -> Self {
        let ends = clips
            .iter()
            .scan(0usize, |offset, clip| {
                *offset += clip.samples.len();
                Some(*offset)
            })
            .collect();

        Self {
            clips,
            ends,
            sample_rate,
        }
    }

    /// Decodes every input once, in order, at `sample_rate`.
    ///
    /// Each decoded chunk is forwarded to `audio_sink` as it arrives, so the
    /// concatenated audio track is produced in the same pass.
    ///
    /// # Errors
    /// - If any file cannot be opened or decoded (no skipping)
    /// - If the audio sink rejects a chunk
    pub fn build<D, S>(
        inputs: &[ClipInput],
        sample_rate: u32,
        decoder: &D,
        audio_sink: &mut S,
    ) -> Result<Self>
    where
        D: Decoder,
        S: SampleSink,
    {
        let mut clips = Vec::with_capacity(inputs.len());
        let mut chunk = vec![0.0f32; READ_CHUNK];

        for input in inputs {
            tracing::info!("Decoding {} ({})", input.path.display(), input.caption);
            let mut source = decoder.open(&input.path, sample_rate)?;

            let mut samples = Vec::new();
            loop {
                let n = source.read_samples(&mut chunk)?;
                if n == 0 {
                    break;
                }
                samples.extend_from_slice(&chunk[..n]);
                audio_sink.write_samples(&chunk[..n])?;
            }

            tracing::debug!(
                "Decoded {} samples ({:.2}s) from {}",
                samples.len(),
                samples.len() as f64 / f64::from(sample_rate),
                input.path.display()
            );
            clips.push(Clip {
                caption: input.caption.clone(),
                samples,
            });
        }

        Ok(Self::from_clips(clips, sample_rate))
    }

    /// Returns `length` samples starting at global index `index`.
    ///
    /// `None` means `index` lies past the last sample of the last clip; that is
    /// the end-of-run signal, not an error.
    pub fn window(&self, index: usize, length: usize) -> Option<SampleWindow> {
        let clip_index = self.ends.partition_point(|&end| end <= index);
        let clip = self.clips.get(clip_index)?;

        let start = index - self.offset(clip_index);
        let available = &clip.samples[start..];
        let take = available.len().min(length);

        let mut samples = vec![0.0; length];
        samples[..take].copy_from_slice(&available[..take]);

        Some(SampleWindow {
            samples,
            clip_index,
        })
    }

    /// Global index of the first sample of clip `clip_index`.
    pub fn offset(&self, clip_index: usize) -> usize {
        match clip_index {
            0 => 0,
            i => self.ends[i - 1],
        }
    }

    /// Total number of samples across all clips.
    pub fn len(&self) -> usize {
        self.ends.last().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clip(&self, clip_index: usize) -> Option<&Clip> {
        self.clips.get(clip_index)
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback length of the concatenated audio.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.len() as f64 / f64::from(self.sample_rate))
    }
}
