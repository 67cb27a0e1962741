//! Output writers: the concatenated WAV track and the ffmpeg video encoder.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use hound::{SampleFormat, WavSpec, WavWriter};

use super::{FrameSink, SampleSink};
use crate::error::{Result, VizError};
use crate::render::Frame;

/// Writes the joined audio track as mono 32-bit float WAV.
pub struct WavTrackWriter {
    path: PathBuf,
    writer: WavWriter<BufWriter<File>>,
    samples: u64,
}

impl WavTrackWriter {
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let writer = WavWriter::create(path, spec).map_err(|e| {
            VizError::sink(format!("failed to create audio track {}: {e}", path.display()))
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            samples: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the WAV header and data. Returns the number of samples written.
    pub fn finalize(self) -> Result<u64> {
        let Self {
            path,
            writer,
            samples,
        } = self;
        writer.finalize().map_err(|e| {
            VizError::sink(format!("failed to finalize audio track {}: {e}", path.display()))
        })?;
        tracing::debug!("Audio track written: {} ({} samples)", path.display(), samples);
        Ok(samples)
    }
}

impl SampleSink for WavTrackWriter {
    fn write_samples(&mut self, samples: &[f32]) -> Result<()> {
        for &sample in samples {
            self.writer.write_sample(sample).map_err(|e| {
                VizError::sink(format!("failed to write audio track {}: {e}", self.path.display()))
            })?;
        }
        self.samples += samples.len() as u64;
        Ok(())
    }
}

/// Encodes raw RGB frames plus an audio track into a video file.
///
/// Frames are piped to ffmpeg's stdin as `rawvideo rgb24`. Call
/// [`FfmpegVideoWriter::finish`] to complete the file; dropping an unfinished
/// writer kills the encoder.
#[derive(Debug)]
pub struct FfmpegVideoWriter {
    output: PathBuf,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    frame_size: usize,
    frames: u64,
}

impl FfmpegVideoWriter {
    /// Starts an encoder writing `output`, muxing in the audio at `audio_track`.
    ///
    /// # Errors
    /// - If ffmpeg cannot be started
    pub fn spawn(
        ffmpeg: &Path,
        output: &Path,
        width: usize,
        height: usize,
        fps: u32,
        audio_track: &Path,
    ) -> Result<Self> {
        let frame_size = width
            .checked_mul(height)
            .and_then(|px| px.checked_mul(3))
            .ok_or_else(|| VizError::usage(format!("frame size {width}x{height} is too large")))?;

        let mut cmd = Command::new(ffmpeg);
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-s:v")
            .arg(format!("{width}x{height}"))
            .arg("-r")
            .arg(fps.to_string())
            .arg("-i")
            .arg("-")
            .arg("-i")
            .arg(audio_track)
            .arg("-map")
            .arg("0:v:0")
            .arg("-map")
            .arg("1:a:0")
            // yuv420p needs even dimensions
            .arg("-vf")
            .arg("pad=ceil(iw/2)*2:ceil(ih/2)*2")
            .arg("-c:v")
            .arg("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg("-c:a")
            .arg("aac")
            .arg("-movflags")
            .arg("+faststart")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VizError::FfmpegNotFound
            } else {
                VizError::sink(format!("failed to start ffmpeg encoder: {e}"))
            }
        })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VizError::sink("failed to capture ffmpeg stdin"));
        };

        tracing::debug!(
            "Spawned ffmpeg encoder: {}x{} @ {}fps -> {}",
            width,
            height,
            fps,
            output.display()
        );
        Ok(Self {
            output: output.to_path_buf(),
            child: Some(child),
            stdin: Some(stdin),
            frame_size,
            frames: 0,
        })
    }

    /// Closes the frame stream and waits for ffmpeg to finish the file.
    /// Returns the number of frames written.
    ///
    /// # Errors
    /// - If ffmpeg exits unsuccessfully
    pub fn finish(mut self) -> Result<u64> {
        if let Some(mut stdin) = self.stdin.take() {
            stdin
                .flush()
                .map_err(|e| VizError::sink(format!("failed to flush frames to ffmpeg: {e}")))?;
        }

        let Some(mut child) = self.child.take() else {
            return Ok(self.frames);
        };
        let status = child
            .wait()
            .map_err(|e| VizError::sink(format!("failed waiting for ffmpeg: {e}")))?;
        if !status.success() {
            return Err(VizError::sink(format!(
                "ffmpeg failed with {status} while writing {}",
                self.output.display()
            )));
        }

        tracing::info!("Video written: {} ({} frames)", self.output.display(), self.frames);
        Ok(self.frames)
    }
}

impl FrameSink for FfmpegVideoWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.as_bytes();
        if bytes.len() != self.frame_size {
            return Err(VizError::sink(format!(
                "frame size mismatch: expected {} bytes, got {}",
                self.frame_size,
                bytes.len()
            )));
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| VizError::sink("encoder input already closed"))?;
        stdin.write_all(bytes).map_err(|e| {
            if e.kind() == ErrorKind::BrokenPipe {
                VizError::sink("ffmpeg stopped accepting frames")
            } else {
                VizError::sink(format!("failed to write frame {} to ffmpeg: {e}", self.frames))
            }
        })?;

        self.frames += 1;
        Ok(())
    }
}

impl Drop for FfmpegVideoWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            tracing::warn!("Encoder for {} aborted", self.output.display());
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
