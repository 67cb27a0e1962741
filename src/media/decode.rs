//! Audio decoding through an ffmpeg child process.
//!
//! ffmpeg decodes and resamples the input to mono 32-bit float PCM and writes
//! it to stdout, which is parsed as little-endian `f32`.

use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use super::{Decoder, PcmSource};
use crate::error::{Result, VizError};

const BYTES_PER_SAMPLE: usize = 4;

/// Decodes files by spawning one ffmpeg process per file.
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: PathBuf) -> Self {
        Self { ffmpeg }
    }
}

impl Decoder for FfmpegDecoder {
    type Source = FfmpegPcmReader;

    fn open(&self, path: &Path, sample_rate: u32) -> Result<FfmpegPcmReader> {
        if !path.is_file() {
            return Err(VizError::decode(path, "file not found"));
        }

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-hide_banner")
            .arg("-nostdin")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-vn")
            .arg("-f")
            .arg("f32le")
            .arg("-acodec")
            .arg("pcm_f32le")
            .arg("-ac")
            .arg("1") // Force mono
            .arg("-ar")
            .arg(sample_rate.to_string())
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VizError::FfmpegNotFound
            } else {
                VizError::decode(path, format!("failed to start ffmpeg: {e}"))
            }
        })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VizError::decode(path, "failed to capture ffmpeg stdout"));
        };

        tracing::debug!("Spawned ffmpeg decoder for {} at {}Hz", path.display(), sample_rate);
        Ok(FfmpegPcmReader {
            path: path.to_path_buf(),
            child: Some(child),
            stdout,
            bytes: Vec::new(),
        })
    }
}

/// PCM stream from a running ffmpeg decoder.
///
/// The child is reaped once: when the stream ends, or on drop (after a kill)
/// if the reader is abandoned early.
#[derive(Debug)]
pub struct FfmpegPcmReader {
    path: PathBuf,
    child: Option<Child>,
    stdout: ChildStdout,
    bytes: Vec<u8>,
}

impl FfmpegPcmReader {
    /// Waits for ffmpeg and turns a failed exit into a decode error.
    fn finish(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        let status = child
            .wait()
            .map_err(|e| VizError::decode(&self.path, format!("failed waiting for ffmpeg: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(VizError::decode(&self.path, format!("ffmpeg exited with {status}")))
        }
    }
}

impl PcmSource for FfmpegPcmReader {
    fn read_samples(&mut self, buf: &mut [f32]) -> Result<usize> {
        if self.child.is_none() || buf.is_empty() {
            return Ok(0);
        }

        self.bytes.resize(buf.len() * BYTES_PER_SAMPLE, 0);
        let mut filled = 0;

        // A pipe read may end mid-sample; keep reading until aligned or EOF.
        loop {
            match self.stdout.read(&mut self.bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    if filled % BYTES_PER_SAMPLE == 0 {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    return Err(VizError::decode(
                        &self.path,
                        format!("failed reading ffmpeg output: {e}"),
                    ));
                }
            }
        }

        if filled % BYTES_PER_SAMPLE != 0 {
            self.finish()?;
            return Err(VizError::decode(&self.path, "decoded stream ended mid-sample"));
        }
        if filled == 0 {
            self.finish()?;
            return Ok(0);
        }

        Ok(decode_f32le(&self.bytes[..filled], buf))
    }
}

impl Drop for FfmpegPcmReader {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Converts packed little-endian `f32` bytes into `out`. Returns the number of
/// samples written.
fn decode_f32le(bytes: &[u8], out: &mut [f32]) -> usize {
    let mut written = 0;
    for (dst, b) in out.iter_mut().zip(bytes.chunks_exact(BYTES_PER_SAMPLE)) {
        *dst = f32::from_le_bytes([b[0], b[1], b[2], b[3]]);
        written += 1;
    }
    written
}
