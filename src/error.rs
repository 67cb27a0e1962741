//! Error taxonomy for the rendering pipeline.
//!
//! Reaching the end of the audio is not represented here: the sample store
//! signals it with `None` and the frame loop simply stops.

use std::path::PathBuf;

/// Result alias used by the pipeline and media modules.
pub type Result<T> = std::result::Result<T, VizError>;

/// Fatal conditions that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// Malformed arguments or configuration values.
    #[error("{0}")]
    Usage(String),

    /// An input audio file could not be opened, decoded or resampled.
    #[error("failed to decode {}: {message}", .path.display())]
    Decode { path: PathBuf, message: String },

    /// Writing audio samples or video frames to the output failed.
    #[error("output error: {0}")]
    Sink(String),

    /// No ffmpeg binary could be located.
    #[error(
        "ffmpeg not found. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    )]
    FfmpegNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VizError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Process exit code for this error: 2 for usage errors, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => 2,
            _ => 1,
        }
    }
}
