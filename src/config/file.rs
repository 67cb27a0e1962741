//! Configuration file handling for soundviz.
//!
//! Every setting has a built-in default. An optional TOML file can change the
//! defaults; command-line flags override both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::color::Rgb;
use crate::error::{Result, VizError};

/// Video output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Background color as `#RRGGBB`
    pub bg_color: Rgb,
    /// Waveform bar color as `#RRGGBB`
    pub wave_color: Rgb,
    /// Output video file
    pub output: PathBuf,
    /// Frames per second
    pub fps: u32,
    /// Frame width in pixels
    pub width: usize,
    /// Frame height in pixels
    pub height: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            bg_color: Rgb::new(0x4b, 0x5f, 0x76),
            wave_color: Rgb::new(0xc2, 0xf1, 0xdb),
            output: PathBuf::from("video.mp4"),
            fps: 24,
            width: 1920,
            height: 1080,
        }
    }
}

/// Audio decoding and preview settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Rate every input is resampled to, in Hz
    pub sample_rate: u32,
    /// Number of samples shown in one frame's waveform
    pub preview_samples: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            preview_samples: 4000,
        }
    }
}

/// Complete render configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundvizConfig {
    pub video: VideoConfig,
    pub audio: AudioConfig,
}

impl SoundvizConfig {
    /// Loads configuration from `path`, or from the default location when no
    /// path is given. A missing default file yields the built-in defaults.
    ///
    /// # Errors
    /// - If an explicitly given file does not exist
    /// - If the file cannot be read or is not valid TOML
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) if p.is_file() => p,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path).map_err(|e| {
            VizError::usage(format!("cannot read config file {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            VizError::Usage(msg) => VizError::usage(format!("{}: {msg}", path.display())),
            other => other,
        })?;
        tracing::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| VizError::usage(format!("invalid config: {e}")))
    }

    /// Rejects values the renderer cannot work with.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.video.fps == 0, "fps must be greater than 0"),
            (self.video.width == 0, "width must be greater than 0"),
            (self.video.height == 0, "height must be greater than 0"),
            (self.audio.sample_rate == 0, "sample rate must be greater than 0"),
            (self.audio.preview_samples == 0, "preview samples must be greater than 0"),
        ];
        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, msg)) => Err(VizError::usage(*msg)),
            None => Ok(()),
        }
    }
}

/// `~/.config/soundviz/soundviz.toml`, if the home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("soundviz").join("soundviz.toml"))
}
