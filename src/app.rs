//! Command-line parsing and the top-level render routine.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};

use crate::color::Rgb;
use crate::config::SoundvizConfig;
use crate::error::VizError;
use crate::logging;
use crate::media::{find_ffmpeg, FfmpegDecoder, FfmpegVideoWriter, WavTrackWriter};
use crate::render::{ClipInput, FrameRenderer, RunSummary, SampleStore, TimelineDriver};

/// Render captioned audio clips into a waveform visualization video
#[derive(Parser, Debug)]
#[command(name = "soundviz")]
#[command(version)]
#[command(
    override_usage = "soundviz [OPTIONS] <CAPTION> <AUDIO_FILE> [<CAPTION> <AUDIO_FILE> ...]"
)]
#[command(
    long_about = "Render captioned audio clips into a waveform visualization video.\n\n\
    The clips are joined in the order given into a single audio track. Each video\n\
    frame shows the waveform of the audio playing at that moment.\n\n\
    EXAMPLES:\n    \
    $ soundviz intro intro.wav outro outro.mp3\n    \
    $ soundviz --fps 30 --width 1280 --height 720 -o clip.mp4 hello hello.m4a"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/soundviz/soundviz.toml\n    Logs:               ~/.local/state/soundviz/soundviz.log.*"
)]
struct Cli {
    /// Alternating caption and audio file arguments
    #[arg(
        value_name = "CAPTION AUDIO_FILE",
        required_unless_present = "completions"
    )]
    pairs: Vec<String>,

    /// Background color for the video [default: #4b5f76]
    #[arg(long, value_name = "#RRGGBB")]
    bg_color: Option<Rgb>,

    /// Waveform color [default: #c2f1db]
    #[arg(long, value_name = "#RRGGBB")]
    wave_color: Option<Rgb>,

    /// Output video file [default: video.mp4]
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Frame rate [default: 24]
    #[arg(long)]
    fps: Option<u32>,

    /// Audio sample rate in Hz [default: 16000]
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Number of samples to visualize at a time [default: 4000]
    #[arg(long)]
    preview_samples: Option<usize>,

    /// Width of each frame in pixels [default: 1920]
    #[arg(long)]
    width: Option<usize>,

    /// Height of each frame in pixels [default: 1080]
    #[arg(long)]
    height: Option<usize>,

    /// Read settings from this TOML file instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Cli {
    /// Overlays the flags that were given on top of `config`.
    fn apply_to(&self, config: &mut SoundvizConfig) {
        let video = &mut config.video;
        if let Some(c) = self.bg_color {
            video.bg_color = c;
        }
        if let Some(c) = self.wave_color {
            video.wave_color = c;
        }
        if let Some(p) = &self.output {
            video.output = p.clone();
        }
        if let Some(v) = self.fps {
            video.fps = v;
        }
        if let Some(v) = self.width {
            video.width = v;
        }
        if let Some(v) = self.height {
            video.height = v;
        }

        let audio = &mut config.audio;
        if let Some(v) = self.sample_rate {
            audio.sample_rate = v;
        }
        if let Some(v) = self.preview_samples {
            audio.preview_samples = v;
        }
    }

    /// Positional arguments must come in caption/file pairs.
    fn check_pairs(&self) -> Result<(), clap::Error> {
        if self.pairs.len() % 2 == 0 {
            return Ok(());
        }
        Err(Cli::command().error(
            ErrorKind::WrongNumberOfValues,
            format!(
                "expected <CAPTION> <AUDIO_FILE> pairs, got {} arguments",
                self.pairs.len()
            ),
        ))
    }

    /// Splits the positional arguments into caption/file pairs.
    fn clip_inputs(&self) -> Vec<ClipInput> {
        self.pairs
            .chunks_exact(2)
            .map(|pair| ClipInput {
                caption: pair[0].clone(),
                path: PathBuf::from(&pair[1]),
            })
            .collect()
    }
}

/// Removes a partially written output file unless the render completes.
struct PartialOutput<'a> {
    path: &'a Path,
    complete: bool,
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if !self.complete && self.path.exists() {
            tracing::warn!("Removing incomplete output {}", self.path.display());
            if let Err(e) = std::fs::remove_file(self.path) {
                tracing::warn!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Parses arguments and renders the video.
///
/// # Exit Codes
/// - 0: Success
/// - 1: Decode, encode or I/O failure
/// - 2: Usage error (invalid arguments, colors or config)
///
/// # Errors
/// - `clap::Error` for argument problems (including `--help`/`--version`)
/// - `VizError` for usage, decode and sink failures
pub fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::try_parse()?;

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "soundviz", &mut io::stdout());
        return Ok(());
    }

    cli.check_pairs()?;

    let mut config = SoundvizConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);
    config.validate()?;

    logging::init_logging(cli.verbose)?;
    tracing::info!("=== soundviz started ===");
    tracing::info!(
        "Settings: {}x{} @ {}fps, {}Hz, {} preview samples, bg={}, wave={}",
        config.video.width,
        config.video.height,
        config.video.fps,
        config.audio.sample_rate,
        config.audio.preview_samples,
        config.video.bg_color,
        config.video.wave_color
    );

    render(&config, &cli.clip_inputs())
}

/// Decodes the inputs, joins their audio, and encodes the waveform video.
fn render(config: &SoundvizConfig, inputs: &[ClipInput]) -> Result<(), anyhow::Error> {
    let started = Instant::now();
    let ffmpeg = find_ffmpeg()?;

    let scratch = tempfile::Builder::new()
        .prefix("soundviz")
        .tempdir()
        .context("Failed to create scratch directory")?;
    let joined_audio = scratch.path().join("joined.wav");

    let mut track = WavTrackWriter::create(&joined_audio, config.audio.sample_rate)?;
    tracing::debug!("Joining audio into {}", track.path().display());
    let store = SampleStore::build(
        inputs,
        config.audio.sample_rate,
        &FfmpegDecoder::new(ffmpeg.clone()),
        &mut track,
    )?;
    track.finalize()?;

    if store.is_empty() {
        bail!("The input files contain no audio samples");
    }
    tracing::info!(
        "Joined {} clips: {} samples ({:.2}s)",
        store.clips().len(),
        store.len(),
        store.duration().as_secs_f64()
    );

    let video = &config.video;
    let renderer =
        FrameRenderer::new(video.width, video.height, video.bg_color, video.wave_color);
    let driver =
        TimelineDriver::new(&store, renderer, video.fps, config.audio.preview_samples);

    let writer = FfmpegVideoWriter::spawn(
        &ffmpeg,
        &video.output,
        video.width,
        video.height,
        video.fps,
        &joined_audio,
    )?;
    let mut output_guard = PartialOutput {
        path: &video.output,
        complete: false,
    };

    let summary = encode(&driver, writer)?;
    output_guard.complete = true;

    if let Err(e) = scratch.close() {
        tracing::warn!("Failed to remove scratch directory: {}", e);
    }

    tracing::info!(
        "=== soundviz finished: {} frames in {:.1}s ===",
        summary.frames,
        started.elapsed().as_secs_f64()
    );
    println!(
        "{} ({} frames, {:.2}s)",
        video.output.display(),
        summary.frames,
        summary.duration.as_secs_f64()
    );
    Ok(())
}

/// Streams every frame into `writer` and finalizes the file. The writer is
/// consumed, so a failed encoder is shut down before this returns.
fn encode(
    driver: &TimelineDriver<'_>,
    mut writer: FfmpegVideoWriter,
) -> Result<RunSummary, VizError> {
    let summary = driver.run(&mut writer)?;
    writer.finish()?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("soundviz").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_pairs_become_clip_inputs() {
        let cli = parse(&["intro", "a.wav", "outro", "b.mp3"]).unwrap();
        let inputs = cli.clip_inputs();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0].caption, "intro");
        assert_eq!(inputs[0].path, PathBuf::from("a.wav"));
        assert_eq!(inputs[1].caption, "outro");
        assert_eq!(inputs[1].path, PathBuf::from("b.mp3"));
    }

    #[test]
    fn test_no_positional_arguments_is_usage_error() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_odd_argument_count_is_usage_error() {
        let cli = parse(&["intro", "a.wav", "dangling"]).unwrap();
        let err = cli.check_pairs().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongNumberOfValues);
        assert_eq!(err.exit_code(), 2);

        assert!(parse(&["intro", "a.wav"]).unwrap().check_pairs().is_ok());
    }

    #[test]
    fn test_invalid_color_is_usage_error() {
        let err = parse(&["--bg-color", "#12345", "intro", "a.wav"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);

        assert!(parse(&["--wave-color", "c2f1db0", "intro", "a.wav"]).is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let cli = parse(&[
            "--bg-color",
            "#000000",
            "--fps",
            "30",
            "--preview-samples",
            "2000",
            "-o",
            "out.mp4",
            "intro",
            "a.wav",
        ])
        .unwrap();

        let mut config = SoundvizConfig::from_toml("[video]\nfps = 60\nwidth = 640\n").unwrap();
        cli.apply_to(&mut config);

        assert_eq!(config.video.bg_color, Rgb::new(0, 0, 0));
        assert_eq!(config.video.fps, 30);
        assert_eq!(config.video.width, 640);
        assert_eq!(config.video.height, 1080);
        assert_eq!(config.video.output, PathBuf::from("out.mp4"));
        assert_eq!(config.audio.preview_samples, 2000);
        assert_eq!(config.audio.sample_rate, 16000);
    }

    #[test]
    fn test_completions_need_no_clips() {
        let cli = parse(&["--completions", "bash"]).unwrap();
        assert_eq!(cli.completions, Some(Shell::Bash));
        assert!(cli.pairs.is_empty());
    }

    #[test]
    fn test_partial_output_is_removed_unless_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("video.mp4");

        std::fs::write(&path, b"partial").unwrap();
        drop(PartialOutput {
            path: &path,
            complete: false,
        });
        assert!(!path.exists());

        std::fs::write(&path, b"done").unwrap();
        drop(PartialOutput {
            path: &path,
            complete: true,
        });
        assert!(path.exists());
    }
}
