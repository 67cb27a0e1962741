//! ffmpeg binary discovery.
//!
//! `SOUNDVIZ_FFMPEG` overrides the search. Otherwise the usual install
//! locations for the platform are checked before falling back to a PATH
//! lookup, which matters when the tool runs with a minimal PATH.

use std::path::PathBuf;
use std::process::Command;

use crate::error::{Result, VizError};

const FFMPEG_ENV: &str = "SOUNDVIZ_FFMPEG";

/// Locates the ffmpeg binary used for decoding and encoding.
///
/// # Errors
/// - `VizError::FfmpegNotFound` if no candidate exists and PATH lookup fails
pub fn find_ffmpeg() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(FFMPEG_ENV).map(PathBuf::from) {
        if path.exists() {
            tracing::debug!("Using ffmpeg from {}: {}", FFMPEG_ENV, path.display());
            return Ok(path);
        }
        tracing::warn!(
            "{} points to {} which does not exist; searching instead",
            FFMPEG_ENV,
            path.display()
        );
    }

    if let Some(path) = platform_candidates().into_iter().find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", path.display());
    Ok(path)
}

fn platform_candidates() -> Vec<PathBuf> {
    let paths: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\ffmpeg\\bin\\ffmpeg.exe",
            "C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe",
        ]
    } else {
        &[]
    };
    paths.iter().map(PathBuf::from).collect()
}

/// Resolves `binary_name` with `which` (or `where` on Windows).
fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|_| VizError::FfmpegNotFound)?;

    if output.status.success() {
        let stdout = String::from_utf8_lossy(&output.stdout);
        // `where` can list several matches; take the first.
        if let Some(first) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) {
            return Ok(PathBuf::from(first));
        }
    }

    Err(VizError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_ffmpeg() {
        // Passes either way; CI machines may not have ffmpeg.
        match find_ffmpeg() {
            Ok(path) => assert!(path.exists() || path.is_relative()),
            Err(e) => assert!(matches!(e, VizError::FfmpegNotFound)),
        }
    }

    #[test]
    fn test_missing_binary_is_not_found() {
        let err = find_in_path("soundviz-no-such-binary-7f3a").unwrap_err();
        assert!(matches!(err, VizError::FfmpegNotFound));
    }
}
