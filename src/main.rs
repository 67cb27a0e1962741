//! soundviz: render captioned audio clips into a waveform visualization video.

mod app;
mod color;
mod config;
mod error;
mod logging;
mod media;
mod render;

use std::process;

use crate::error::VizError;

fn main() {
    let code = match app::run() {
        Ok(()) => 0,
        Err(e) => report(&e),
    };
    process::exit(code);
}

/// Prints a fatal error and picks the exit code for it.
fn report(err: &anyhow::Error) -> i32 {
    if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
        // Also covers --help and --version, which exit with 0.
        let _ = clap_err.print();
        return clap_err.exit_code();
    }

    tracing::error!(target: logging::FATAL_TARGET, "{err:#}");
    eprintln!("Error: {err:#}");
    err.downcast_ref::<VizError>()
        .map_or(1, VizError::exit_code)
}
