//! Configuration management for soundviz.
//!
//! Settings come from built-in defaults, an optional TOML file, and
//! command-line flags, in increasing order of precedence.

pub mod file;

pub use file::SoundvizConfig;
