//! Waveform video rendering pipeline.
//!
//! Maps playback time to a window of decoded samples, decimates the window to
//! one point per pixel column, and rasterizes each frame:
//!
//! `SampleStore` -> `decimate` -> `FrameRenderer` -> `FrameSink`
//!
//! with `TimelineDriver` running the loop until the audio is exhausted.

pub mod decimate;
pub mod frame;
pub mod samples;
pub mod timeline;

pub use frame::{Frame, FrameRenderer};
pub use samples::{ClipInput, SampleStore};
pub use timeline::{RunSummary, TimelineDriver};
