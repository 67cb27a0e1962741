//! Frame loop: advances a virtual playback clock and renders one frame per
//! step until the sample store runs out of audio.

use std::time::Duration;

use crate::error::Result;
use crate::media::FrameSink;
use crate::render::decimate::decimate;
use crate::render::frame::{Frame, FrameRenderer};
use crate::render::samples::{SampleStore, SampleWindow};

/// One tick of the playback clock.
#[derive(Debug, Clone)]
pub struct TimelineStep {
    pub index: u64,
    /// Playback time in seconds.
    pub time: f64,
    pub sample_index: usize,
    pub window: SampleWindow,
}

/// Iterates playback time in steps of `1 / fps`, yielding the preview window
/// at each step. Ends at the first step whose sample index is past the audio.
#[derive(Debug)]
pub struct Timeline<'a> {
    store: &'a SampleStore,
    preview_samples: usize,
    dt: f64,
    time: f64,
    index: u64,
    done: bool,
}

impl<'a> Timeline<'a> {
    pub fn new(store: &'a SampleStore, fps: u32, preview_samples: usize) -> Self {
        Self {
            store,
            preview_samples,
            dt: 1.0 / f64::from(fps),
            time: 0.0,
            index: 0,
            done: false,
        }
    }
}

impl Iterator for Timeline<'_> {
    type Item = TimelineStep;

    fn next(&mut self) -> Option<TimelineStep> {
        if self.done {
            return None;
        }

        let sample_index = (self.time * f64::from(self.store.sample_rate())).round() as usize;
        let Some(window) = self.store.window(sample_index, self.preview_samples) else {
            self.done = true;
            return None;
        };

        let step = TimelineStep {
            index: self.index,
            time: self.time,
            sample_index,
            window,
        };
        self.index += 1;
        self.time += self.dt;
        Some(step)
    }
}

/// Outcome of a completed frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    /// Video length implied by the frame count and frame rate.
    pub duration: Duration,
}

/// Pulls windows from the store, decimates and rasterizes them, and writes
/// the frames to a sink in order.
#[derive(Debug)]
pub struct TimelineDriver<'a> {
    store: &'a SampleStore,
    renderer: FrameRenderer,
    fps: u32,
    preview_samples: usize,
}

impl<'a> TimelineDriver<'a> {
    pub fn new(
        store: &'a SampleStore,
        renderer: FrameRenderer,
        fps: u32,
        preview_samples: usize,
    ) -> Self {
        Self {
            store,
            renderer,
            fps,
            preview_samples,
        }
    }

    pub fn timeline(&self) -> Timeline<'a> {
        Timeline::new(self.store, self.fps, self.preview_samples)
    }

    /// Runs the loop to the end of the audio.
    ///
    /// # Errors
    /// - The first error returned by `sink` aborts the run
    pub fn run<S: FrameSink>(&self, sink: &mut S) -> Result<RunSummary> {
        let layout = self.renderer.layout();
        let mut frame = Frame::new(self.renderer.width(), self.renderer.height());
        let mut current_clip = None;
        let mut frames = 0u64;

        for step in self.timeline() {
            if current_clip != Some(step.window.clip_index) {
                current_clip = Some(step.window.clip_index);
                if let Some(clip) = self.store.clip(step.window.clip_index) {
                    tracing::info!(
                        "Clip {} \"{}\" starts at frame {} ({:.2}s)",
                        step.window.clip_index,
                        clip.caption,
                        step.index,
                        step.time
                    );
                }
            }

            tracing::debug!("Creating frame {} (sample {})", step.index, step.sample_index);
            let points = decimate(&step.window.samples, layout.wave_width);
            self.renderer.render_into(&points, &mut frame);
            sink.write_frame(&frame)?;

            frames += 1;
            if frames % u64::from(self.fps) == 0 {
                tracing::info!(
                    "Rendered {}s of video ({} frames)",
                    frames / u64::from(self.fps),
                    frames
                );
            }
        }

        tracing::info!("Reached end of audio after {} frames", frames);
        Ok(RunSummary {
            frames,
            duration: Duration::from_secs_f64(frames as f64 / f64::from(self.fps)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::error::VizError;
    use crate::render::samples::Clip;

    const SAMPLE_RATE: u32 = 16000;
    const FPS: u32 = 24;
    const PREVIEW: usize = 4000;

    impl FrameSink for Vec<Frame> {
        fn write_frame(&mut self, frame: &Frame) -> Result<()> {
            self.push(frame.clone());
            Ok(())
        }
    }

    /// Accepts `limit` frames, then fails like a full disk.
    struct FailingSink {
        written: usize,
        limit: usize,
    }

    impl FrameSink for FailingSink {
        fn write_frame(&mut self, _frame: &Frame) -> Result<()> {
            if self.written == self.limit {
                return Err(VizError::sink("No space left on device"));
            }
            self.written += 1;
            Ok(())
        }
    }

    fn clip(caption: &str, len: usize) -> Clip {
        Clip {
            caption: caption.to_string(),
            samples: (0..len).map(|i| 0.25 + (i % 7) as f32 * 0.1).collect(),
        }
    }

    fn renderer() -> FrameRenderer {
        FrameRenderer::new(100, 50, Rgb::new(0x4b, 0x5f, 0x76), Rgb::new(0xc2, 0xf1, 0xdb))
    }

    #[test]
    fn test_single_clip_frame_count_matches_duration() {
        for len in [1, 500, 667, 1000, 16000, 23999, 48000] {
            let store = SampleStore::from_clips(vec![clip("only", len)], SAMPLE_RATE);
            let frames = Timeline::new(&store, FPS, PREVIEW).count() as i64;
            let estimate = (len as u64 * u64::from(FPS) / u64::from(SAMPLE_RATE)) as i64;
            assert!(
                (frames - estimate).abs() <= 1,
                "len {len}: {frames} frames, estimated {estimate}"
            );
        }

        let store = SampleStore::from_clips(vec![clip("one second", 16000)], SAMPLE_RATE);
        assert_eq!(Timeline::new(&store, FPS, PREVIEW).count(), 24);
    }

    #[test]
    fn test_empty_store_renders_nothing() {
        let store = SampleStore::from_clips(Vec::new(), SAMPLE_RATE);
        let driver = TimelineDriver::new(&store, renderer(), FPS, PREVIEW);
        let mut frames: Vec<Frame> = Vec::new();
        let summary = driver.run(&mut frames).unwrap();
        assert_eq!(summary.frames, 0);
        assert!(frames.is_empty());
    }

    #[test]
    fn test_two_clips_end_to_end() {
        let store = SampleStore::from_clips(
            vec![clip("first", 16000), clip("second", 8000)],
            SAMPLE_RATE,
        );
        let driver = TimelineDriver::new(&store, renderer(), FPS, PREVIEW);

        let steps: Vec<TimelineStep> = driver.timeline().collect();
        assert_eq!(steps.len(), 36);
        for step in &steps {
            let expected_clip = if step.index < 24 { 0 } else { 1 };
            assert_eq!(step.window.clip_index, expected_clip, "frame {}", step.index);
            assert_eq!(step.window.samples.len(), PREVIEW);
        }

        // Last frame of the first clip: 667 real samples, then zeros rather
        // than audio from the second clip.
        let boundary = &steps[23];
        assert_eq!(boundary.sample_index, 15333);
        assert_eq!(boundary.window.samples[666], store.clip(0).unwrap().samples[15999]);
        assert!(boundary.window.samples[667..].iter().all(|&s| s == 0.0));

        let first_of_second = &steps[24];
        assert_eq!(first_of_second.sample_index, 16000);
        assert_eq!(first_of_second.window.samples[..], store.clip(1).unwrap().samples[..PREVIEW]);

        let mut frames: Vec<Frame> = Vec::new();
        let summary = driver.run(&mut frames).unwrap();
        assert_eq!(summary.frames, 36);
        assert_eq!(summary.duration, Duration::from_millis(1500));
        assert_eq!(frames.len(), 36);
        assert!(frames.iter().all(|f| f.as_bytes().len() == 100 * 50 * 3));
    }

    #[test]
    fn test_frames_follow_the_audio() {
        let mut loud = clip("loud", 8000);
        loud.samples.iter_mut().for_each(|s| *s = 1.0);
        let quiet = Clip {
            caption: "quiet".to_string(),
            samples: vec![0.0; 8000],
        };
        let store = SampleStore::from_clips(vec![loud, quiet], SAMPLE_RATE);
        let renderer = renderer();
        let layout = renderer.layout();
        let driver = TimelineDriver::new(&store, renderer.clone(), FPS, 100);

        let mut frames: Vec<Frame> = Vec::new();
        driver.run(&mut frames).unwrap();
        assert_eq!(frames.len(), 24);

        let wave = Rgb::new(0xc2, 0xf1, 0xdb);
        let top_of_loud_bar = layout.center - layout.band_height;
        assert_eq!(frames[0].pixel(layout.left, top_of_loud_bar), Some(wave));
        assert_eq!(frames[12], renderer.render(&vec![0.0; layout.wave_width]));
    }

    #[test]
    fn test_sink_error_aborts_run() {
        let store = SampleStore::from_clips(vec![clip("first", 16000)], SAMPLE_RATE);
        let driver = TimelineDriver::new(&store, renderer(), FPS, PREVIEW);

        let mut sink = FailingSink { written: 0, limit: 3 };
        let err = driver.run(&mut sink).unwrap_err();
        assert!(matches!(err, VizError::Sink(_)));
        assert_eq!(sink.written, 3);
    }
}
