//! Frame rasterization: background fill plus one centered vertical bar per
//! waveform point.

use crate::color::Rgb;

/// Minimum bar half-height in pixels, so silence still draws a thin line.
const MIN_HALF_HEIGHT: usize = 2;

/// A packed RGB24 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 3],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn fill(&mut self, color: Rgb) {
        for px in self.pixels.chunks_exact_mut(3) {
            px.copy_from_slice(&[color.r, color.g, color.b]);
        }
    }

    /// Returns `None` outside the frame.
    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        Some(Rgb::new(self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]))
    }

    /// Writes outside the frame are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 3;
        self.pixels[i..i + 3].copy_from_slice(&[color.r, color.g, color.b]);
    }

    /// Raw `rgb24` bytes, row-major, top row first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }
}

/// Placement of the waveform band, derived from the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveLayout {
    /// Left margin; the right margin is the same.
    pub left: usize,
    /// Number of bar columns (the middle 80% of the width).
    pub wave_width: usize,
    /// Bar half-height for a sample of magnitude 1.0.
    pub band_height: usize,
    /// Row the bars are centered on.
    pub center: usize,
}

impl WaveLayout {
    pub fn new(width: usize, height: usize) -> Self {
        let left = (width as f64 * 0.1) as usize;
        Self {
            left,
            wave_width: width - left * 2,
            band_height: (height as f64 * 0.2) as usize,
            center: (height as f64 * 0.6) as usize,
        }
    }

    /// Half-height of the bar drawn for sample value `v`.
    pub fn half_height(&self, v: f32) -> usize {
        let scaled = (f64::from(v.abs()) * self.band_height as f64) as usize;
        scaled.max(MIN_HALF_HEIGHT)
    }
}

/// Draws waveform frames of a fixed size and color scheme.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    width: usize,
    height: usize,
    background: Rgb,
    wave: Rgb,
    layout: WaveLayout,
}

impl FrameRenderer {
    pub fn new(width: usize, height: usize, background: Rgb, wave: Rgb) -> Self {
        Self {
            width,
            height,
            background,
            wave,
            layout: WaveLayout::new(width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn layout(&self) -> WaveLayout {
        self.layout
    }

    #[cfg(test)]
    pub fn render(&self, points: &[f32]) -> Frame {
        let mut frame = Frame::new(self.width, self.height);
        self.render_into(points, &mut frame);
        frame
    }

    /// Overwrites every pixel of `frame`, which must match the renderer's size.
    pub fn render_into(&self, points: &[f32], frame: &mut Frame) {
        debug_assert_eq!((frame.width(), frame.height()), (self.width, self.height));
        frame.fill(self.background);

        let center = self.layout.center;
        for (i, &v) in points.iter().enumerate() {
            let x = self.layout.left + i;
            let half = self.layout.half_height(v);
            let top = center.saturating_sub(half);
            let bottom = center.saturating_add(half).min(self.height);
            for y in top..bottom {
                frame.set_pixel(x, y, self.wave);
            }
        }
    }
}
