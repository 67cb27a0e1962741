//! Nearest-neighbor point sampling of a window down to pixel columns.
//!
//! No averaging or peak picking: the spiky look of raw point samples is kept
//! and the cost depends only on the output width.

/// Picks `output_len` samples from `window` at a fixed real-valued stride.
///
/// Output point `i` is `window[round(i * len / output_len)]`.
pub fn decimate(window: &[f32], output_len: usize) -> Vec<f32> {
    if output_len == 0 {
        return Vec::new();
    }
    if window.is_empty() {
        return vec![0.0; output_len];
    }

    let stride = window.len() as f64 / output_len as f64;
    let last = window.len() - 1;

    (0..output_len)
        .map(|i| {
            let idx = (i as f64 * stride).round() as usize;
            window[idx.min(last)]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_length_is_exact() {
        let window: Vec<f32> = (0..4000).map(|i| (i as f32 * 0.01).sin()).collect();
        for width in [1, 7, 999, 1536, 3999, 4000] {
            assert_eq!(decimate(&window, width).len(), width);
        }
    }

    #[test]
    fn test_equal_length_is_identity() {
        let window: Vec<f32> = (0..257).map(|i| i as f32 / 257.0 - 0.5).collect();
        assert_eq!(decimate(&window, window.len()), window);
    }

    #[test]
    fn test_strided_point_samples() {
        let window: Vec<f32> = (0..10).map(|i| i as f32).collect();
        // stride 2.5: 0, 2.5 -> 3, 5, 7.5 -> 8
        assert_eq!(decimate(&window, 4), vec![0.0, 3.0, 5.0, 8.0]);
    }

    #[test]
    fn test_upsampling_stays_in_bounds() {
        let window = [1.0, -1.0, 0.5];
        let out = decimate(&window, 8);
        assert_eq!(out.len(), 8);
        assert_eq!(out[7], 0.5);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(decimate(&[0.3, 0.4], 0).is_empty());
        assert_eq!(decimate(&[], 3), vec![0.0; 3]);
    }
}
