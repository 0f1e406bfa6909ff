// SPDX-License-Identifier: GPL-3.0-only

//! Gradient-magnitude edge extraction
//!
//! Produces the 8-bit edge map behind the "dark" and "bright" outline
//! styles. The depth frame is downscaled to 8 bits, Gaussian-smoothed
//! to suppress single-pixel speckle, run through Sobel gradients, then
//! the magnitude is self-amplified (saturating doublings) and rescaled
//! so the largest observed magnitude maps to 255. The rescale keeps the
//! full dynamic range in use regardless of scene contrast, at the cost
//! of being sensitive to a single outlier pixel; that trade-off is
//! intentional.

use crate::constants::{EDGE_AMPLIFY_PASSES, EDGE_WEIGHT_X, EDGE_WEIGHT_Y};
use crate::pipeline::types::{DepthFrame, EdgeMap};

/// Edge extractor with preallocated intermediate planes
pub struct EdgeExtractor {
    gray: Vec<u8>,
    smooth: Vec<u8>,
    magnitude: Vec<u16>,
}

impl EdgeExtractor {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            gray: vec![0; width * height],
            smooth: vec![0; width * height],
            magnitude: vec![0; width * height],
        }
    }

    /// Compute the edge magnitude map of a depth frame
    pub fn extract(&mut self, frame: &DepthFrame, out: &mut EdgeMap) {
        let width = frame.width();
        let height = frame.height();
        debug_assert_eq!(out.width(), width);
        debug_assert_eq!(out.height(), height);

        // 11-bit depth to 8-bit intensity
        for (g, &d) in self.gray.iter_mut().zip(frame.as_slice()) {
            *g = (d >> 3) as u8;
        }

        gaussian3(&self.gray, &mut self.smooth, width, height);
        sobel_magnitude(&self.smooth, &mut self.magnitude, width, height);

        // Saturating doublings fatten strong edges toward 255 while weak
        // responses stay proportional.
        for m in &mut self.magnitude {
            let mut v = (*m).min(255);
            for _ in 0..EDGE_AMPLIFY_PASSES {
                v = (v * 2).min(255);
            }
            *m = v;
        }

        // Stretch so the max maps to 255; a flat frame (max 0) is left
        // as-is rather than divided by zero.
        let max = self.magnitude.iter().copied().max().unwrap_or(0);
        let dst = out.as_mut_slice();
        if max == 0 {
            dst.fill(0);
        } else {
            for (d, &m) in dst.iter_mut().zip(&self.magnitude) {
                *d = (m as u32 * 255 / max as u32) as u8;
            }
        }
    }
}

/// Mirror an out-of-range coordinate back inside [0, n)
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    if i < 0 {
        (-i) as usize
    } else if i as usize >= n {
        2 * n - 2 - i as usize
    } else {
        i as usize
    }
}

/// 3x3 binomial smoothing with reflected borders
fn gaussian3(src: &[u8], dst: &mut [u8], width: usize, height: usize) {
    const KERNEL: [[u16; 3]; 3] = [[1, 2, 1], [2, 4, 2], [1, 2, 1]];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u16;
            for (ky, row) in KERNEL.iter().enumerate() {
                let sy = reflect(y as isize + ky as isize - 1, height);
                for (kx, &k) in row.iter().enumerate() {
                    let sx = reflect(x as isize + kx as isize - 1, width);
                    acc += k * src[sy * width + sx] as u16;
                }
            }
            dst[y * width + x] = (acc / 16) as u8;
        }
    }
}

/// Weighted sum of absolute Sobel responses
fn sobel_magnitude(src: &[u8], dst: &mut [u16], width: usize, height: usize) {
    let sample = |x: isize, y: isize| -> i32 {
        src[reflect(y, height) * width + reflect(x, width)] as i32
    };

    for y in 0..height as isize {
        for x in 0..width as isize {
            let tl = sample(x - 1, y - 1);
            let tm = sample(x, y - 1);
            let tr = sample(x + 1, y - 1);
            let ml = sample(x - 1, y);
            let mr = sample(x + 1, y);
            let bl = sample(x - 1, y + 1);
            let bm = sample(x, y + 1);
            let br = sample(x + 1, y + 1);

            let gx = -tl - 2 * ml - bl + tr + 2 * mr + br;
            let gy = -tl - 2 * tm - tr + bl + 2 * bm + br;

            let mag = EDGE_WEIGHT_X * gx.unsigned_abs() + EDGE_WEIGHT_Y * gy.unsigned_abs();
            dst[y as usize * width + x as usize] = mag.min(u16::MAX as u32) as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_frame_has_no_edges() {
        let mut frame = DepthFrame::new(16, 16);
        frame.as_mut_slice().fill(800);
        let mut extractor = EdgeExtractor::new(16, 16);
        let mut map = EdgeMap::new(16, 16);
        extractor.extract(&frame, &mut map);
        assert!(map.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_step_edge_peaks_at_255() {
        let mut frame = DepthFrame::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                frame.set(x, y, if x < 8 { 100 } else { 1900 });
            }
        }
        let mut extractor = EdgeExtractor::new(16, 16);
        let mut map = EdgeMap::new(16, 16);
        extractor.extract(&frame, &mut map);
        // Normalization maps the strongest response to the top of range
        assert_eq!(map.as_slice().iter().copied().max(), Some(255));
        // Columns far from the step stay quiet
        assert_eq!(map.get(1, 8), 0);
        assert_eq!(map.get(14, 8), 0);
    }

    #[test]
    fn test_edge_location_tracks_the_step() {
        let mut frame = DepthFrame::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                frame.set(x, y, if y < 6 { 200 } else { 1500 });
            }
        }
        let mut extractor = EdgeExtractor::new(16, 16);
        let mut map = EdgeMap::new(16, 16);
        extractor.extract(&frame, &mut map);
        assert!(map.get(8, 6) > map.get(8, 1));
        assert!(map.get(8, 5) > map.get(8, 12));
    }

    #[test]
    fn test_reflect_mirrors_out_of_range() {
        assert_eq!(reflect(-1, 10), 1);
        assert_eq!(reflect(0, 10), 0);
        assert_eq!(reflect(9, 10), 9);
        assert_eq!(reflect(10, 10), 8);
    }
}
