// SPDX-License-Identifier: GPL-3.0-only

//! Depth-map hole filling ("in-painting")
//!
//! Shadows and out-of-range patches arrive as runs of the sentinel
//! value. Two independent passes (horizontal over rows, vertical over
//! columns) fill each run with the *farther* of its two valid bounding
//! depths, then the passes are merged per pixel by max. Holes are
//! assumed to belong to whatever is behind them, so this consistently
//! biases fills toward background and keeps foreground objects from
//! bleeding into their own shadows. A small jitter keeps filled regions
//! from rendering visibly flat.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::constants::{DEPTH_SENTINEL, FILL_JITTER};
use crate::pipeline::types::DepthFrame;

/// Trailing scan margins for the two passes
///
/// The row scan skips one trailing column, the column scan four; the
/// asymmetry is historical display cropping and is kept as data rather
/// than silently equalized.
#[derive(Debug, Clone, Copy)]
pub struct FillMargins {
    /// Columns at the right edge excluded from the horizontal scan
    pub row_tail: usize,
    /// Columns at the right edge excluded from the vertical scan
    pub col_tail: usize,
}

impl Default for FillMargins {
    fn default() -> Self {
        Self {
            row_tail: 1,
            col_tail: 4,
        }
    }
}

/// In-place hole filler with preallocated scratch buffers
pub struct HoleFiller {
    margins: FillMargins,
    scratch_rows: DepthFrame,
    scratch_cols: DepthFrame,
    rng: SmallRng,
}

impl HoleFiller {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_margins(width, height, FillMargins::default())
    }

    pub fn with_margins(width: usize, height: usize, margins: FillMargins) -> Self {
        Self {
            margins,
            scratch_rows: DepthFrame::new(width, height),
            scratch_cols: DepthFrame::new(width, height),
            rng: SmallRng::from_entropy(),
        }
    }

    /// Deterministic jitter for tests
    pub fn with_seed(width: usize, height: usize, seed: u64) -> Self {
        let mut filler = Self::new(width, height);
        filler.rng = SmallRng::seed_from_u64(seed);
        filler
    }

    /// Fill sentinel runs in `frame` in place
    ///
    /// Runs with no valid bound on either side (a hole spanning an
    /// entire row or column) are left as sentinel; downstream stages
    /// tolerate residual sentinel values.
    pub fn fill(&mut self, frame: &mut DepthFrame) {
        self.scratch_rows.copy_from(frame);
        self.scratch_cols.copy_from(frame);

        fill_rows(&mut self.scratch_rows, self.margins.row_tail, &mut self.rng);
        fill_columns(&mut self.scratch_cols, self.margins.col_tail, &mut self.rng);

        // Keep the farther of the two fills so a hole only stays near
        // if both passes independently found near bounds.
        let dst = frame.as_mut_slice();
        let rows = self.scratch_rows.as_slice();
        let cols = self.scratch_cols.as_slice();
        for (d, (&r, &c)) in dst.iter_mut().zip(rows.iter().zip(cols)) {
            *d = r.max(c);
        }
    }
}

/// Resolve the fill value for a run from its two bounding samples
///
/// A bound that is itself sentinel (run touching the scan edge)
/// substitutes the other side; returns None when neither side is valid.
fn resolve_bounds(a: u16, b: u16) -> Option<u16> {
    match (a == DEPTH_SENTINEL, b == DEPTH_SENTINEL) {
        (true, true) => None,
        (true, false) => Some(b),
        (false, true) => Some(a),
        (false, false) => Some(a.max(b)),
    }
}

#[inline]
fn jitter(value: u16, rng: &mut SmallRng) -> u16 {
    let noisy = value as i32 + rng.gen_range(-FILL_JITTER..=FILL_JITTER);
    noisy.clamp(0, DEPTH_SENTINEL as i32) as u16
}

fn fill_rows(frame: &mut DepthFrame, tail: usize, rng: &mut SmallRng) {
    let width = frame.width();
    let limit = width.saturating_sub(tail.max(1));
    for y in 0..frame.height() {
        let mut x = 1;
        while x < limit {
            if frame.get(x, y) != DEPTH_SENTINEL {
                x += 1;
                continue;
            }
            let start = x;
            while x < limit && frame.get(x, y) == DEPTH_SENTINEL {
                x += 1;
            }
            let end = x - 1;
            let left = frame.get(start - 1, y);
            let right = frame.get(end + 1, y);
            if let Some(depth) = resolve_bounds(left, right) {
                for fx in start..=end {
                    frame.set(fx, y, jitter(depth, rng));
                }
            }
            x += 1;
        }
    }
}

fn fill_columns(frame: &mut DepthFrame, tail: usize, rng: &mut SmallRng) {
    let height = frame.height();
    let limit = height - 1;
    for x in 0..frame.width().saturating_sub(tail) {
        let mut y = 1;
        while y < limit {
            if frame.get(x, y) != DEPTH_SENTINEL {
                y += 1;
                continue;
            }
            let start = y;
            while y < limit && frame.get(x, y) == DEPTH_SENTINEL {
                y += 1;
            }
            let end = y - 1;
            let top = frame.get(x, start - 1);
            let bottom = frame.get(x, end + 1);
            if let Some(depth) = resolve_bounds(top, bottom) {
                for fy in start..=end {
                    frame.set(x, fy, jitter(depth, rng));
                }
            }
            y += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_frame(width: usize, height: usize, value: u16) -> DepthFrame {
        let mut frame = DepthFrame::new(width, height);
        frame.as_mut_slice().fill(value);
        frame
    }

    #[test]
    fn test_fill_is_noop_without_sentinels() {
        let mut frame = uniform_frame(16, 8, 600);
        let before = frame.clone();
        let mut filler = HoleFiller::with_seed(16, 8, 7);
        filler.fill(&mut frame);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_horizontal_run_filled_with_farther_bound() {
        let mut frame = uniform_frame(16, 8, 500);
        // Hole at y=3, x=4..=7 bounded by 500 on the left and 900 on the right
        for x in 4..=7 {
            frame.set(x, 3, DEPTH_SENTINEL);
        }
        frame.set(8, 3, 900);
        let mut filler = HoleFiller::with_seed(16, 8, 7);
        filler.fill(&mut frame);
        for x in 4..=7 {
            let v = frame.get(x, 3) as i32;
            assert!(
                (900 - FILL_JITTER..=900 + FILL_JITTER).contains(&v),
                "pixel ({}, 3) = {} not within jitter of the far bound",
                x,
                v
            );
        }
    }

    #[test]
    fn test_one_sided_run_uses_the_valid_bound() {
        let mut frame = uniform_frame(16, 8, 400);
        // Hole running to the right edge of the scan: only the left bound is valid
        for x in 10..16 {
            frame.set(x, 2, DEPTH_SENTINEL);
        }
        let mut filler = HoleFiller::with_seed(16, 8, 7);
        filler.fill(&mut frame);
        // Columns inside the vertical scan get the one-sided fill
        for x in 10..12 {
            let v = frame.get(x, 2) as i32;
            assert!((400 - FILL_JITTER..=400 + FILL_JITTER).contains(&v));
        }
        // The col_tail columns are never visited by the vertical pass,
        // so the max merge keeps them sentinel.
        for x in 12..16 {
            assert_eq!(frame.get(x, 2), DEPTH_SENTINEL);
        }
    }

    #[test]
    fn test_hole_spanning_whole_frame_left_unfilled() {
        let mut frame = DepthFrame::new(16, 8);
        let before = frame.clone();
        let mut filler = HoleFiller::with_seed(16, 8, 7);
        filler.fill(&mut frame);
        assert_eq!(frame, before, "no valid bound anywhere, nothing to fill");
    }

    #[test]
    fn test_merge_prefers_farther_pass() {
        let mut frame = uniform_frame(16, 16, 300);
        // A hole whose row bounds are near (300) but whose column bounds are far
        frame.set(5, 4, 1200);
        frame.set(5, 8, 1200);
        for y in 5..8 {
            frame.set(5, y, DEPTH_SENTINEL);
        }
        let mut filler = HoleFiller::with_seed(16, 16, 7);
        filler.fill(&mut frame);
        for y in 5..8 {
            let v = frame.get(5, y) as i32;
            assert!(
                (1200 - FILL_JITTER..=1200 + FILL_JITTER).contains(&v),
                "vertical far fill must win the merge, got {}",
                v
            );
        }
    }

    #[test]
    fn test_filled_values_stay_in_depth_domain() {
        let mut frame = uniform_frame(16, 8, 2046);
        for x in 4..=7 {
            frame.set(x, 3, DEPTH_SENTINEL);
        }
        let mut filler = HoleFiller::with_seed(16, 8, 11);
        filler.fill(&mut frame);
        assert!(frame.as_slice().iter().all(|&v| v <= DEPTH_SENTINEL));
    }
}
