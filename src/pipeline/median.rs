// SPDX-License-Identifier: GPL-3.0-only

//! 3x3 median noise filter
//!
//! Depth sensors speckle; a median over the 3x3 neighborhood removes
//! single-pixel outliers without softening edges the way a blur would.
//! Median selection uses a fixed 19-step compare-exchange network
//! (John L. Smith, XCELL vol. 23) instead of a full sort: only the
//! middle slot is guaranteed sorted, and only the middle slot is read.

use crate::pipeline::types::DepthFrame;

/// In-place median filter with a preallocated input snapshot
///
/// Neighborhoods are sampled from a snapshot of the input frame, so
/// every output sample is the true median of its original neighborhood
/// regardless of scan order. The 1-pixel border is left untouched.
pub struct NoiseFilter {
    snapshot: DepthFrame,
}

impl NoiseFilter {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            snapshot: DepthFrame::new(width, height),
        }
    }

    pub fn apply(&mut self, frame: &mut DepthFrame) {
        self.snapshot.copy_from(frame);
        let width = frame.width();
        let height = frame.height();
        let src = self.snapshot.as_slice();
        let dst = frame.as_mut_slice();

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let i = y * width + x;
                let mut window = [
                    src[i],
                    src[i - 1],
                    src[i + 1],
                    src[i - 1 - width],
                    src[i - width],
                    src[i + 1 - width],
                    src[i - 1 + width],
                    src[i + width],
                    src[i + 1 + width],
                ];
                dst[i] = median9(&mut window);
            }
        }
    }
}

#[inline]
fn sort2(p: &mut [u16; 9], a: usize, b: usize) {
    if p[a] > p[b] {
        p.swap(a, b);
    }
}

/// Median of 9 values via a fixed compare-exchange sequence
///
/// Leaves the median in slot 4; the other slots end up only partially
/// ordered, which is fine because nothing reads them.
#[inline]
fn median9(p: &mut [u16; 9]) -> u16 {
    sort2(p, 1, 2);
    sort2(p, 4, 5);
    sort2(p, 7, 8);
    sort2(p, 0, 1);
    sort2(p, 3, 4);
    sort2(p, 6, 7);
    sort2(p, 1, 2);
    sort2(p, 4, 5);
    sort2(p, 7, 8);
    sort2(p, 0, 3);
    sort2(p, 5, 8);
    sort2(p, 4, 7);
    sort2(p, 3, 6);
    sort2(p, 1, 4);
    sort2(p, 2, 5);
    sort2(p, 4, 7);
    sort2(p, 4, 2);
    sort2(p, 6, 4);
    sort2(p, 4, 2);
    p[4]
}
