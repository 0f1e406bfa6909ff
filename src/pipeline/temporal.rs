// SPDX-License-Identifier: GPL-3.0-only

//! Motion-trail compositor
//!
//! Maintains a fixed-capacity ring of downsampled historical depth
//! frames and collapses a configurable window of them into one frame by
//! per-pixel minimum (nearest point wins). Anything that was close to
//! the camera at any sampled past instant claims its pixel until it
//! ages out of the window, which is what produces the trailing ghosts.

use crate::constants::{MAX_TRAIL_BUFFERS, MIN_TRAIL_BUFFERS};
use crate::pipeline::types::DepthFrame;

/// Fixed-capacity ring of historical depth frames, newest first
///
/// The ring always holds exactly [`MAX_TRAIL_BUFFERS`] frames; pushing
/// rotates the head index so the oldest frame's storage is reused for
/// the newest sample. No allocation happens after construction.
pub struct TrailRing {
    width: usize,
    height: usize,
    frames: Vec<DepthFrame>,
    head: usize,
}

impl TrailRing {
    /// Create a ring of sentinel-filled frames at the working resolution
    pub fn new(width: usize, height: usize) -> Self {
        let frames = (0..MAX_TRAIL_BUFFERS)
            .map(|_| DepthFrame::new(width, height))
            .collect();
        Self {
            width,
            height,
            frames,
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        MAX_TRAIL_BUFFERS
    }

    /// Downsample a native-resolution frame into the ring head
    ///
    /// Each working pixel takes the minimum of its 2x2 source block,
    /// which preserves foreground edges instead of averaging them away.
    /// The previous oldest buffer becomes the new head.
    pub fn push(&mut self, raw: &[u16], raw_width: usize, raw_height: usize) {
        debug_assert_eq!(raw_width, self.width * 2);
        debug_assert_eq!(raw_height, self.height * 2);
        debug_assert_eq!(raw.len(), raw_width * raw_height);

        self.head = (self.head + MAX_TRAIL_BUFFERS - 1) % MAX_TRAIL_BUFFERS;

        let width = self.width;
        let dst = self.frames[self.head].as_mut_slice();
        for y in 0..self.height {
            let top = y * 2 * raw_width;
            let bottom = (y * 2 + 1) * raw_width;
            for x in 0..width {
                let sx = x * 2;
                let nearest = raw[top + sx]
                    .min(raw[top + sx + 1])
                    .min(raw[bottom + sx])
                    .min(raw[bottom + sx + 1]);
                dst[y * width + x] = nearest;
            }
        }
    }

    /// The newest frame in the ring
    pub fn head(&self) -> &DepthFrame {
        &self.frames[self.head]
    }

    /// Mutable access to the newest frame (hole filling and the rainbow
    /// pre-blur operate on it in place)
    pub fn head_mut(&mut self) -> &mut DepthFrame {
        &mut self.frames[self.head]
    }

    /// Frame at logical age `age` (0 = newest)
    pub fn frame(&self, age: usize) -> &DepthFrame {
        &self.frames[(self.head + age) % MAX_TRAIL_BUFFERS]
    }

    /// Collapse every `stride`-th ring frame below `count` into `out`
    /// by per-pixel minimum
    ///
    /// `count` is clamped to [2, capacity]. Age 0 is always sampled,
    /// even when `count` is smaller than `stride`.
    pub fn composite(&self, count: usize, stride: usize, out: &mut DepthFrame) {
        debug_assert!(stride >= 1);
        let count = count.clamp(MIN_TRAIL_BUFFERS, MAX_TRAIL_BUFFERS);

        out.fill_sentinel();
        let dst = out.as_mut_slice();
        let mut age = 0;
        while age < count {
            let src = self.frame(age).as_slice();
            for (d, &s) in dst.iter_mut().zip(src) {
                if s < *d {
                    *d = s;
                }
            }
            age += stride;
        }
    }

    /// Overwrite the ring head with an already-processed frame
    ///
    /// Circular feedback mode re-injects the processed frame outside
    /// the normal push path. Ring bookkeeping is deliberately left
    /// untouched, so the fed-back frame is sampled as age 0 by the next
    /// composite and then ages through the ring like any pushed frame.
    pub fn feed_back(&mut self, frame: &DepthFrame) {
        self.frames[self.head].copy_from(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEPTH_SENTINEL, TRAIL_STRIDE};

    fn raw_frame(width: usize, height: usize, value: u16) -> Vec<u16> {
        vec![value; width * height]
    }

    #[test]
    fn test_push_downsamples_by_block_minimum() {
        let mut ring = TrailRing::new(2, 2);
        // 4x4 native frame; top-left 2x2 block holds 400 as its minimum
        let mut raw = raw_frame(4, 4, 1000);
        raw[0] = 700;
        raw[1] = 400;
        raw[4] = 900;
        raw[5] = 800;
        ring.push(&raw, 4, 4);
        assert_eq!(ring.head().get(0, 0), 400);
        assert_eq!(ring.head().get(1, 1), 1000);
    }

    #[test]
    fn test_composite_takes_minimum_across_sampled_frames() {
        let mut ring = TrailRing::new(2, 2);
        // Push enough frames that ages 0 and 6 are both populated
        ring.push(&raw_frame(4, 4, 300), 4, 4); // will be age 6 after 6 more
        for _ in 0..TRAIL_STRIDE {
            ring.push(&raw_frame(4, 4, 900), 4, 4);
        }
        let mut out = DepthFrame::new(2, 2);

        // Window of 2 only admits age 0
        ring.composite(2, TRAIL_STRIDE, &mut out);
        assert!(out.as_slice().iter().all(|&v| v == 900));

        // Window of 8 admits ages 0 and 6, so the older nearer frame wins
        ring.composite(8, TRAIL_STRIDE, &mut out);
        assert!(out.as_slice().iter().all(|&v| v == 300));
    }

    #[test]
    fn test_composite_monotonic_in_buffer_count() {
        let mut ring = TrailRing::new(2, 2);
        for v in [500u16, 200, 800, 100, 650, 900, 450, 300] {
            ring.push(&raw_frame(4, 4, v), 4, 4);
        }
        let mut narrow = DepthFrame::new(2, 2);
        let mut wide = DepthFrame::new(2, 2);
        ring.composite(2, TRAIL_STRIDE, &mut narrow);
        ring.composite(8, TRAIL_STRIDE, &mut wide);
        for (w, n) in wide.as_slice().iter().zip(narrow.as_slice()) {
            assert!(w <= n, "widening the window must never raise a pixel");
        }
    }

    #[test]
    fn test_composite_clamps_buffer_count() {
        let ring = TrailRing::new(2, 2);
        let mut out = DepthFrame::new(2, 2);
        // Counts outside [2, capacity] must not panic
        ring.composite(0, TRAIL_STRIDE, &mut out);
        ring.composite(10_000, TRAIL_STRIDE, &mut out);
        assert!(out.as_slice().iter().all(|&v| v == DEPTH_SENTINEL));
    }

    #[test]
    fn test_feed_back_replaces_head_only() {
        let mut ring = TrailRing::new(2, 2);
        ring.push(&raw_frame(4, 4, 800), 4, 4);
        let mut processed = DepthFrame::new(2, 2);
        processed.as_mut_slice().fill(123);
        ring.feed_back(&processed);
        assert!(ring.head().as_slice().iter().all(|&v| v == 123));
        // A later frame is untouched
        assert!(ring.frame(1).as_slice().iter().all(|&v| v == DEPTH_SENTINEL));
    }

    #[test]
    fn test_ring_recycles_oldest_storage() {
        let mut ring = TrailRing::new(2, 2);
        for i in 0..(MAX_TRAIL_BUFFERS + 3) {
            ring.push(&raw_frame(4, 4, i as u16), 4, 4);
        }
        // Newest value is at age 0, oldest surviving at age capacity-1
        assert_eq!(
            ring.head().get(0, 0),
            (MAX_TRAIL_BUFFERS + 2) as u16
        );
        assert_eq!(ring.frame(MAX_TRAIL_BUFFERS - 1).get(0, 0), 3);
    }
}
