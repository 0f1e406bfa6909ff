// SPDX-License-Identifier: GPL-3.0-only

//! Fixed-size frame buffers shared by the pipeline stages
//!
//! All buffers are allocated once at startup and reused for the life of
//! the process; the hot path never allocates.

use crate::constants::DEPTH_SENTINEL;

/// A row-major grid of 11-bit depth samples (0..=2047)
///
/// 2047 is the sentinel for "no valid reading".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthFrame {
    width: usize,
    height: usize,
    data: Vec<u16>,
}

impl DepthFrame {
    /// Create a frame with every sample set to the sentinel value
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![DEPTH_SENTINEL; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u16] {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: u16) {
        self.data[y * self.width + x] = value;
    }

    /// Overwrite this frame's samples from another frame of the same size
    pub fn copy_from(&mut self, other: &DepthFrame) {
        debug_assert_eq!(self.data.len(), other.data.len());
        self.data.copy_from_slice(&other.data);
    }

    /// Reset every sample to the sentinel value
    pub fn fill_sentinel(&mut self) {
        self.data.fill(DEPTH_SENTINEL);
    }
}

/// A row-major grid of 8-bit RGB pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RgbFrame {
    /// Create an all-black frame
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let i = (y * self.width + x) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let i = (y * self.width + x) * 3;
        self.data[i] = rgb[0];
        self.data[i + 1] = rgb[1];
        self.data[i + 2] = rgb[2];
    }
}

/// A single-channel 8-bit edge magnitude image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeMap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl EdgeMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_frame_starts_as_sentinel() {
        let frame = DepthFrame::new(8, 4);
        assert!(frame.as_slice().iter().all(|&v| v == DEPTH_SENTINEL));
    }

    #[test]
    fn test_depth_frame_indexing_is_row_major() {
        let mut frame = DepthFrame::new(8, 4);
        frame.set(3, 2, 500);
        assert_eq!(frame.as_slice()[2 * 8 + 3], 500);
        assert_eq!(frame.get(3, 2), 500);
    }

    #[test]
    fn test_rgb_frame_pixel_roundtrip() {
        let mut frame = RgbFrame::new(4, 4);
        frame.set_pixel(1, 3, [10, 20, 30]);
        assert_eq!(frame.pixel(1, 3), [10, 20, 30]);
        assert_eq!(frame.pixel(0, 0), [0, 0, 0]);
    }
}
