// SPDX-License-Identifier: GPL-3.0-only

//! Depth frame sources
//!
//! A source owns its own capture thread and pushes raw 11-bit depth
//! frames into a sink callback at its native cadence. The pipeline runs
//! inside the sink, so back-pressure is the source's problem: a slow
//! sink simply delays the next frame.
//!
//! Peripheral controls (LED, tilt motor) are part of the trait because
//! every physical depth sensor in this class has them; sources without
//! the hardware accept the calls as no-ops.

pub mod synthetic;

use std::time::Instant;

use crate::errors::SourceError;

/// One raw frame as delivered by a sensor
///
/// Depth values occupy the low 11 bits; 2047 marks a missing reading.
pub struct RawDepthFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u16>,
    pub captured_at: Instant,
}

/// Callback the source invokes for every captured frame
///
/// Runs on the source's capture thread.
pub type FrameSink = Box<dyn FnMut(&RawDepthFrame) + Send>;

/// Indicator LED states common to depth sensors of this class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    Off,
    Green,
    Red,
    BlinkingGreen,
}

/// A depth sensor (or stand-in) that streams frames to a sink
pub trait DepthSource: Send {
    /// Begin capture; frames flow into `sink` until `stop`
    fn start(&mut self, sink: FrameSink) -> Result<(), SourceError>;

    /// End capture and join the capture thread
    fn stop(&mut self);

    /// Set the indicator LED; no-op where there is no LED
    fn set_led(&mut self, state: LedState) -> Result<(), SourceError>;

    /// Tilt the sensor head, in degrees from level
    fn set_tilt(&mut self, degrees: i8) -> Result<(), SourceError>;
}
