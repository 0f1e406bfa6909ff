// SPDX-License-Identifier: GPL-3.0-only

//! Dancefloor - a depth-camera dance-floor visualizer
//!
//! Turns a stream of raw 11-bit depth frames into animated motion-trail
//! imagery: recent frames are min-composited into trails, sensor
//! dropouts are in-painted, noise is median-filtered, and the result is
//! colorized through drifting procedural gradients with optional
//! posterize, outline, mirror and fog treatments.
//!
//! # Architecture
//!
//! - [`pipeline`]: the per-frame processing stages and the frame
//!   hand-off slot
//! - [`sources`]: depth frame sources (currently the synthetic scene)
//! - [`config`]: the tunable parameter set, presets and preset files
//! - [`control`]: configuration commands and timed preset events
//! - [`terminal`]: the interactive terminal viewer
//!
//! The pipeline runs on the source's capture thread and publishes
//! finished frames into a single mutex-guarded slot; presentation takes
//! the latest frame at its own pace.

pub mod cli;
pub mod config;
pub mod constants;
pub mod control;
pub mod errors;
pub mod pipeline;
pub mod sources;
pub mod terminal;

// Re-export commonly used types
pub use config::{OutlineStyle, PipelineConfig, Preset, builtin_presets};
pub use control::{ControlAction, PresetEvent, PresetScheduler};
pub use errors::{AppError, AppResult};
pub use pipeline::{FrameProcessor, FrameSlot};
