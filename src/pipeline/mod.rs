// SPDX-License-Identifier: GPL-3.0-only

//! The depth-frame processing pipeline
//!
//! [`FrameProcessor::process`] runs the whole per-frame transformation
//! in a fixed stage order: trail push, hole filling, compositing,
//! noise filtering, the optional style stages, gradient synthesis,
//! colorization, outline/fog compositing, publish. It executes
//! synchronously in the depth source's delivery context and must
//! finish well inside one frame period; nothing on this path
//! allocates or fails.
//!
//! The finished frame is handed to the presentation side through
//! [`FrameSlot`], a mutex-guarded single-value exchange: latest wins,
//! slow consumers drop intermediate frames, slow producers cost the
//! consumer nothing but a redraw of the previous frame.

pub mod edges;
pub mod gradient;
pub mod inpaint;
pub mod median;
pub mod temporal;
pub mod types;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, trace};

use crate::config::{OutlineStyle, PipelineConfig};
use crate::constants::{
    DEPTH_SENTINEL, FOG_DEPTH, TRAIL_STRIDE, WORKING_HEIGHT, WORKING_WIDTH,
};
use edges::EdgeExtractor;
use gradient::{GradientPhase, GradientSet, Rgb, GRADIENT_SIZE, THEMES};
use inpaint::HoleFiller;
use median::NoiseFilter;
use temporal::TrailRing;
use types::{DepthFrame, EdgeMap, RgbFrame};

/// Interior region the colorizer writes
///
/// Pixels outside it keep whatever the previous frame produced. The
/// defaults are asymmetric on purpose, cropping a few more columns on
/// the right where sensor shadows cluster.
#[derive(Debug, Clone, Copy)]
pub struct ColorizeMargins {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
}

impl Default for ColorizeMargins {
    fn default() -> Self {
        Self {
            left: 2,
            right: 5,
            top: 1,
            bottom: 1,
        }
    }
}

/// Mutex-guarded single-slot frame hand-off
///
/// Not a queue: the producer overwrites, the consumer takes at its own
/// cadence, and neither ever blocks beyond the mutex hold time.
pub struct FrameSlot {
    inner: Mutex<SlotState>,
}

struct SlotState {
    frame: RgbFrame,
    dirty: bool,
}

impl FrameSlot {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            inner: Mutex::new(SlotState {
                frame: RgbFrame::new(width, height),
                dirty: false,
            }),
        }
    }

    /// Copy a finished frame into the slot and mark it fresh
    fn publish(&self, frame: &RgbFrame) {
        if let Ok(mut state) = self.inner.lock() {
            state.frame.as_mut_slice().copy_from_slice(frame.as_slice());
            state.dirty = true;
        }
    }

    /// Swap the latest finished frame into `out` if one is pending
    ///
    /// Returns false (leaving `out` untouched) when nothing new was
    /// published since the last take.
    pub fn try_take_latest(&self, out: &mut RgbFrame) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            return false;
        };
        if !state.dirty {
            return false;
        }
        std::mem::swap(&mut state.frame, out);
        state.dirty = false;
        true
    }

    /// Owned variant used off the hot path (snapshot capture)
    pub fn try_take_latest_frame(&self) -> Option<RgbFrame> {
        let Ok(mut state) = self.inner.lock() else {
            return None;
        };
        if !state.dirty {
            return None;
        }
        state.dirty = false;
        Some(state.frame.clone())
    }
}

/// Per-frame pipeline state and scratch buffers
///
/// All buffers are sized at construction; `process` is allocation-free.
pub struct FrameProcessor {
    config: Arc<Mutex<PipelineConfig>>,
    slot: Arc<FrameSlot>,
    ring: TrailRing,
    filler: HoleFiller,
    noise: NoiseFilter,
    edges: EdgeExtractor,
    edge_map: EdgeMap,
    sets: Vec<GradientSet>,
    built_period_index: usize,
    phase: GradientPhase,
    response: Vec<u16>,
    combined: Vec<Rgb>,
    proc_depth: DepthFrame,
    output: RgbFrame,
    blur_scratch: Vec<u16>,
    margins: ColorizeMargins,
    last_frame_at: Option<Instant>,
    frames_processed: u64,
}

impl FrameProcessor {
    pub fn new(config: Arc<Mutex<PipelineConfig>>, slot: Arc<FrameSlot>) -> Self {
        let width = WORKING_WIDTH;
        let height = WORKING_HEIGHT;
        let period_index = config
            .lock()
            .map(|c| c.period_index())
            .unwrap_or(crate::constants::DEFAULT_PERIOD_INDEX);
        let period = crate::constants::GRADIENT_PERIODS[period_index];
        let sets = THEMES.iter().map(|t| t.build(period)).collect();

        debug!(width, height, "frame processor ready");
        Self {
            config,
            slot,
            ring: TrailRing::new(width, height),
            filler: HoleFiller::new(width, height),
            noise: NoiseFilter::new(width, height),
            edges: EdgeExtractor::new(width, height),
            edge_map: EdgeMap::new(width, height),
            sets,
            built_period_index: period_index,
            phase: GradientPhase::default(),
            response: gradient::response_curve(),
            combined: vec![[0u8; 3]; GRADIENT_SIZE],
            proc_depth: DepthFrame::new(width, height),
            output: RgbFrame::new(width, height),
            blur_scratch: vec![0; width * height],
            margins: ColorizeMargins::default(),
            last_frame_at: None,
            frames_processed: 0,
        }
    }

    /// Seed the hole filler's jitter for reproducible output
    pub fn with_fill_seed(mut self, seed: u64) -> Self {
        self.filler = HoleFiller::with_seed(WORKING_WIDTH, WORKING_HEIGHT, seed);
        self
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Run the full pipeline on one native-resolution raw frame
    pub fn process(&mut self, raw: &[u16], raw_width: usize, raw_height: usize, now: Instant) {
        let started = Instant::now();
        let Ok(guard) = self.config.lock() else {
            return;
        };
        let cfg = guard.clone();
        drop(guard);

        self.ring.push(raw, raw_width, raw_height);

        if cfg.in_paint {
            self.filler.fill(self.ring.head_mut());
        }

        // Rainbow outlines come from colorizing a softened depth field,
        // so the blur runs on the newest trail buffer before compositing.
        if cfg.outline == OutlineStyle::Rainbow {
            blur_depth(self.ring.head_mut(), &mut self.blur_scratch);
        }

        self.ring
            .composite(cfg.buffer_count(), TRAIL_STRIDE, &mut self.proc_depth);

        if cfg.median_filter {
            self.noise.apply(&mut self.proc_depth);
        }

        if cfg.posterize {
            for v in self.proc_depth.as_mut_slice() {
                *v = (*v >> 3) << 3;
            }
        }

        if cfg.circular_feedback {
            self.ring.feed_back(&self.proc_depth);
        }

        let outline_map = matches!(cfg.outline, OutlineStyle::Dark | OutlineStyle::Bright);
        if outline_map {
            self.edges.extract(&self.proc_depth, &mut self.edge_map);
        }

        self.advance_gradient(&cfg, now);

        self.colorize(&cfg);

        match cfg.outline {
            OutlineStyle::Dark => self.composite_outline(&cfg, true),
            OutlineStyle::Bright => self.composite_outline(&cfg, false),
            _ => {}
        }

        if cfg.fog {
            self.apply_fog(&cfg);
        }

        self.slot.publish(&self.output);

        self.frames_processed += 1;
        if self.frames_processed % 300 == 0 {
            debug!(
                frames = self.frames_processed,
                micros = started.elapsed().as_micros() as u64,
                "pipeline pace"
            );
        } else {
            trace!(micros = started.elapsed().as_micros() as u64, "frame done");
        }
    }

    /// Advance phase offsets by elapsed time and synthesize the active
    /// gradient table for this frame
    fn advance_gradient(&mut self, cfg: &PipelineConfig, now: Instant) {
        if cfg.period_index() != self.built_period_index {
            let period = cfg.gradient_period();
            self.sets = THEMES.iter().map(|t| t.build(period)).collect();
            self.built_period_index = cfg.period_index();
            debug!(period, "gradient tables rebuilt");
        }

        let dt = match self.last_frame_at {
            Some(prev) => now.saturating_duration_since(prev).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame_at = Some(now);

        if cfg.gradient_motion {
            self.phase.advance(dt, cfg.speed_factor());
        }

        let set = &self.sets[cfg.gradient_index().min(self.sets.len() - 1)];
        gradient::combine(
            set,
            self.phase.primary_offset(),
            self.phase.secondary_offset(),
            cfg.brightness(),
            &mut self.combined,
        );
    }

    /// Map interior depth samples through the response curve and the
    /// combined gradient into the output frame
    fn colorize(&mut self, cfg: &PipelineConfig) {
        let width = self.proc_depth.width();
        let height = self.proc_depth.height();
        let m = self.margins;
        for y in m.top..height - m.bottom {
            for x in m.left..width - m.right {
                let sx = if cfg.mirror { width - 1 - x } else { x };
                let depth = self.proc_depth.get(sx, y);
                let index = self.response[depth as usize] as usize;
                self.output.set_pixel(x, y, self.combined[index]);
            }
        }
    }

    /// Darken (dark style) or gate (bright style) the colorized frame
    /// along the edge map
    fn composite_outline(&mut self, cfg: &PipelineConfig, invert: bool) {
        let width = self.output.width();
        let height = self.output.height();
        let m = self.margins;
        for y in m.top..height - m.bottom {
            for x in m.left..width - m.right {
                let sx = if cfg.mirror { width - 1 - x } else { x };
                let e = self.edge_map.get(sx, y) as u32;
                let w = if invert { 255 - e } else { e };
                let mut px = self.output.pixel(x, y);
                for c in &mut px {
                    *c = (*c as u32 * w / 255) as u8;
                }
                self.output.set_pixel(x, y, px);
            }
        }
    }

    /// Linear far-depth attenuation: untouched below the onset, black
    /// at onset + [`FOG_DEPTH`]
    fn apply_fog(&mut self, cfg: &PipelineConfig) {
        let width = self.output.width();
        let height = self.output.height();
        let m = self.margins;
        let start = cfg.fog_start();
        for y in m.top..height - m.bottom {
            for x in m.left..width - m.right {
                let sx = if cfg.mirror { width - 1 - x } else { x };
                let t = self.proc_depth.get(sx, y) as f32 / DEPTH_SENTINEL as f32;
                if t < start {
                    continue;
                }
                let keep = (1.0 - (t - start) / FOG_DEPTH).clamp(0.0, 1.0);
                let mut px = self.output.pixel(x, y);
                for c in &mut px {
                    *c = (*c as f32 * keep) as u8;
                }
                self.output.set_pixel(x, y, px);
            }
        }
    }
}

/// 3x3 binomial blur over a depth frame, clamped borders
fn blur_depth(frame: &mut DepthFrame, scratch: &mut [u16]) {
    let width = frame.width();
    let height = frame.height();
    debug_assert_eq!(scratch.len(), width * height);
    scratch.copy_from_slice(frame.as_slice());

    let sample = |sx: isize, sy: isize| -> u32 {
        let sx = sx.clamp(0, width as isize - 1) as usize;
        let sy = sy.clamp(0, height as isize - 1) as usize;
        scratch[sy * width + sx] as u32
    };

    let dst = frame.as_mut_slice();
    for y in 0..height as isize {
        for x in 0..width as isize {
            let acc = sample(x - 1, y - 1)
                + 2 * sample(x, y - 1)
                + sample(x + 1, y - 1)
                + 2 * sample(x - 1, y)
                + 4 * sample(x, y)
                + 2 * sample(x + 1, y)
                + sample(x - 1, y + 1)
                + 2 * sample(x, y + 1)
                + sample(x + 1, y + 1);
            dst[y as usize * width + x as usize] = (acc / 16) as u16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NATIVE_HEIGHT, NATIVE_WIDTH};

    fn processor_with(config: PipelineConfig) -> (FrameProcessor, Arc<FrameSlot>) {
        let config = Arc::new(Mutex::new(config));
        let slot = Arc::new(FrameSlot::new(WORKING_WIDTH, WORKING_HEIGHT));
        let processor = FrameProcessor::new(config, Arc::clone(&slot)).with_fill_seed(42);
        (processor, slot)
    }

    fn quiet_config() -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.median_filter = false;
        cfg.in_paint = false;
        cfg.gradient_motion = false;
        cfg
    }

    #[test]
    fn test_poisoned_config_builds_for_default_period() {
        let config = Arc::new(Mutex::new(PipelineConfig::default()));
        let poisoner = Arc::clone(&config);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the config lock");
        })
        .join();

        let slot = Arc::new(FrameSlot::new(WORKING_WIDTH, WORKING_HEIGHT));
        let processor = FrameProcessor::new(config, slot);
        assert_eq!(
            processor.built_period_index,
            crate::constants::DEFAULT_PERIOD_INDEX
        );
    }

    #[test]
    fn test_slot_is_latest_wins() {
        let slot = FrameSlot::new(2, 2);
        let mut a = RgbFrame::new(2, 2);
        a.set_pixel(0, 0, [1, 1, 1]);
        let mut b = RgbFrame::new(2, 2);
        b.set_pixel(0, 0, [2, 2, 2]);

        slot.publish(&a);
        slot.publish(&b);

        let mut out = RgbFrame::new(2, 2);
        assert!(slot.try_take_latest(&mut out));
        assert_eq!(out.pixel(0, 0), [2, 2, 2]);
        // Nothing new: out untouched, take reports false
        assert!(!slot.try_take_latest(&mut out));
        assert_eq!(out.pixel(0, 0), [2, 2, 2]);
    }

    #[test]
    fn test_uniform_frame_colors_interior_from_gradient() {
        let (mut processor, slot) = processor_with(quiet_config());
        let raw = vec![500u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        let now = Instant::now();
        processor.process(&raw, NATIVE_WIDTH, NATIVE_HEIGHT, now);

        let mut out = RgbFrame::new(WORKING_WIDTH, WORKING_HEIGHT);
        assert!(slot.try_take_latest(&mut out));

        // Expected color: combined gradient at the response-curve index
        // for depth 500, with zero offsets and brightness 1
        let set = THEMES[0].build(crate::constants::GRADIENT_PERIODS[2]);
        let mut combined = vec![[0u8; 3]; GRADIENT_SIZE];
        gradient::combine(&set, 0, 0, 1.0, &mut combined);
        let expected = combined[gradient::response_curve()[500] as usize];

        let m = ColorizeMargins::default();
        for y in m.top..WORKING_HEIGHT - m.bottom {
            for x in m.left..WORKING_WIDTH - m.right {
                assert_eq!(out.pixel(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
        // Border pixels were never written
        assert_eq!(out.pixel(0, 0), [0, 0, 0]);
        assert_eq!(out.pixel(WORKING_WIDTH - 1, WORKING_HEIGHT - 1), [0, 0, 0]);
    }

    #[test]
    fn test_buffer_count_clamp_observable_through_composite() {
        let mut cfg = quiet_config();
        cfg.set_buffer_count(10_000);
        assert_eq!(cfg.buffer_count(), crate::constants::MAX_TRAIL_BUFFERS);
        cfg.set_buffer_count(0);
        assert_eq!(cfg.buffer_count(), crate::constants::MIN_TRAIL_BUFFERS);

        // A near frame pushed first must vanish from the composite once
        // the clamped-down window no longer reaches it.
        let (mut processor, slot) = processor_with(cfg);
        let near = vec![100u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        let far = vec![1100u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        let now = Instant::now();
        processor.process(&near, NATIVE_WIDTH, NATIVE_HEIGHT, now);
        for _ in 0..TRAIL_STRIDE {
            processor.process(&far, NATIVE_WIDTH, NATIVE_HEIGHT, now);
        }

        let mut out = RgbFrame::new(WORKING_WIDTH, WORKING_HEIGHT);
        assert!(slot.try_take_latest(&mut out));
        let set = THEMES[0].build(crate::constants::GRADIENT_PERIODS[2]);
        let mut combined = vec![[0u8; 3]; GRADIENT_SIZE];
        gradient::combine(&set, 0, 0, 1.0, &mut combined);
        let far_color = combined[gradient::response_curve()[1100] as usize];
        assert_ne!(far_color, [0, 0, 0]);
        assert_eq!(out.pixel(10, 10), far_color);
    }

    #[test]
    fn test_mirror_flips_horizontally() {
        let mut cfg = quiet_config();
        cfg.mirror = true;
        let (mut processor, slot) = processor_with(cfg);

        // Left half near, right half far
        let mut raw = vec![1500u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        for y in 0..NATIVE_HEIGHT {
            for x in 0..NATIVE_WIDTH / 2 {
                raw[y * NATIVE_WIDTH + x] = 100;
            }
        }
        processor.process(&raw, NATIVE_WIDTH, NATIVE_HEIGHT, Instant::now());

        let mut out = RgbFrame::new(WORKING_WIDTH, WORKING_HEIGHT);
        assert!(slot.try_take_latest(&mut out));

        let set = THEMES[0].build(crate::constants::GRADIENT_PERIODS[2]);
        let mut combined = vec![[0u8; 3]; GRADIENT_SIZE];
        gradient::combine(&set, 0, 0, 1.0, &mut combined);
        let near_color = combined[gradient::response_curve()[100] as usize];
        // The near half now renders on the right
        assert_eq!(out.pixel(WORKING_WIDTH - 10, 10), near_color);
    }

    #[test]
    fn test_fog_blacks_out_far_pixels() {
        let mut cfg = quiet_config();
        cfg.fog = true;
        cfg.set_fog_start_index(0);
        let (mut processor, slot) = processor_with(cfg);

        let raw = vec![2000u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        processor.process(&raw, NATIVE_WIDTH, NATIVE_HEIGHT, Instant::now());

        let mut out = RgbFrame::new(WORKING_WIDTH, WORKING_HEIGHT);
        assert!(slot.try_take_latest(&mut out));
        // 2000/2047 is far past onset 0.25 + span 0.15: fully fogged
        assert_eq!(out.pixel(10, 10), [0, 0, 0]);
    }

    #[test]
    fn test_dark_outline_leaves_flat_regions_untouched() {
        let mut cfg = quiet_config();
        cfg.outline = OutlineStyle::Dark;
        let (mut processor, slot) = processor_with(cfg);

        let raw = vec![700u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        processor.process(&raw, NATIVE_WIDTH, NATIVE_HEIGHT, Instant::now());

        let mut out = RgbFrame::new(WORKING_WIDTH, WORKING_HEIGHT);
        assert!(slot.try_take_latest(&mut out));

        let set = THEMES[0].build(crate::constants::GRADIENT_PERIODS[2]);
        let mut combined = vec![[0u8; 3]; GRADIENT_SIZE];
        gradient::combine(&set, 0, 0, 1.0, &mut combined);
        let expected = combined[gradient::response_curve()[700] as usize];
        // Flat frame: edge map is zero, dark outline multiplies by 255/255
        assert_eq!(out.pixel(50, 50), expected);
    }

    #[test]
    fn test_blur_depth_preserves_flat_fields() {
        let mut frame = DepthFrame::new(8, 8);
        frame.as_mut_slice().fill(900);
        let mut scratch = vec![0u16; 64];
        blur_depth(&mut frame, &mut scratch);
        assert!(frame.as_slice().iter().all(|&v| v == 900));
    }
}
