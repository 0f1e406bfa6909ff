// SPDX-License-Identifier: GPL-3.0-only

//! Procedural color-gradient synthesis
//!
//! Each named theme carries two keyframe palettes. At startup both are
//! expanded into 2048-entry RGB lookup tables; at render time the two
//! tables drift against each other (phase offsets advancing with wall
//! clock x speed factor) and are combined by saturating channel-wise
//! subtraction into the single active table for the frame. Depth
//! samples index that table through a cubic response curve that spends
//! most of the palette on near-camera depths, where the motion is.

use crate::constants::{
    DEPTH_RANGE, GRADIENT_RATE_PRIMARY, GRADIENT_RATE_SECONDARY,
};

/// One RGB entry of a gradient table
pub type Rgb = [u8; 3];

/// Number of entries in every gradient table (one per depth bucket)
pub const GRADIENT_SIZE: usize = DEPTH_RANGE;

/// A named pair of gradient tables plus the period they were built with
#[derive(Debug, Clone)]
pub struct GradientSet {
    pub name: &'static str,
    pub primary: Vec<Rgb>,
    pub secondary: Vec<Rgb>,
}

/// Static definition of a color theme: two keyframe lists and the
/// fraction of the normalized depth range one pass of each list spans
/// at period factor 1.0.
#[derive(Debug, Clone, Copy)]
pub struct GradientTheme {
    pub name: &'static str,
    pub primary: &'static [Rgb],
    pub primary_span: f32,
    pub secondary: &'static [Rgb],
    pub secondary_span: f32,
    /// Repeat the keyframe list past its span instead of falling back
    /// to the background color
    pub repeat: bool,
    pub background: Rgb,
}

impl GradientTheme {
    /// Expand both keyframe lists into lookup tables
    ///
    /// `period_factor` scales the spans, stretching or compressing how
    /// much depth one pass of the palette covers.
    pub fn build(&self, period_factor: f32) -> GradientSet {
        GradientSet {
            name: self.name,
            primary: build_table(
                self.primary,
                self.primary_span * period_factor,
                self.repeat,
                self.background,
            ),
            secondary: build_table(
                self.secondary,
                self.secondary_span * period_factor,
                self.repeat,
                self.background,
            ),
        }
    }
}

const K: Rgb = [0, 0, 0];

/// The classic floor theme: saturated hues alternating with black so
/// the subtracted pair produces sweeping bands.
static RAVE_PRIMARY: [Rgb; 17] = [
    K,
    [255, 0, 255],
    K,
    [0, 255, 255],
    K,
    [255, 255, 0],
    K,
    [0, 255, 128],
    K,
    [255, 128, 0],
    K,
    [128, 255, 0],
    K,
    [255, 0, 128],
    K,
    [0, 128, 255],
    K,
];

static RAVE_SECONDARY: [Rgb; 17] = [
    K,
    [128, 0, 0],
    K,
    [128, 128, 0],
    K,
    [0, 0, 128],
    K,
    [0, 128, 0],
    K,
    [128, 0, 128],
    K,
    [0, 128, 128],
    K,
    [0, 0, 255],
    K,
    [255, 0, 0],
    K,
];

static EMBER_PRIMARY: [Rgb; 9] = [
    K,
    [255, 32, 0],
    [255, 128, 0],
    K,
    [255, 64, 0],
    [255, 192, 64],
    K,
    [200, 0, 0],
    K,
];

static EMBER_SECONDARY: [Rgb; 5] = [K, [64, 0, 0], K, [0, 0, 64], K];

static OCEAN_PRIMARY: [Rgb; 9] = [
    K,
    [0, 64, 255],
    [0, 255, 192],
    K,
    [0, 128, 255],
    [64, 255, 255],
    K,
    [0, 0, 200],
    K,
];

static OCEAN_SECONDARY: [Rgb; 5] = [K, [0, 0, 96], K, [0, 64, 0], K];

static MONO_PRIMARY: [Rgb; 5] = [K, [255, 255, 255], K, [160, 160, 160], K];

static MONO_SECONDARY: [Rgb; 3] = [K, [80, 80, 80], K];

/// Built-in color themes, selectable by index
pub static THEMES: [GradientTheme; 4] = [
    GradientTheme {
        name: "rave",
        primary: &RAVE_PRIMARY,
        primary_span: 0.9375,
        secondary: &RAVE_SECONDARY,
        secondary_span: 0.6016,
        repeat: false,
        background: K,
    },
    GradientTheme {
        name: "ember",
        primary: &EMBER_PRIMARY,
        primary_span: 0.85,
        secondary: &EMBER_SECONDARY,
        secondary_span: 0.55,
        repeat: true,
        background: K,
    },
    GradientTheme {
        name: "ocean",
        primary: &OCEAN_PRIMARY,
        primary_span: 0.85,
        secondary: &OCEAN_SECONDARY,
        secondary_span: 0.5,
        repeat: true,
        background: K,
    },
    GradientTheme {
        name: "mono",
        primary: &MONO_PRIMARY,
        primary_span: 0.9,
        secondary: &MONO_SECONDARY,
        secondary_span: 0.45,
        repeat: false,
        background: K,
    },
];

/// Expand a keyframe list into a [`GRADIENT_SIZE`]-entry table
///
/// `span` is the fraction of the normalized depth range one pass of the
/// list covers. Buckets past the span either wrap (repeat) or take the
/// background color; the explicit background avoids a wraparound seam
/// at the top of the range.
pub fn build_table(keyframes: &[Rgb], span: f32, repeat: bool, background: Rgb) -> Vec<Rgb> {
    let mut table = vec![background; GRADIENT_SIZE];
    if keyframes.is_empty() || span <= 0.0 {
        return table;
    }
    if keyframes.len() == 1 {
        for (i, entry) in table.iter_mut().enumerate() {
            let p = i as f32 / GRADIENT_SIZE as f32 / span;
            if repeat || p < 1.0 {
                *entry = keyframes[0];
            }
        }
        return table;
    }

    let segments = (keyframes.len() - 1) as f32;
    for (i, entry) in table.iter_mut().enumerate() {
        let mut p = i as f32 / GRADIENT_SIZE as f32 / span;
        if p >= 1.0 {
            if !repeat {
                continue;
            }
            p = p.fract();
        }
        let pos = p * segments;
        let k = (pos as usize).min(keyframes.len() - 2);
        let t = pos - k as f32;
        *entry = lerp(keyframes[k], keyframes[k + 1], t);
    }
    table
}

#[inline]
fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let mix = |a: u8, b: u8| -> u8 { (a as f32 + (b as f32 - a as f32) * t) as u8 };
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Time-based phase offsets of the two tables
///
/// Offsets are kept as floats and advanced by elapsed time so the
/// animation speed is independent of the frame rate; they wrap at the
/// table size. The primary drifts down-table, the secondary up.
#[derive(Debug, Clone, Copy, Default)]
pub struct GradientPhase {
    primary: f32,
    secondary: f32,
}

impl GradientPhase {
    pub fn advance(&mut self, dt_secs: f32, speed: f32) {
        let size = GRADIENT_SIZE as f32;
        self.primary = (self.primary - GRADIENT_RATE_PRIMARY * dt_secs * speed).rem_euclid(size);
        self.secondary =
            (self.secondary + GRADIENT_RATE_SECONDARY * dt_secs * speed).rem_euclid(size);
    }

    pub fn primary_offset(&self) -> usize {
        self.primary as usize % GRADIENT_SIZE
    }

    pub fn secondary_offset(&self) -> usize {
        self.secondary as usize % GRADIENT_SIZE
    }
}

/// Synthesize the active table for one frame
///
/// Per entry: primary (at its offset) minus secondary (at its offset),
/// saturating at zero, then dimmed by the brightness divisor. A
/// brightness of 1.0 passes colors through unchanged; the divisor never
/// amplifies.
pub fn combine(
    set: &GradientSet,
    primary_offset: usize,
    secondary_offset: usize,
    brightness: f32,
    out: &mut [Rgb],
) {
    debug_assert_eq!(out.len(), GRADIENT_SIZE);
    let brightness = brightness.max(1.0);
    for (i, entry) in out.iter_mut().enumerate() {
        let p = set.primary[(i + primary_offset) % GRADIENT_SIZE];
        let s = set.secondary[(i + secondary_offset) % GRADIENT_SIZE];
        for c in 0..3 {
            let diff = p[c].saturating_sub(s[c]);
            entry[c] = (diff as f32 / brightness) as u8;
        }
    }
}

/// Cubic response curve mapping depth samples to table indices
///
/// Compresses near-camera depth differences into a larger share of the
/// palette; far depths saturate at the top of the table.
pub fn response_curve() -> Vec<u16> {
    const GAIN: f32 = 36.0 * 256.0;
    (0..DEPTH_RANGE)
        .map(|i| {
            let v = i as f32 / DEPTH_RANGE as f32;
            let scaled = v * v * v * GAIN;
            (scaled as usize).min(DEPTH_RANGE - 1) as u16
        })
        .collect()
}
