// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline configuration
//!
//! All tunable parameters live in one value type. The frame processor
//! clones it once per frame under the shared mutex, so a frame is never
//! processed against a half-updated configuration. Every externally
//! settable value is range-clamped here at the boundary; invalid input
//! is silently pulled to the nearest legal value, never an error.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{
    BRIGHTNESS_MAX, BRIGHTNESS_MIN, DEFAULT_FOG_START_INDEX, DEFAULT_PERIOD_INDEX,
    DEFAULT_SPEED_INDEX, FOG_STARTS, GRADIENT_PERIODS, MAX_TRAIL_BUFFERS, MIN_TRAIL_BUFFERS,
    SPEED_FACTORS,
};
use crate::errors::{AppError, AppResult};
use crate::pipeline::gradient::THEMES;

/// Edge-map compositing mode layered onto the colorized frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutlineStyle {
    /// No outline compositing
    #[default]
    None,
    /// Pre-blur the depth map before compositing for smooth color bands
    Rainbow,
    /// Multiply the output by the edge map (edges glow, flats go dark)
    Bright,
    /// Multiply the output by the inverted edge map (dark contour lines)
    Dark,
}

impl OutlineStyle {
    /// All styles in cycle order
    pub const ALL: [OutlineStyle; 4] = [
        OutlineStyle::None,
        OutlineStyle::Rainbow,
        OutlineStyle::Bright,
        OutlineStyle::Dark,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            OutlineStyle::None => "none",
            OutlineStyle::Rainbow => "rainbow",
            OutlineStyle::Bright => "bright",
            OutlineStyle::Dark => "dark",
        }
    }

    /// The next style in cycle order, wrapping
    pub fn next(&self) -> OutlineStyle {
        let i = Self::ALL.iter().position(|s| s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// The mutable parameter set read by the frame processor once per frame
///
/// Plain toggles are public; everything with a legal range goes through
/// clamping setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 3x3 median noise filter
    pub median_filter: bool,
    /// Hole filling of sentinel runs
    pub in_paint: bool,
    /// Gradient phase animation
    pub gradient_motion: bool,
    /// Quantize depth to 256 levels for a banding effect
    pub posterize: bool,
    /// Re-inject the processed frame as the newest trail buffer
    pub circular_feedback: bool,
    /// Mirror the output horizontally
    pub mirror: bool,
    /// Attenuate far pixels to black
    pub fog: bool,
    /// Outline compositing style
    pub outline: OutlineStyle,
    gradient_index: usize,
    speed_index: usize,
    period_index: usize,
    fog_start_index: usize,
    buffer_count: usize,
    brightness: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            median_filter: true,
            in_paint: true,
            gradient_motion: true,
            posterize: false,
            circular_feedback: false,
            mirror: false,
            fog: false,
            outline: OutlineStyle::None,
            gradient_index: 0,
            speed_index: DEFAULT_SPEED_INDEX,
            period_index: DEFAULT_PERIOD_INDEX,
            fog_start_index: DEFAULT_FOG_START_INDEX,
            buffer_count: MAX_TRAIL_BUFFERS,
            brightness: BRIGHTNESS_MIN,
        }
    }
}

impl PipelineConfig {
    pub fn gradient_index(&self) -> usize {
        self.gradient_index
    }

    pub fn set_gradient_index(&mut self, index: usize) {
        self.gradient_index = index.min(THEMES.len() - 1);
    }

    pub fn speed_index(&self) -> usize {
        self.speed_index
    }

    pub fn set_speed_index(&mut self, index: usize) {
        self.speed_index = index.min(SPEED_FACTORS.len() - 1);
    }

    /// The resolved speed multiplier
    pub fn speed_factor(&self) -> f32 {
        SPEED_FACTORS[self.speed_index]
    }

    pub fn period_index(&self) -> usize {
        self.period_index
    }

    pub fn set_period_index(&mut self, index: usize) {
        self.period_index = index.min(GRADIENT_PERIODS.len() - 1);
    }

    /// The resolved gradient period factor
    pub fn gradient_period(&self) -> f32 {
        GRADIENT_PERIODS[self.period_index]
    }

    pub fn fog_start_index(&self) -> usize {
        self.fog_start_index
    }

    pub fn set_fog_start_index(&mut self, index: usize) {
        self.fog_start_index = index.min(FOG_STARTS.len() - 1);
    }

    /// The resolved normalized fog onset depth
    pub fn fog_start(&self) -> f32 {
        FOG_STARTS[self.fog_start_index]
    }

    pub fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    pub fn set_buffer_count(&mut self, count: usize) {
        self.buffer_count = count.clamp(MIN_TRAIL_BUFFERS, MAX_TRAIL_BUFFERS);
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn set_brightness(&mut self, factor: f32) {
        self.brightness = factor.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
    }

    /// Re-clamp every ranged field
    ///
    /// Deserialized configs (preset files) bypass the setters, so they
    /// are pulled back into range here before use.
    pub fn sanitize(&mut self) {
        self.set_gradient_index(self.gradient_index);
        self.set_speed_index(self.speed_index);
        self.set_period_index(self.period_index);
        self.set_fog_start_index(self.fog_start_index);
        self.set_buffer_count(self.buffer_count);
        self.set_brightness(self.brightness);
    }
}

/// A named, atomically-applied configuration bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub config: PipelineConfig,
}

/// The presets that ship with the program
pub fn builtin_presets() -> Vec<Preset> {
    let mut presets = Vec::new();

    presets.push(Preset {
        name: "classic".to_string(),
        config: PipelineConfig::default(),
    });

    let mut ghost = PipelineConfig::default();
    ghost.circular_feedback = true;
    ghost.fog = true;
    ghost.set_fog_start_index(1);
    ghost.set_speed_index(1);
    presets.push(Preset {
        name: "ghost".to_string(),
        config: ghost,
    });

    let mut strobe = PipelineConfig::default();
    strobe.posterize = true;
    strobe.outline = OutlineStyle::Dark;
    strobe.set_speed_index(SPEED_FACTORS.len() - 1);
    strobe.set_buffer_count(8);
    presets.push(Preset {
        name: "strobe".to_string(),
        config: strobe,
    });

    let mut contour = PipelineConfig::default();
    contour.outline = OutlineStyle::Rainbow;
    contour.set_gradient_index(2);
    contour.set_period_index(1);
    presets.push(Preset {
        name: "contour".to_string(),
        config: contour,
    });

    let mut minimal = PipelineConfig::default();
    minimal.median_filter = false;
    minimal.in_paint = false;
    minimal.gradient_motion = false;
    minimal.set_buffer_count(MIN_TRAIL_BUFFERS);
    presets.push(Preset {
        name: "minimal".to_string(),
        config: minimal,
    });

    presets
}

/// Load additional presets from a JSON file
///
/// Ranged values in the file are clamped, not rejected.
pub fn load_preset_file(path: &Path) -> AppResult<Vec<Preset>> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
    let mut presets: Vec<Preset> = serde_json::from_str(&data)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
    for preset in &mut presets {
        preset.config.sanitize();
    }
    Ok(presets)
}
