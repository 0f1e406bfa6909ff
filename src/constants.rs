// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants and discrete tuning tables

/// Native depth sensor resolution (what the source delivers)
pub const NATIVE_WIDTH: usize = 640;
pub const NATIVE_HEIGHT: usize = 480;

/// Working resolution of the pipeline (2x2-min downsample of native)
pub const WORKING_WIDTH: usize = 320;
pub const WORKING_HEIGHT: usize = 240;

/// Number of entries in the 11-bit depth domain
pub const DEPTH_RANGE: usize = 2048;

/// Sensor value meaning "no valid reading" (out of range or shadowed)
pub const DEPTH_SENTINEL: u16 = 2047;

/// Capacity of the motion-trail ring
pub const MAX_TRAIL_BUFFERS: usize = 45;

/// Minimum number of trail buffers the compositor will collapse
pub const MIN_TRAIL_BUFFERS: usize = 2;

/// Sampling cadence through the trail ring: every Nth buffer is
/// composited, spreading the visible trail across the full ring depth
/// without scanning all 45 buffers each frame.
pub const TRAIL_STRIDE: usize = 6;

/// Symmetric jitter bound applied to in-painted samples so filled
/// regions don't render visibly flat.
pub const FILL_JITTER: i32 = 5;

/// Gradient phase advance in table entries per second at speed 1.0.
/// The primary table drifts one way, the secondary the other, so the
/// combined palette never settles.
pub const GRADIENT_RATE_PRIMARY: f32 = 90.0;
pub const GRADIENT_RATE_SECONDARY: f32 = 150.0;

/// Number of self-amplifying doublings applied to the raw edge
/// magnitude before normalization.
pub const EDGE_AMPLIFY_PASSES: u32 = 3;

/// Relative weights of the horizontal and vertical gradient magnitudes
/// in the edge map.
pub const EDGE_WEIGHT_X: u32 = 1;
pub const EDGE_WEIGHT_Y: u32 = 1;

/// Brightness divisor bounds: the factor never amplifies below 1.0.
pub const BRIGHTNESS_MIN: f32 = 1.0;
pub const BRIGHTNESS_MAX: f32 = 100.0;

/// Discrete speed multipliers for gradient animation, slowest first
pub const SPEED_FACTORS: [f32; 5] = [0.25, 0.5, 1.0, 2.0, 4.0];

/// Index into [`SPEED_FACTORS`] selected at startup
pub const DEFAULT_SPEED_INDEX: usize = 2;

/// Discrete gradient repetition periods (fraction of the normalized
/// depth range one pass of the keyframe list spans)
pub const GRADIENT_PERIODS: [f32; 4] = [0.25, 0.5, 1.0, 2.0];

/// Index into [`GRADIENT_PERIODS`] selected at startup
pub const DEFAULT_PERIOD_INDEX: usize = 2;

/// Discrete fog onset points (normalized depth), nearest first
pub const FOG_STARTS: [f32; 5] = [0.25, 0.4, 0.55, 0.7, 0.85];

/// Index into [`FOG_STARTS`] selected at startup
pub const DEFAULT_FOG_START_INDEX: usize = 2;

/// Normalized depth span over which fog attenuation falls to zero
pub const FOG_DEPTH: f32 = 0.15;

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_resolution_is_half_native() {
        assert_eq!(NATIVE_WIDTH, WORKING_WIDTH * 2);
        assert_eq!(NATIVE_HEIGHT, WORKING_HEIGHT * 2);
    }

    #[test]
    fn test_option_lists_are_ordered() {
        assert!(SPEED_FACTORS.windows(2).all(|w| w[0] < w[1]));
        assert!(GRADIENT_PERIODS.windows(2).all(|w| w[0] < w[1]));
        assert!(FOG_STARTS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_default_indices_in_range() {
        assert!(DEFAULT_SPEED_INDEX < SPEED_FACTORS.len());
        assert!(DEFAULT_PERIOD_INDEX < GRADIENT_PERIODS.len());
        assert!(DEFAULT_FOG_START_INDEX < FOG_STARTS.len());
    }
}
