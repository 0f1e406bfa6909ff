// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic depth source
//!
//! Streams a procedurally generated scene at a fixed cadence: a back
//! wall, a floor plane, and three dancers (elliptical blobs on
//! independent sinusoidal paths) with the sensor artifacts the pipeline
//! exists to handle, namely shadow bands of sentinel values beside each
//! dancer and random speckle dropout. Frame content is a pure function
//! of the frame index, so captures are reproducible given a seed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::constants::{DEPTH_SENTINEL, NATIVE_HEIGHT, NATIVE_WIDTH};
use crate::errors::SourceError;
use crate::sources::{DepthSource, FrameSink, LedState, RawDepthFrame};

/// Frames per second the synthetic sensor delivers
const FRAME_RATE: f64 = 30.0;

/// Fraction of pixels dropped to the sentinel each frame
const SPECKLE_RATE: f64 = 0.002;

struct Dancer {
    center_x: f64,
    center_y: f64,
    radius_x: f64,
    radius_y: f64,
    orbit_x: f64,
    orbit_y: f64,
    rate: f64,
    depth: u16,
}

const DANCERS: [Dancer; 3] = [
    Dancer {
        center_x: 0.35,
        center_y: 0.55,
        radius_x: 0.09,
        radius_y: 0.22,
        orbit_x: 0.18,
        orbit_y: 0.05,
        rate: 0.9,
        depth: 520,
    },
    Dancer {
        center_x: 0.62,
        center_y: 0.5,
        radius_x: 0.07,
        radius_y: 0.19,
        orbit_x: 0.12,
        orbit_y: 0.08,
        rate: 1.4,
        depth: 760,
    },
    Dancer {
        center_x: 0.5,
        center_y: 0.62,
        radius_x: 0.05,
        radius_y: 0.14,
        orbit_x: 0.25,
        orbit_y: 0.03,
        rate: 0.6,
        depth: 980,
    },
];

/// Render one scene frame into `data`
///
/// Pure function of `index` apart from the speckle drawn from `rng`;
/// pass a seeded generator for reproducible frames.
pub fn render_scene(index: u64, data: &mut [u16], width: usize, height: usize, rng: &mut SmallRng) {
    debug_assert_eq!(data.len(), width * height);
    let t = index as f64 / FRAME_RATE;

    // Back wall with a gentle horizontal depth ramp, floor rising
    // toward the camera at the bottom of the frame.
    for y in 0..height {
        let fy = y as f64 / height as f64;
        for x in 0..width {
            let fx = x as f64 / width as f64;
            let wall = 1500.0 + 200.0 * fx;
            let floor = 1900.0 - 1400.0 * fy;
            data[y * width + x] = wall.min(floor).max(0.0) as u16;
        }
    }

    for dancer in &DANCERS {
        let phase = t * dancer.rate * std::f64::consts::TAU;
        let cx = dancer.center_x + dancer.orbit_x * phase.sin();
        let cy = dancer.center_y + dancer.orbit_y * (phase * 0.5).cos();
        let bob = 30.0 * (phase * 2.0).sin();

        let x0 = ((cx - dancer.radius_x) * width as f64).max(0.0) as usize;
        let x1 = (((cx + dancer.radius_x) * width as f64) as usize).min(width);
        let y0 = ((cy - dancer.radius_y) * height as f64).max(0.0) as usize;
        let y1 = (((cy + dancer.radius_y) * height as f64) as usize).min(height);

        for y in y0..y1 {
            let dy = (y as f64 / height as f64 - cy) / dancer.radius_y;
            for x in x0..x1 {
                let dx = (x as f64 / width as f64 - cx) / dancer.radius_x;
                let d2 = dx * dx + dy * dy;
                if d2 <= 1.0 {
                    // Rounded body: nearer at the middle of the blob
                    let body = dancer.depth as f64 + bob - 60.0 * (1.0 - d2);
                    data[y * width + x] = body.clamp(0.0, 2046.0) as u16;
                } else if d2 <= 1.35 && dx > 0.0 {
                    // Occlusion shadow on the far side of the body
                    data[y * width + x] = DEPTH_SENTINEL;
                }
            }
        }
    }

    // Random speckle dropout
    let dropouts = (data.len() as f64 * SPECKLE_RATE) as usize;
    for _ in 0..dropouts {
        let i = rng.gen_range(0..data.len());
        data[i] = DEPTH_SENTINEL;
    }
}

/// Depth source backed by the procedural scene
pub struct SyntheticSource {
    running: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
    seed: u64,
    led: LedState,
    tilt: i8,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
            seed,
            led: LedState::Off,
            tilt: 0,
        }
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthSource for SyntheticSource {
    fn start(&mut self, mut sink: FrameSink) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::InitializationFailed(
                "already running".to_string(),
            ));
        }

        info!(seed = self.seed, "starting synthetic depth source");
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let seed = self.seed;
        let thread = thread::spawn(move || {
            let period = Duration::from_secs_f64(1.0 / FRAME_RATE);
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut frame = RawDepthFrame {
                width: NATIVE_WIDTH,
                height: NATIVE_HEIGHT,
                data: vec![0; NATIVE_WIDTH * NATIVE_HEIGHT],
                captured_at: Instant::now(),
            };
            let mut index: u64 = 0;
            let mut next_due = Instant::now();

            while running.load(Ordering::SeqCst) {
                render_scene(index, &mut frame.data, frame.width, frame.height, &mut rng);
                frame.captured_at = Instant::now();
                sink(&frame);
                index += 1;

                next_due += period;
                let now = Instant::now();
                if next_due > now {
                    thread::sleep(next_due - now);
                } else {
                    // The sink overran the frame period; drop the debt
                    // rather than bursting to catch up.
                    next_due = now;
                }
            }
            debug!(frames = index, "synthetic capture thread finished");
        });

        self.capture_thread = Some(thread);
        Ok(())
    }

    fn stop(&mut self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        info!("stopping synthetic depth source");
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.capture_thread.take() {
            let _ = thread.join();
        }
    }

    fn set_led(&mut self, state: LedState) -> Result<(), SourceError> {
        debug!(?state, "synthetic LED");
        self.led = state;
        Ok(())
    }

    fn set_tilt(&mut self, degrees: i8) -> Result<(), SourceError> {
        debug!(degrees, "synthetic tilt");
        self.tilt = degrees.clamp(-27, 27);
        Ok(())
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_is_deterministic_for_a_seed() {
        let mut a = vec![0u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        let mut b = vec![0u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        let mut rng_a = SmallRng::seed_from_u64(7);
        let mut rng_b = SmallRng::seed_from_u64(7);
        render_scene(12, &mut a, NATIVE_WIDTH, NATIVE_HEIGHT, &mut rng_a);
        render_scene(12, &mut b, NATIVE_WIDTH, NATIVE_HEIGHT, &mut rng_b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_scene_contains_dancers_and_shadows() {
        let mut data = vec![0u16; NATIVE_WIDTH * NATIVE_HEIGHT];
        let mut rng = SmallRng::seed_from_u64(1);
        render_scene(0, &mut data, NATIVE_WIDTH, NATIVE_HEIGHT, &mut rng);

        let near = data.iter().filter(|&&v| v < 1100).count();
        let sentinel = data.iter().filter(|&&v| v == DEPTH_SENTINEL).count();
        assert!(near > 1000, "dancers missing from the scene");
        assert!(sentinel > 100, "no shadow or speckle sentinels");
        // The wall never reads as a dancer
        assert!(data[10] >= 1500);
    }

    #[test]
    fn test_source_streams_and_stops() {
        let mut source = SyntheticSource::with_seed(3);
        let (tx, rx) = std::sync::mpsc::channel();
        source
            .start(Box::new(move |frame| {
                let _ = tx.send((frame.width, frame.height, frame.data[0]));
            }))
            .unwrap();

        let (width, height, _) = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("no frame delivered");
        assert_eq!(width, NATIVE_WIDTH);
        assert_eq!(height, NATIVE_HEIGHT);
        source.stop();

        // Second start after stop is allowed
        assert!(source.start(Box::new(|_| {})).is_ok());
        source.stop();
    }

    #[test]
    fn test_tilt_clamps_to_motor_range() {
        let mut source = SyntheticSource::with_seed(0);
        source.set_tilt(100).unwrap();
        assert_eq!(source.tilt, 27);
        source.set_tilt(-100).unwrap();
        assert_eq!(source.tilt, -27);
    }
}
