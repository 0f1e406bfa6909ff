// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! Non-interactive entry points: listing presets, rendering a snapshot
//! of the synthetic scene to an image file, and parsing the show
//! schedule file for the terminal viewer.

use chrono::Local;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::{PipelineConfig, Preset};
use crate::constants::{NATIVE_HEIGHT, NATIVE_WIDTH, WORKING_HEIGHT, WORKING_WIDTH};
use crate::control::PresetEvent;
use crate::errors::{AppError, AppResult, SnapshotError};
use crate::pipeline::{FrameProcessor, FrameSlot};
use crate::sources::synthetic::render_scene;

/// Print the available presets and their headline settings
pub fn list_presets(presets: &[Preset]) {
    println!("Available presets:");
    println!();
    for (index, preset) in presets.iter().enumerate() {
        let c = &preset.config;
        println!("  [{}] {}", index + 1, preset.name);
        println!(
            "      trail {} | gradient {} | outline {} | speed {:.2}x{}{}{}",
            c.buffer_count(),
            crate::pipeline::gradient::THEMES[c.gradient_index()].name,
            c.outline.display_name(),
            c.speed_factor(),
            if c.posterize { " | posterize" } else { "" },
            if c.circular_feedback { " | feedback" } else { "" },
            if c.fog { " | fog" } else { "" },
        );
    }
}

/// Render `frames` synthetic frames through the pipeline and save the
/// last one as a PNG
///
/// Without an explicit output path the image lands in the user's
/// picture directory with a timestamped name.
pub fn snapshot(
    frames: u32,
    output: Option<PathBuf>,
    preset: Option<&Preset>,
    seed: u64,
) -> AppResult<PathBuf> {
    let mut config = match preset {
        Some(preset) => preset.config.clone(),
        None => PipelineConfig::default(),
    };
    // Gradient motion is meaningless in a still capture
    config.gradient_motion = false;

    let config = Arc::new(Mutex::new(config));
    let slot = Arc::new(FrameSlot::new(WORKING_WIDTH, WORKING_HEIGHT));
    let mut processor =
        FrameProcessor::new(Arc::clone(&config), Arc::clone(&slot)).with_fill_seed(seed);

    info!(frames, seed, "rendering snapshot");
    let mut raw = vec![0u16; NATIVE_WIDTH * NATIVE_HEIGHT];
    let mut rng = SmallRng::seed_from_u64(seed);
    let start = Instant::now();
    for index in 0..frames.max(1) {
        render_scene(index as u64, &mut raw, NATIVE_WIDTH, NATIVE_HEIGHT, &mut rng);
        // Synthetic timeline at ~30 fps, independent of wall time
        let at = start + Duration::from_millis(index as u64 * 33);
        processor.process(&raw, NATIVE_WIDTH, NATIVE_HEIGHT, at);
    }

    let frame = slot
        .try_take_latest_frame()
        .ok_or(AppError::Snapshot(SnapshotError::NoFrameAvailable))?;

    let img: image::RgbImage = image::ImageBuffer::from_raw(
        frame.width() as u32,
        frame.height() as u32,
        frame.as_slice().to_vec(),
    )
    .ok_or_else(|| {
        AppError::Snapshot(SnapshotError::EncodingFailed(
            "frame buffer size mismatch".to_string(),
        ))
    })?;

    let filepath = match output {
        Some(path) => path,
        None => {
            let dir = default_snapshot_dir();
            std::fs::create_dir_all(&dir)
                .map_err(|e| AppError::Snapshot(SnapshotError::SaveFailed(e.to_string())))?;
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            dir.join(format!("dancefloor_{}.png", timestamp))
        }
    };

    img.save(&filepath)
        .map_err(|e| AppError::Snapshot(SnapshotError::SaveFailed(e.to_string())))?;
    info!(path = %filepath.display(), "snapshot saved");

    Ok(filepath)
}

fn default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dancefloor")
}

#[derive(Deserialize)]
struct ScheduleEntry {
    preset: String,
    secs: f64,
}

/// Parse a show schedule file into timed preset events
///
/// The file is a JSON array of `{"preset": name, "secs": duration}`
/// entries; names resolve against the supplied preset list.
pub fn load_schedule(path: &Path, presets: &[Preset]) -> AppResult<Vec<PresetEvent>> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
    let entries: Vec<ScheduleEntry> = serde_json::from_str(&data)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;

    entries
        .into_iter()
        .map(|entry| {
            let preset = presets
                .iter()
                .find(|p| p.name == entry.preset)
                .cloned()
                .ok_or_else(|| AppError::Config(format!("unknown preset '{}'", entry.preset)))?;
            if !entry.secs.is_finite() || entry.secs <= 0.0 {
                return Err(AppError::Config(format!(
                    "bad duration for preset '{}'",
                    entry.preset
                )));
            }
            Ok(PresetEvent {
                preset,
                duration: Duration::from_secs_f64(entry.secs),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_presets;

    #[test]
    fn test_schedule_resolves_names_and_durations() {
        let dir = std::env::temp_dir().join("dancefloor-schedule-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("schedule.json");
        std::fs::write(
            &path,
            r#"[{"preset": "strobe", "secs": 2.5}, {"preset": "ghost", "secs": 10}]"#,
        )
        .unwrap();

        let events = load_schedule(&path, &builtin_presets()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].preset.name, "strobe");
        assert_eq!(events[0].duration, Duration::from_secs_f64(2.5));
    }

    #[test]
    fn test_schedule_rejects_unknown_preset_and_bad_duration() {
        let dir = std::env::temp_dir().join("dancefloor-schedule-test");
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("unknown.json");
        std::fs::write(&path, r#"[{"preset": "nope", "secs": 1}]"#).unwrap();
        assert!(load_schedule(&path, &builtin_presets()).is_err());

        let path = dir.join("bad-duration.json");
        std::fs::write(&path, r#"[{"preset": "ghost", "secs": 0}]"#).unwrap();
        assert!(load_schedule(&path, &builtin_presets()).is_err());
    }

    #[test]
    fn test_snapshot_writes_a_png() {
        let dir = std::env::temp_dir().join("dancefloor-snapshot-test");
        std::fs::create_dir_all(&dir).unwrap();
        let out = dir.join("capture.png");

        let path = snapshot(3, Some(out.clone()), None, 7).unwrap();
        assert_eq!(path, out);
        let meta = std::fs::metadata(&out).unwrap();
        assert!(meta.len() > 0);
    }
}
