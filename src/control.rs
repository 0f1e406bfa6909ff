// SPDX-License-Identifier: GPL-3.0-only

//! Configuration commands and timed preset events
//!
//! Input handling never touches the pipeline directly: keys (or any
//! other control surface) map to [`ControlAction`]s, each of which is a
//! self-describing transformation of the shared [`PipelineConfig`].
//! The [`PresetScheduler`] layers timed preset overrides on top,
//! restoring the pre-event configuration when its queue drains.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{PipelineConfig, Preset};

/// A single configuration transformation triggered from outside
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    ToggleMedianFilter,
    ToggleInPaint,
    ToggleGradientMotion,
    TogglePosterize,
    ToggleCircularFeedback,
    ToggleMirror,
    ToggleFog,
    CycleOutline,
    NextGradient,
    SpeedUp,
    SpeedDown,
    PeriodUp,
    PeriodDown,
    MoreBuffers,
    FewerBuffers,
    BrightnessUp,
    BrightnessDown,
    FogNearer,
    FogFarther,
    /// Replace the whole configuration with a preset, atomically
    ApplyPreset(Preset),
}

/// Brightness divisor step per key press
const BRIGHTNESS_STEP: f32 = 0.2;

impl ControlAction {
    /// Apply this action to the configuration
    ///
    /// Returns a human-readable status line describing the new state.
    pub fn apply(&self, config: &mut PipelineConfig) -> String {
        match self {
            ControlAction::ToggleMedianFilter => {
                config.median_filter = !config.median_filter;
                format!("Median filter is {}", on_off(config.median_filter))
            }
            ControlAction::ToggleInPaint => {
                config.in_paint = !config.in_paint;
                format!("In-painting is {}", on_off(config.in_paint))
            }
            ControlAction::ToggleGradientMotion => {
                config.gradient_motion = !config.gradient_motion;
                format!(
                    "Color gradient movement is {}",
                    on_off(config.gradient_motion)
                )
            }
            ControlAction::TogglePosterize => {
                config.posterize = !config.posterize;
                format!("Posterize is {}", on_off(config.posterize))
            }
            ControlAction::ToggleCircularFeedback => {
                config.circular_feedback = !config.circular_feedback;
                format!(
                    "Circular feedback is {}",
                    on_off(config.circular_feedback)
                )
            }
            ControlAction::ToggleMirror => {
                config.mirror = !config.mirror;
                format!("Mirror is {}", on_off(config.mirror))
            }
            ControlAction::ToggleFog => {
                config.fog = !config.fog;
                format!("Fog is {}", on_off(config.fog))
            }
            ControlAction::CycleOutline => {
                config.outline = config.outline.next();
                format!("Outline style is {}", config.outline.display_name())
            }
            ControlAction::NextGradient => {
                let next = (config.gradient_index() + 1)
                    % crate::pipeline::gradient::THEMES.len();
                config.set_gradient_index(next);
                format!(
                    "Gradient is {}",
                    crate::pipeline::gradient::THEMES[next].name
                )
            }
            ControlAction::SpeedUp => {
                config.set_speed_index(config.speed_index() + 1);
                format!("Gradient speed is {:.2}x", config.speed_factor())
            }
            ControlAction::SpeedDown => {
                config.set_speed_index(config.speed_index().saturating_sub(1));
                format!("Gradient speed is {:.2}x", config.speed_factor())
            }
            ControlAction::PeriodUp => {
                config.set_period_index(config.period_index() + 1);
                format!("Gradient period is {:.2}", config.gradient_period())
            }
            ControlAction::PeriodDown => {
                config.set_period_index(config.period_index().saturating_sub(1));
                format!("Gradient period is {:.2}", config.gradient_period())
            }
            ControlAction::MoreBuffers => {
                config.set_buffer_count(config.buffer_count() + 1);
                format!("Number of trail buffers is now {}", config.buffer_count())
            }
            ControlAction::FewerBuffers => {
                config.set_buffer_count(config.buffer_count().saturating_sub(1));
                format!("Number of trail buffers is now {}", config.buffer_count())
            }
            ControlAction::BrightnessUp => {
                config.set_brightness(config.brightness() + BRIGHTNESS_STEP);
                format!("Dimming factor is now {:.2}", config.brightness())
            }
            ControlAction::BrightnessDown => {
                config.set_brightness(config.brightness() - BRIGHTNESS_STEP);
                format!("Dimming factor is now {:.2}", config.brightness())
            }
            ControlAction::FogNearer => {
                config.set_fog_start_index(config.fog_start_index().saturating_sub(1));
                format!("Fog starts at {:.2}", config.fog_start())
            }
            ControlAction::FogFarther => {
                config.set_fog_start_index(config.fog_start_index() + 1);
                format!("Fog starts at {:.2}", config.fog_start())
            }
            ControlAction::ApplyPreset(preset) => {
                *config = preset.config.clone();
                format!("Preset '{}' applied", preset.name)
            }
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "ON" } else { "OFF" }
}

/// A preset override with a lifetime
#[derive(Debug, Clone)]
pub struct PresetEvent {
    pub preset: Preset,
    pub duration: Duration,
}

/// Queue of timed preset overrides
///
/// Pushing onto an empty queue snapshots the current configuration and
/// applies the preset immediately. Each head-of-queue change resets the
/// elapsed timer; chained events do not re-snapshot, so when the queue
/// drains the configuration reverts to the state before the chain
/// began.
#[derive(Debug, Default)]
pub struct PresetScheduler {
    queue: VecDeque<PresetEvent>,
    snapshot: Option<PipelineConfig>,
    head_started: Option<Instant>,
}

impl PresetScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event; if nothing is active it takes effect now
    pub fn push(&mut self, event: PresetEvent, config: &mut PipelineConfig, now: Instant) {
        if self.queue.is_empty() {
            debug!(preset = %event.preset.name, "preset event started");
            self.snapshot = Some(config.clone());
            *config = event.preset.config.clone();
            self.head_started = Some(now);
        }
        self.queue.push_back(event);
    }

    /// Advance the timer; expire the head event if its duration elapsed
    pub fn tick(&mut self, config: &mut PipelineConfig, now: Instant) {
        let Some(started) = self.head_started else {
            return;
        };
        let Some(head) = self.queue.front() else {
            return;
        };
        if now.duration_since(started) < head.duration {
            return;
        }

        self.queue.pop_front();
        match self.queue.front() {
            Some(next) => {
                debug!(preset = %next.preset.name, "preset event started");
                *config = next.preset.config.clone();
                self.head_started = Some(now);
            }
            None => {
                debug!("preset queue drained, restoring configuration");
                if let Some(snapshot) = self.snapshot.take() {
                    *config = snapshot;
                }
                self.head_started = None;
            }
        }
    }

    /// Name of the currently active preset event, if any
    pub fn active_name(&self) -> Option<&str> {
        self.queue.front().map(|e| e.preset.name.as_str())
    }
}
