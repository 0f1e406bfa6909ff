// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based visualizer
//!
//! Renders the processed frames to the terminal using Unicode
//! half-block characters for improved vertical resolution, and maps
//! hotkeys onto configuration commands. The pipeline runs on the depth
//! source's capture thread; this loop only takes finished frames from
//! the hand-off slot and redraws.

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    widgets::Widget,
};
use std::io::{self, stdout};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{PipelineConfig, Preset};
use crate::constants::{WORKING_HEIGHT, WORKING_WIDTH};
use crate::control::{ControlAction, PresetEvent, PresetScheduler};
use crate::pipeline::types::RgbFrame;
use crate::pipeline::{FrameProcessor, FrameSlot};
use crate::sources::synthetic::SyntheticSource;
use crate::sources::{DepthSource, LedState};

/// Run the terminal visualizer until the user quits
///
/// `events` is an optional show schedule applied from the start of the
/// session; the configuration reverts when it drains.
pub fn run(
    presets: Vec<Preset>,
    events: Vec<PresetEvent>,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, presets, events, seed);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    presets: Vec<Preset>,
    events: Vec<PresetEvent>,
    seed: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Mutex::new(PipelineConfig::default()));
    let slot = Arc::new(FrameSlot::new(WORKING_WIDTH, WORKING_HEIGHT));
    let mut processor = FrameProcessor::new(Arc::clone(&config), Arc::clone(&slot));

    let mut source = match seed {
        Some(seed) => SyntheticSource::with_seed(seed),
        None => SyntheticSource::new(),
    };
    source.start(Box::new(move |frame| {
        processor.process(&frame.data, frame.width, frame.height, frame.captured_at);
    }))?;
    if let Err(e) = source.set_led(LedState::Green) {
        warn!(error = %e, "LED not available");
    }

    info!("terminal visualizer running");

    let mut scheduler = PresetScheduler::new();
    if !events.is_empty()
        && let Ok(mut cfg) = config.lock()
    {
        let now = Instant::now();
        for event in events {
            scheduler.push(event, &mut cfg, now);
        }
    }

    let mut frame_widget = FrameWidget::new(WORKING_WIDTH, WORKING_HEIGHT);
    let mut show_help = false;
    let mut status_message = build_status_message();

    loop {
        let now = Instant::now();
        if let Ok(mut cfg) = config.lock() {
            scheduler.tick(&mut cfg, now);
        }

        frame_widget.has_frame |= slot.try_take_latest(&mut frame_widget.frame);

        terminal.draw(|f| {
            let area = f.area();

            let frame_area = Rect {
                x: area.x,
                y: area.y,
                width: area.width,
                height: area.height.saturating_sub(1),
            };
            f.render_widget(&frame_widget, frame_area);

            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };
            let status = StatusBar {
                message: &status_message,
                active_preset: scheduler.active_name(),
            };
            f.render_widget(status, status_area);
        })?;

        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('h') => {
                    show_help = !show_help;
                    status_message = if show_help {
                        build_help_message()
                    } else {
                        build_status_message()
                    };
                }
                KeyCode::Char(c) => {
                    if let Some(action) = action_for_key(c, &presets) {
                        show_help = false;
                        if let Ok(mut cfg) = config.lock() {
                            status_message = action.apply(&mut cfg);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    if let Err(e) = source.set_led(LedState::Red) {
        warn!(error = %e, "LED not available");
    }
    source.stop();
    info!("terminal visualizer stopped");

    Ok(())
}

/// Map a key press to its configuration command
///
/// Digits apply the preset at that position in the list.
fn action_for_key(key: char, presets: &[Preset]) -> Option<ControlAction> {
    if let Some(digit) = key.to_digit(10) {
        let index = digit.checked_sub(1)? as usize;
        let preset = presets.get(index)?;
        return Some(ControlAction::ApplyPreset(preset.clone()));
    }

    Some(match key {
        'm' => ControlAction::ToggleMedianFilter,
        'i' => ControlAction::ToggleInPaint,
        'g' => ControlAction::ToggleGradientMotion,
        'p' => ControlAction::TogglePosterize,
        'c' => ControlAction::ToggleCircularFeedback,
        'r' => ControlAction::ToggleMirror,
        'f' => ControlAction::ToggleFog,
        'o' => ControlAction::CycleOutline,
        'n' => ControlAction::NextGradient,
        '+' | '=' => ControlAction::MoreBuffers,
        '-' => ControlAction::FewerBuffers,
        ']' => ControlAction::BrightnessUp,
        '[' => ControlAction::BrightnessDown,
        '>' | '.' => ControlAction::SpeedUp,
        '<' | ',' => ControlAction::SpeedDown,
        '}' => ControlAction::PeriodUp,
        '{' => ControlAction::PeriodDown,
        's' => ControlAction::FogNearer,
        'd' => ControlAction::FogFarther,
        _ => return None,
    })
}

fn build_status_message() -> String {
    "'h' help | 'q' quit".to_string()
}

fn build_help_message() -> String {
    concat!(
        "m: median | i: in-paint | g: motion | n: gradient | o: outline | ",
        "p: posterize | c: feedback | r: mirror | f: fog | s/d: fog near/far | ",
        "+/-: trail | [/]: dim | </>: speed | {/}: period | 1-9: preset | q: quit"
    )
    .to_string()
}

/// Widget that renders a processed frame using half-block characters
struct FrameWidget {
    frame: RgbFrame,
    has_frame: bool,
}

impl FrameWidget {
    fn new(width: usize, height: usize) -> Self {
        Self {
            frame: RgbFrame::new(width, height),
            has_frame: false,
        }
    }
}

impl Widget for &FrameWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.has_frame {
            let msg = "Waiting for depth frames...";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, ratatui::style::Style::default());
            }
            return;
        }

        // Each terminal cell shows 2 vertical pixels: upper half (▀)
        // colored with fg, lower half with bg.
        let frame_aspect = self.frame.width() as f64 / self.frame.height() as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            let h = term_height;
            let w = h * frame_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / frame_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = self.frame.width() as f64 / display_width.max(1) as f64;
        let y_scale = self.frame.height() as f64 / (display_height.max(1) * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as usize;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as usize;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as usize;

                let top = sample_pixel(&self.frame, src_x, src_y_top);
                let bottom = sample_pixel(&self.frame, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

fn sample_pixel(frame: &RgbFrame, x: usize, y: usize) -> Color {
    let x = x.min(frame.width() - 1);
    let y = y.min(frame.height() - 1);
    let [r, g, b] = frame.pixel(x, y);
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
    active_preset: Option<&'a str>,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text = match self.active_preset {
            Some(name) => format!("[{}] {}", name, self.message),
            None => self.message.to_string(),
        };
        let text = if text.len() > area.width as usize {
            &text[..area.width as usize]
        } else {
            text.as_str()
        };

        buf.set_string(
            area.x,
            area.y,
            text,
            ratatui::style::Style::default()
                .fg(Color::White)
                .bg(Color::DarkGray),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_presets;

    #[test]
    fn test_every_toggle_has_a_key() {
        let presets = builtin_presets();
        assert_eq!(
            action_for_key('m', &presets),
            Some(ControlAction::ToggleMedianFilter)
        );
        assert_eq!(
            action_for_key('o', &presets),
            Some(ControlAction::CycleOutline)
        );
        assert_eq!(action_for_key('+', &presets), action_for_key('=', &presets));
        assert_eq!(action_for_key('x', &presets), None);
    }

    #[test]
    fn test_digits_map_to_presets_one_based() {
        let presets = builtin_presets();
        match action_for_key('1', &presets) {
            Some(ControlAction::ApplyPreset(p)) => assert_eq!(p.name, presets[0].name),
            other => panic!("unexpected action: {:?}", other),
        }
        // Out of range digit maps to nothing
        assert_eq!(action_for_key('9', &presets), None);
        assert_eq!(action_for_key('0', &presets), None);
    }
}
