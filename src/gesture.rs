//! Edge-drag gesture detection
//!
//! A background thread samples the global primary-button state and cursor
//! position. Pressing near the top screen edge arms the gesture; dragging
//! down past the threshold while the overlay is hidden fires one
//! [`OverlayCommand::Toggle`]. The detector owns its state and only talks
//! to the window thread through the [`CommandDispatcher`].

use crate::config::GestureConfig;
use crate::overlay::{CommandDispatcher, OverlayCommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// One poll of the global input state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSample {
    pub button_down: bool,
    /// Absolute screen position
    pub cursor: (i32, i32),
}

impl InputSample {
    pub fn new(button_down: bool, x: i32, y: i32) -> Self {
        Self {
            button_down,
            cursor: (x, y),
        }
    }
}

/// Source of global input samples, independent of window focus
pub trait InputSource: Send {
    /// `None` when the OS query failed; treated as "button up"
    fn sample(&mut self) -> Option<InputSample>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureSettings {
    /// Y coordinate of the screen's top edge
    pub edge_top: i32,
    pub edge_tolerance_px: i32,
    pub drag_threshold_px: i32,
    pub only_when_hidden: bool,
    pub poll_interval: Duration,
}

impl From<&GestureConfig> for GestureSettings {
    fn from(config: &GestureConfig) -> Self {
        GestureSettings {
            edge_top: 0,
            edge_tolerance_px: config.edge_tolerance_px.max(0),
            drag_threshold_px: config.drag_threshold_px.max(1),
            only_when_hidden: config.only_when_hidden,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }
}

impl Default for GestureSettings {
    fn default() -> Self {
        GestureSettings::from(&GestureConfig::default())
    }
}

/// Transient drag tracking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureState {
    pub button_down: bool,
    /// Set while a drag that started at the top edge is in progress
    pub drag_start_y: Option<i32>,
}

/// Top-edge drag-down recognizer
#[derive(Debug)]
pub struct GestureDetector {
    settings: GestureSettings,
    state: GestureState,
}

impl GestureDetector {
    pub fn new(settings: GestureSettings) -> Self {
        Self {
            settings,
            state: GestureState::default(),
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    fn near_top_edge(&self, y: i32) -> bool {
        (y - self.settings.edge_top).abs() <= self.settings.edge_tolerance_px
    }

    /// Feed one sample; returns true when the gesture fires
    pub fn observe(&mut self, sample: InputSample, overlay_hidden: bool) -> bool {
        let y = sample.cursor.1;

        if !sample.button_down {
            self.state = GestureState::default();
            return false;
        }

        if !self.state.button_down {
            self.state.button_down = true;
            if self.near_top_edge(y) {
                debug!("Gesture armed at y={}", y);
                self.state.drag_start_y = Some(y);
            }
            return false;
        }

        let Some(start_y) = self.state.drag_start_y else {
            return false;
        };

        let allowed = overlay_hidden || !self.settings.only_when_hidden;
        if y - start_y >= self.settings.drag_threshold_px && allowed {
            // Stay disarmed until the button is released
            self.state.drag_start_y = None;
            return true;
        }

        false
    }
}

/// Spawn the polling thread
///
/// The thread is detached: it runs until the process exits or the
/// dispatcher's receiver is gone.
pub fn spawn_detector<I>(
    mut input: I,
    settings: GestureSettings,
    visible: Arc<AtomicBool>,
    dispatcher: CommandDispatcher,
) -> std::io::Result<JoinHandle<()>>
where
    I: InputSource + 'static,
{
    thread::Builder::new()
        .name("gesture-poller".to_string())
        .spawn(move || {
            info!(
                "Gesture detector started (every {:?}, tolerance {}px, threshold {}px)",
                settings.poll_interval, settings.edge_tolerance_px, settings.drag_threshold_px
            );
            let mut detector = GestureDetector::new(settings);

            loop {
                let sample = input
                    .sample()
                    .unwrap_or(InputSample::new(false, 0, i32::MAX));
                // Racy read; it only suppresses redundant toggles
                let hidden = !visible.load(Ordering::Relaxed);

                if detector.observe(sample, hidden) {
                    info!("Edge-drag gesture recognized");
                    if !dispatcher.dispatch(OverlayCommand::Toggle) {
                        break;
                    }
                }

                thread::sleep(settings.poll_interval);
            }

            info!("Gesture detector stopped");
        })
}

/// Global cursor and left-button state via Win32 polling
#[cfg(windows)]
pub struct CursorInput;

#[cfg(windows)]
impl InputSource for CursorInput {
    fn sample(&mut self) -> Option<InputSample> {
        use windows::Win32::Foundation::POINT;
        use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_LBUTTON};
        use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

        let mut point = POINT::default();
        unsafe {
            GetCursorPos(&mut point).ok()?;
            // High bit set = currently down
            let down = (GetAsyncKeyState(VK_LBUTTON.0 as i32) as u16 & 0x8000) != 0;
            Some(InputSample::new(down, point.x, point.y))
        }
    }
}
