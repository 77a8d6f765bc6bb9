//! Overlay state and behaviour
//!
//! [`Overlay`] owns everything the window shows and decides what happens on
//! each trigger: the refresh timer, the global hotkey, gesture commands and
//! close. It performs no OS calls itself; the platform shell applies the
//! returned [`Visibility`] and paints the [`Frame`] it hands out.

pub mod credit;
pub mod render;

pub use credit::CreditBanner;
pub use render::Frame;

use crate::config::OverlayConfig;
use crate::metrics::{display_text, MetricsCollector};
use crate::position::{save_best_effort, Position, PositionStore};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Visible => Visibility::Hidden,
            Visibility::Hidden => Visibility::Visible,
        }
    }
}

/// Commands sent to the window thread from other threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    Toggle,
}

/// Cross-thread hand-off to the window thread
///
/// Commands go through a channel; `wake` nudges the window thread (a posted
/// window message on Windows) so it drains the channel.
pub struct CommandDispatcher {
    tx: Sender<OverlayCommand>,
    wake: Box<dyn Fn() + Send>,
}

impl CommandDispatcher {
    pub fn channel(wake: impl Fn() + Send + 'static) -> (Self, Receiver<OverlayCommand>) {
        let (tx, rx) = channel::unbounded();
        (
            Self {
                tx,
                wake: Box::new(wake),
            },
            rx,
        )
    }

    /// Returns false once the receiving side is gone
    pub fn dispatch(&self, command: OverlayCommand) -> bool {
        if self.tx.send(command).is_err() {
            debug!("Overlay command receiver dropped");
            return false;
        }
        (self.wake)();
        true
    }
}

/// Everything the window currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayState {
    pub visible: bool,
    pub position: Position,
    pub display_text: String,
}

pub struct Overlay {
    state: OverlayState,
    collector: MetricsCollector,
    credit: CreditBanner,
    /// Published for the gesture thread
    visible_flag: Arc<AtomicBool>,
    poll_when_hidden: bool,
    alpha: u8,
    closed: bool,
}

impl Overlay {
    pub fn new(
        config: &OverlayConfig,
        position: Position,
        collector: MetricsCollector,
        started: Instant,
    ) -> Self {
        let visible = !config.start_hidden;
        Self {
            state: OverlayState {
                visible,
                position,
                display_text: String::new(),
            },
            collector,
            credit: CreditBanner::new(config.credit_text.clone(), started, config.credit_grace()),
            visible_flag: Arc::new(AtomicBool::new(visible)),
            poll_when_hidden: config.poll_when_hidden,
            alpha: config.alpha(),
            closed: false,
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn visibility(&self) -> Visibility {
        if self.state.visible {
            Visibility::Visible
        } else {
            Visibility::Hidden
        }
    }

    /// Shared flag the gesture detector reads
    pub fn visibility_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.visible_flag)
    }

    pub fn set_position(&mut self, position: Position) {
        self.state.position = position;
    }

    /// Flip between visible and hidden; the caller shows/hides the window
    pub fn toggle_visibility(&mut self) -> Visibility {
        let next = self.visibility().toggled();
        self.state.visible = next.is_visible();
        self.visible_flag.store(self.state.visible, Ordering::Relaxed);
        info!("Overlay {:?}", next);
        // Text went stale while polling was paused
        if next.is_visible() && !self.poll_when_hidden {
            self.refresh_metrics();
        }
        next
    }

    pub fn handle_hotkey(&mut self) -> Visibility {
        debug!("Hotkey pressed");
        self.toggle_visibility()
    }

    pub fn handle_command(&mut self, command: OverlayCommand) -> Visibility {
        match command {
            OverlayCommand::Toggle => self.toggle_visibility(),
        }
    }

    /// Poll every metric source and rebuild the display text
    ///
    /// Returns false when the poll was skipped because the overlay is hidden.
    pub fn refresh_metrics(&mut self) -> bool {
        if !self.state.visible && !self.poll_when_hidden {
            return false;
        }

        let snapshot = self.collector.poll();
        self.state.display_text = display_text(&snapshot);
        true
    }

    /// Build the frame to paint at `now`
    pub fn render(&mut self, now: Instant) -> Frame {
        if self.state.display_text.is_empty() {
            self.refresh_metrics();
        }

        Frame {
            background: render::BACKGROUND,
            alpha: self.alpha,
            text_color: render::TEXT,
            text: self.state.display_text.clone(),
            credit: self.credit.current(now).map(str::to_string),
        }
    }

    /// Persist the position if a store is given and release metric sources
    ///
    /// Safe to call more than once; only the first call has effects.
    pub fn handle_close(&mut self, store: Option<&dyn PositionStore>) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(store) = store {
            save_best_effort(store, self.state.position);
        }
        self.collector.release();
        info!("Overlay closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::testing::*;
    use crate::metrics::{BatteryRemaining, BatteryStatus, MetricsError, PLACEHOLDER};
    use crate::position::TextFileStore;
    use std::time::Duration;

    fn overlay_with(config: &OverlayConfig) -> Overlay {
        Overlay::new(
            config,
            Position { x: 37, y: 52 },
            MetricsCollector::new(healthy_sources()),
            Instant::now(),
        )
    }

    #[test]
    fn starts_visible_and_toggles_back() {
        let mut overlay = overlay_with(&OverlayConfig::default());
        assert_eq!(overlay.visibility(), Visibility::Visible);

        assert_eq!(overlay.toggle_visibility(), Visibility::Hidden);
        assert_eq!(overlay.toggle_visibility(), Visibility::Visible);
        assert!(overlay.state().visible);
    }

    #[test]
    fn toggle_publishes_flag() {
        let mut overlay = overlay_with(&OverlayConfig::default());
        let flag = overlay.visibility_flag();
        assert!(flag.load(Ordering::Relaxed));

        overlay.handle_hotkey();
        assert!(!flag.load(Ordering::Relaxed));
        overlay.handle_command(OverlayCommand::Toggle);
        assert!(flag.load(Ordering::Relaxed));
    }

    #[test]
    fn start_hidden_config() {
        let config = OverlayConfig {
            start_hidden: true,
            ..OverlayConfig::default()
        };
        let overlay = overlay_with(&config);
        assert_eq!(overlay.visibility(), Visibility::Hidden);
        assert!(!overlay.visibility_flag().load(Ordering::Relaxed));
    }

    #[test]
    fn refresh_builds_text() {
        let mut overlay = overlay_with(&OverlayConfig::default());
        assert!(overlay.refresh_metrics());
        assert!(overlay
            .state()
            .display_text
            .starts_with("Battery: 87% (1h 30m remaining)"));
    }

    #[test]
    fn hidden_overlay_skips_polling_when_configured() {
        let config = OverlayConfig {
            poll_when_hidden: false,
            ..OverlayConfig::default()
        };
        let mut overlay = overlay_with(&config);
        overlay.toggle_visibility();
        assert!(!overlay.refresh_metrics());
        assert!(overlay.state().display_text.is_empty());

        let mut overlay = overlay_with(&OverlayConfig::default());
        overlay.toggle_visibility();
        assert!(overlay.refresh_metrics());
    }

    #[test]
    fn reshown_overlay_repolls_when_hidden_polling_is_off() {
        struct RisingCpu(f32);

        impl crate::metrics::CpuSource for RisingCpu {
            fn cpu_percent(&mut self) -> Result<f32, MetricsError> {
                self.0 += 10.0;
                Ok(self.0)
            }
        }

        let mut sources = healthy_sources();
        sources.cpu = Box::new(RisingCpu(0.0));
        let config = OverlayConfig {
            poll_when_hidden: false,
            ..OverlayConfig::default()
        };
        let mut overlay = Overlay::new(
            &config,
            Position::default(),
            MetricsCollector::new(sources),
            Instant::now(),
        );

        overlay.refresh_metrics();
        assert!(overlay.state().display_text.contains("CPU: 10%"));

        overlay.toggle_visibility();
        assert!(overlay.state().display_text.contains("CPU: 10%"));
        overlay.toggle_visibility();

        let frame = overlay.render(Instant::now());
        assert!(frame.text.contains("CPU: 20%"));
    }

    #[test]
    fn failing_provider_shows_placeholder() {
        let mut sources = healthy_sources();
        sources.cpu = Box::new(FixedCpu(Err(MetricsError::query("cpu", "gone"))));
        sources.battery = Box::new(FixedBattery(Ok(BatteryStatus {
            percent: Some(40),
            remaining: BatteryRemaining::Unknown,
            charging: false,
        })));
        let mut overlay = Overlay::new(
            &OverlayConfig::default(),
            Position::default(),
            MetricsCollector::new(sources),
            Instant::now(),
        );

        let frame = overlay.render(Instant::now());
        assert!(frame.text.contains(&format!("CPU: {}", PLACEHOLDER)));
        assert!(frame.text.contains("Calculating..."));
    }

    #[test]
    fn credit_is_one_shot() {
        let start = Instant::now();
        let config = OverlayConfig {
            credit_grace_secs: 3,
            credit_text: "made by us".to_string(),
            ..OverlayConfig::default()
        };
        let mut overlay = Overlay::new(
            &config,
            Position::default(),
            MetricsCollector::new(healthy_sources()),
            start,
        );

        assert_eq!(overlay.render(start).credit.as_deref(), Some("made by us"));
        assert_eq!(overlay.render(start + Duration::from_secs(3)).credit, None);
        assert_eq!(overlay.render(start + Duration::from_secs(1)).credit, None);
    }

    #[test]
    fn frame_uses_configured_alpha() {
        let config = OverlayConfig {
            opacity: 0.5,
            ..OverlayConfig::default()
        };
        let mut overlay = overlay_with(&config);
        assert_eq!(overlay.render(Instant::now()).alpha, 128);
    }

    #[test]
    fn close_persists_position_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = TextFileStore::new(dir.path().join("position.txt"));
        let mut overlay = overlay_with(&OverlayConfig::default());

        overlay.handle_close(Some(&store));
        assert!(overlay.is_closed());
        assert_eq!(store.load().unwrap(), Position { x: 37, y: 52 });

        // Metrics sources are gone after close
        overlay.refresh_metrics();
        assert!(overlay.state().display_text.starts_with("Battery: N/A"));

        overlay.set_position(Position { x: 1, y: 1 });
        overlay.handle_close(Some(&store));
        assert_eq!(store.load().unwrap(), Position { x: 37, y: 52 });
    }

    #[test]
    fn dispatcher_wakes_and_reports_disconnect() {
        use std::sync::atomic::AtomicUsize;

        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let (dispatcher, rx) = CommandDispatcher::channel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(dispatcher.dispatch(OverlayCommand::Toggle));
        assert_eq!(rx.try_recv(), Ok(OverlayCommand::Toggle));
        assert_eq!(wakes.load(Ordering::SeqCst), 1);

        drop(rx);
        assert!(!dispatcher.dispatch(OverlayCommand::Toggle));
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }
}
