//! System metrics polling
//!
//! Each statistic comes from its own source behind a small capability
//! trait. A source either returns a value or a [`MetricsError`]; the
//! [`MetricsCollector`] turns errors into [`Reading::Unavailable`] so a
//! failing source only degrades its own line of the overlay.
//!
//! - `battery` - power status and remaining-time formatting
//! - `system`  - CPU utilization and available memory via sysinfo
//! - `gpu`     - dedicated video memory in use
//! - `audio`   - default render/capture endpoint mute state
//! - `display` - snapshot to overlay text

pub mod audio;
pub mod battery;
pub mod display;
pub mod gpu;
pub mod system;

pub use audio::AudioState;
pub use battery::{format_remaining, BatteryRemaining, BatterySource, BatteryStatus};
pub use display::{display_text, PLACEHOLDER};

use crate::config::OverlayConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// The OS call failed
    #[error("{source_name} query failed: {message}")]
    Query {
        source_name: &'static str,
        message: String,
    },
    /// The hardware or counter does not exist on this machine
    #[error("{0} not present")]
    NotPresent(&'static str),
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
    /// No usable sample yet
    #[error("{0} has no sample yet")]
    NotReady(&'static str),
}

impl MetricsError {
    pub fn query(source_name: &'static str, message: impl ToString) -> Self {
        MetricsError::Query {
            source_name,
            message: message.to_string(),
        }
    }
}

/// One polled value, or the distinguished "unknown" marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading<T> {
    Value(T),
    Unavailable,
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Reading::Value(v) => Some(v),
            Reading::Unavailable => None,
        }
    }

    fn from_result(result: Result<T, MetricsError>) -> Self {
        match result {
            Ok(v) => Reading::Value(v),
            Err(e) => {
                debug!("Metric unavailable: {}", e);
                Reading::Unavailable
            }
        }
    }
}

pub trait CpuSource: Send {
    /// Total CPU utilization, 0-100
    fn cpu_percent(&mut self) -> Result<f32, MetricsError>;
}

pub trait MemorySource: Send {
    fn available_mb(&mut self) -> Result<u64, MetricsError>;
}

pub trait GpuSource: Send {
    /// Dedicated video memory currently in use
    fn dedicated_used_mb(&mut self) -> Result<u64, MetricsError>;
}

/// Everything one refresh tick displays
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub battery_percent: Reading<u8>,
    pub battery_remaining: Reading<BatteryRemaining>,
    pub charging: bool,
    pub cpu_percent: Reading<f32>,
    pub available_ram_mb: Reading<u64>,
    /// `None` when the GPU line is disabled
    pub gpu_vram_mb: Option<Reading<u64>>,
    /// `None` when the audio line is disabled
    pub audio_muted: Option<Reading<bool>>,
    pub mic_muted: Option<Reading<bool>>,
}

impl MetricsSnapshot {
    /// Snapshot with every configured source unavailable
    pub fn unavailable() -> Self {
        MetricsSnapshot {
            battery_percent: Reading::Unavailable,
            battery_remaining: Reading::Unavailable,
            charging: false,
            cpu_percent: Reading::Unavailable,
            available_ram_mb: Reading::Unavailable,
            gpu_vram_mb: None,
            audio_muted: None,
            mic_muted: None,
        }
    }
}

/// The set of sources a collector polls
pub struct MetricsSources {
    pub battery: Box<dyn BatterySource>,
    pub cpu: Box<dyn CpuSource>,
    pub memory: Box<dyn MemorySource>,
    pub gpu: Option<Box<dyn GpuSource>>,
    pub audio: Option<Box<dyn AudioState>>,
}

impl MetricsSources {
    /// OS-backed sources for the current platform
    pub fn platform(config: &OverlayConfig) -> Self {
        let system = system::SharedSystem::new();
        MetricsSources {
            battery: Box::new(battery::PowerStatusSource),
            cpu: Box::new(system.clone()),
            memory: Box::new(system),
            gpu: config
                .show_gpu
                .then(|| Box::new(gpu::AdapterMemorySource) as Box<dyn GpuSource>),
            audio: config
                .show_audio
                .then(|| Box::new(audio::EndpointAudioState) as Box<dyn AudioState>),
        }
    }
}

/// Polls every source into a fresh snapshot
pub struct MetricsCollector {
    sources: Option<MetricsSources>,
}

impl MetricsCollector {
    pub fn new(sources: MetricsSources) -> Self {
        Self {
            sources: Some(sources),
        }
    }

    pub fn poll(&mut self) -> MetricsSnapshot {
        let Some(sources) = self.sources.as_mut() else {
            return MetricsSnapshot::unavailable();
        };

        let (battery_percent, battery_remaining, charging) =
            match Reading::from_result(sources.battery.battery()) {
                Reading::Value(status) => (
                    status.percent.map_or(Reading::Unavailable, Reading::Value),
                    Reading::Value(status.remaining),
                    status.charging,
                ),
                Reading::Unavailable => (Reading::Unavailable, Reading::Unavailable, false),
            };

        let audio = sources.audio.as_ref();

        MetricsSnapshot {
            battery_percent,
            battery_remaining,
            charging,
            cpu_percent: Reading::from_result(sources.cpu.cpu_percent()),
            available_ram_mb: Reading::from_result(sources.memory.available_mb()),
            gpu_vram_mb: sources
                .gpu
                .as_mut()
                .map(|gpu| Reading::from_result(gpu.dedicated_used_mb())),
            audio_muted: audio.map(|a| Reading::from_result(a.is_output_muted())),
            mic_muted: audio.map(|a| Reading::from_result(a.is_input_muted())),
        }
    }

    /// Drop all sources; later polls report everything unavailable
    pub fn release(&mut self) {
        if self.sources.take().is_some() {
            debug!("Metric sources released");
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted sources shared by unit tests

    use super::*;

    pub struct FixedBattery(pub Result<BatteryStatus, MetricsError>);

    impl BatterySource for FixedBattery {
        fn battery(&mut self) -> Result<BatteryStatus, MetricsError> {
            self.0.clone()
        }
    }

    pub struct FixedCpu(pub Result<f32, MetricsError>);

    impl CpuSource for FixedCpu {
        fn cpu_percent(&mut self) -> Result<f32, MetricsError> {
            self.0.clone()
        }
    }

    pub struct FixedMemory(pub Result<u64, MetricsError>);

    impl MemorySource for FixedMemory {
        fn available_mb(&mut self) -> Result<u64, MetricsError> {
            self.0.clone()
        }
    }

    pub struct FixedGpu(pub Result<u64, MetricsError>);

    impl GpuSource for FixedGpu {
        fn dedicated_used_mb(&mut self) -> Result<u64, MetricsError> {
            self.0.clone()
        }
    }

    pub struct FixedAudio {
        pub output: Result<bool, MetricsError>,
        pub input: Result<bool, MetricsError>,
    }

    impl AudioState for FixedAudio {
        fn is_output_muted(&self) -> Result<bool, MetricsError> {
            self.output.clone()
        }

        fn is_input_muted(&self) -> Result<bool, MetricsError> {
            self.input.clone()
        }
    }

    pub fn healthy_sources() -> MetricsSources {
        MetricsSources {
            battery: Box::new(FixedBattery(Ok(BatteryStatus {
                percent: Some(87),
                remaining: BatteryRemaining::Seconds(5400),
                charging: false,
            }))),
            cpu: Box::new(FixedCpu(Ok(12.4))),
            memory: Box::new(FixedMemory(Ok(4096))),
            gpu: None,
            audio: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn poll_maps_values() {
        let mut collector = MetricsCollector::new(healthy_sources());
        let snap = collector.poll();

        assert_eq!(snap.battery_percent, Reading::Value(87));
        assert_eq!(snap.battery_remaining, Reading::Value(BatteryRemaining::Seconds(5400)));
        assert!(!snap.charging);
        assert_eq!(snap.cpu_percent, Reading::Value(12.4));
        assert_eq!(snap.available_ram_mb, Reading::Value(4096));
        assert_eq!(snap.gpu_vram_mb, None);
        assert_eq!(snap.audio_muted, None);
    }

    #[test]
    fn failing_sources_become_unavailable() {
        let mut sources = healthy_sources();
        sources.battery = Box::new(FixedBattery(Err(MetricsError::NotPresent("battery"))));
        sources.cpu = Box::new(FixedCpu(Err(MetricsError::query("cpu", "counter gone"))));
        sources.gpu = Some(Box::new(FixedGpu(Err(MetricsError::Unsupported("gpu")))));
        sources.audio = Some(Box::new(FixedAudio {
            output: Ok(true),
            input: Err(MetricsError::NotPresent("capture endpoint")),
        }));

        let snap = MetricsCollector::new(sources).poll();

        assert_eq!(snap.battery_percent, Reading::Unavailable);
        assert_eq!(snap.battery_remaining, Reading::Unavailable);
        assert_eq!(snap.cpu_percent, Reading::Unavailable);
        assert_eq!(snap.available_ram_mb, Reading::Value(4096));
        assert_eq!(snap.gpu_vram_mb, Some(Reading::Unavailable));
        assert_eq!(snap.audio_muted, Some(Reading::Value(true)));
        assert_eq!(snap.mic_muted, Some(Reading::Unavailable));
    }

    #[test]
    fn unknown_percent_is_unavailable() {
        let mut sources = healthy_sources();
        sources.battery = Box::new(FixedBattery(Ok(BatteryStatus {
            percent: None,
            remaining: BatteryRemaining::Unknown,
            charging: true,
        })));

        let snap = MetricsCollector::new(sources).poll();
        assert_eq!(snap.battery_percent, Reading::Unavailable);
        assert_eq!(snap.battery_remaining, Reading::Value(BatteryRemaining::Unknown));
        assert!(snap.charging);
    }

    #[test]
    fn released_collector_reports_unavailable() {
        let mut collector = MetricsCollector::new(healthy_sources());
        collector.release();
        assert_eq!(collector.poll(), MetricsSnapshot::unavailable());
    }

    #[test]
    fn reading_helpers() {
        assert_eq!(Reading::Value(6u64).value(), Some(&6));
        assert_eq!(Reading::<u8>::Unavailable.value(), None);
    }
}
