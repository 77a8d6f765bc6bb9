//! CPU and memory via sysinfo
//!
//! CPU usage is a delta between two refreshes, so one `System` is shared
//! by the CPU and memory sources and primed once on creation. Until
//! sysinfo's minimum update interval has passed since priming, the CPU
//! source reports [`MetricsError::NotReady`].

use super::{CpuSource, MemorySource, MetricsError};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};

const BYTES_PER_MB: u64 = 1024 * 1024;

#[derive(Clone)]
pub struct SharedSystem {
    inner: Arc<Mutex<System>>,
    primed_at: Instant,
}

impl SharedSystem {
    pub fn new() -> Self {
        let mut system = System::new();
        // Baseline sample so the first real poll has a delta to work with
        system.refresh_cpu();
        Self {
            inner: Arc::new(Mutex::new(system)),
            primed_at: Instant::now(),
        }
    }

    fn cpu_ready(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.primed_at) >= MINIMUM_CPU_UPDATE_INTERVAL
    }
}

impl Default for SharedSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSource for SharedSystem {
    fn cpu_percent(&mut self) -> Result<f32, MetricsError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MetricsError::Unsupported("cpu"));
        }
        if !self.cpu_ready(Instant::now()) {
            return Err(MetricsError::NotReady("cpu"));
        }

        let mut system = self.inner.lock();
        system.refresh_cpu();
        let usage = system.global_cpu_info().cpu_usage();
        if usage.is_finite() {
            Ok(usage.clamp(0.0, 100.0))
        } else {
            Err(MetricsError::query("cpu", "non-finite usage"))
        }
    }
}

impl MemorySource for SharedSystem {
    fn available_mb(&mut self) -> Result<u64, MetricsError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(MetricsError::Unsupported("memory"));
        }

        let mut system = self.inner.lock();
        system.refresh_memory();
        if system.total_memory() == 0 {
            return Err(MetricsError::NotPresent("memory counter"));
        }
        Ok(system.available_memory() / BYTES_PER_MB)
    }
}
