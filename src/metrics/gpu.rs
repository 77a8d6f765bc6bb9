//! Dedicated GPU memory in use, from the primary DXGI adapter

use super::{GpuSource, MetricsError};

pub struct AdapterMemorySource;

#[cfg(windows)]
impl GpuSource for AdapterMemorySource {
    fn dedicated_used_mb(&mut self) -> Result<u64, MetricsError> {
        use windows::core::Interface;
        use windows::Win32::Graphics::Dxgi::{
            CreateDXGIFactory1, IDXGIAdapter3, IDXGIFactory1, DXGI_MEMORY_SEGMENT_GROUP_LOCAL,
            DXGI_QUERY_VIDEO_MEMORY_INFO,
        };

        unsafe {
            let factory: IDXGIFactory1 =
                CreateDXGIFactory1().map_err(|e| MetricsError::query("gpu", e))?;
            let adapter = factory
                .EnumAdapters1(0)
                .map_err(|_| MetricsError::NotPresent("gpu adapter"))?;
            let adapter: IDXGIAdapter3 = adapter
                .cast()
                .map_err(|_| MetricsError::Unsupported("gpu memory query"))?;

            let mut info = DXGI_QUERY_VIDEO_MEMORY_INFO::default();
            adapter
                .QueryVideoMemoryInfo(0, DXGI_MEMORY_SEGMENT_GROUP_LOCAL, &mut info)
                .map_err(|e| MetricsError::query("gpu", e))?;

            Ok(info.CurrentUsage / (1024 * 1024))
        }
    }
}

#[cfg(not(windows))]
impl GpuSource for AdapterMemorySource {
    fn dedicated_used_mb(&mut self) -> Result<u64, MetricsError> {
        Err(MetricsError::Unsupported("gpu"))
    }
}
