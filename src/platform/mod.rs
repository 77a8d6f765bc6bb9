//! OS window shell
//!
//! Only Windows has a real implementation; elsewhere [`run`] fails with
//! [`OverlayError::UnsupportedPlatform`].

use crate::config::OverlayConfig;
use crate::error::OverlayError;
use std::path::PathBuf;

#[cfg(windows)]
mod win32;

/// Create the overlay window and pump messages until it is closed
#[cfg(windows)]
pub fn run(config: OverlayConfig, data_dir: Option<PathBuf>) -> Result<(), OverlayError> {
    win32::run(config, data_dir)
}

#[cfg(not(windows))]
pub fn run(config: OverlayConfig, data_dir: Option<PathBuf>) -> Result<(), OverlayError> {
    let _ = (config, data_dir);
    Err(OverlayError::UnsupportedPlatform)
}
