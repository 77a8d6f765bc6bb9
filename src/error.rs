//! Errors that stop the overlay from running at all
//!
//! Everything else (metrics, position storage, hotkey registration) is
//! recovered locally and only logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("failed to register window class: {0}")]
    WindowClass(String),
    #[error("failed to create overlay window: {0}")]
    WindowCreation(String),
    #[error("the overlay window is only supported on Windows")]
    UnsupportedPlatform,
}
