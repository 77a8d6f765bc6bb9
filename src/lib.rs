//! Battery Overlay Library
//!
//! Always-on-top battery/CPU/RAM readout for Windows, toggled by a global
//! hotkey or by dragging down from the top edge of the screen.

pub mod config;
pub mod error;
pub mod gesture;
pub mod hotkey;
pub mod logging;
pub mod metrics;
pub mod overlay;
pub mod platform;
pub mod position;
