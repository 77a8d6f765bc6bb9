//! Battery overlay process
//! Usage: battery_overlay.exe [config.json]

#![windows_subsystem = "windows"]

use anyhow::Result;
use battery_overlay::config::{get_data_directory, load_config, load_config_from};
use battery_overlay::{logging, platform};
use std::env;
use std::path::PathBuf;
use tracing::{error, info};

fn main() -> Result<()> {
    let config = match env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => load_config_from(&path),
        None => load_config(),
    };

    let data_dir = get_data_directory().ok();
    let _log_guard = logging::init(config.debug_logging, data_dir.as_deref());

    info!("Battery overlay starting (hotkey {})", config.hotkey);

    if let Err(e) = platform::run(config, data_dir) {
        error!("Overlay failed: {}", e);
        return Err(e.into());
    }

    info!("Battery overlay exiting");
    Ok(())
}
