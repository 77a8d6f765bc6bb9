//! Window position persistence
//!
//! The last window position is stored either as a two-line text file
//! (`x` then `y`) or as two registry values under
//! `HKCU\Software\BatteryOverlay`. Reads fall back to a default position
//! and writes are best-effort: neither ever stops the overlay.

use crate::config::{PositionBackend, PositionConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const POSITION_FILE: &str = "position.txt";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("position file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed position data: {0}")]
    Malformed(String),
    #[error("registry access failed: {0}")]
    Registry(String),
    #[error("registry storage is only available on Windows")]
    Unsupported,
}

/// Storage for the last window position
pub trait PositionStore: Send {
    fn load(&self) -> Result<Position, PositionError>;
    fn save(&self, position: Position) -> Result<(), PositionError>;
}

/// Two-line text file: X on the first line, Y on the second
pub struct TextFileStore {
    path: PathBuf,
}

impl TextFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for TextFileStore {
    fn load(&self) -> Result<Position, PositionError> {
        let contents = fs::read_to_string(&self.path)?;
        parse_lines(&contents)
    }

    fn save(&self, position: Position) -> Result<(), PositionError> {
        fs::write(&self.path, format!("{}\n{}\n", position.x, position.y))?;
        Ok(())
    }
}

fn parse_lines(contents: &str) -> Result<Position, PositionError> {
    let mut lines = contents.lines().map(str::trim).filter(|l| !l.is_empty());

    let mut next = |axis: &str| -> Result<i32, PositionError> {
        let line = lines
            .next()
            .ok_or_else(|| PositionError::Malformed(format!("missing {} line", axis)))?;
        line.parse()
            .map_err(|_| PositionError::Malformed(format!("invalid {} value {:?}", axis, line)))
    };

    let x = next("x")?;
    let y = next("y")?;
    Ok(Position { x, y })
}

/// Two DWORD values `X` and `Y` under `HKCU\<subkey>`
pub struct RegistryStore {
    #[cfg_attr(not(windows), allow(dead_code))]
    subkey: String,
}

impl RegistryStore {
    pub const DEFAULT_SUBKEY: &'static str = r"Software\BatteryOverlay";

    pub fn new(subkey: impl Into<String>) -> Self {
        Self {
            subkey: subkey.into(),
        }
    }
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUBKEY)
    }
}

#[cfg(windows)]
impl PositionStore for RegistryStore {
    fn load(&self) -> Result<Position, PositionError> {
        let x = registry::read_dword(&self.subkey, "X")?;
        let y = registry::read_dword(&self.subkey, "Y")?;
        // Stored as the two's complement bit pattern so negative coordinates survive
        Ok(Position {
            x: x as i32,
            y: y as i32,
        })
    }

    fn save(&self, position: Position) -> Result<(), PositionError> {
        registry::write_dwords(&self.subkey, &[("X", position.x as u32), ("Y", position.y as u32)])
    }
}

#[cfg(not(windows))]
impl PositionStore for RegistryStore {
    fn load(&self) -> Result<Position, PositionError> {
        Err(PositionError::Unsupported)
    }

    fn save(&self, _position: Position) -> Result<(), PositionError> {
        Err(PositionError::Unsupported)
    }
}

#[cfg(windows)]
mod registry {
    use super::PositionError;
    use windows::core::PCWSTR;
    use windows::Win32::System::Registry::{
        RegCloseKey, RegCreateKeyExW, RegGetValueW, RegSetValueExW, HKEY, HKEY_CURRENT_USER,
        KEY_WRITE, REG_DWORD, REG_OPTION_NON_VOLATILE, RRF_RT_REG_DWORD,
    };

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(Some(0)).collect()
    }

    pub fn read_dword(subkey: &str, name: &str) -> Result<u32, PositionError> {
        let subkey_w = wide(subkey);
        let name_w = wide(name);
        let mut value: u32 = 0;
        let mut size = std::mem::size_of::<u32>() as u32;

        unsafe {
            RegGetValueW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey_w.as_ptr()),
                PCWSTR(name_w.as_ptr()),
                RRF_RT_REG_DWORD,
                None,
                Some(&mut value as *mut u32 as *mut std::ffi::c_void),
                Some(&mut size),
            )
            .ok()
            .map_err(|e| PositionError::Registry(format!("read {}: {}", name, e)))?;
        }

        Ok(value)
    }

    pub fn write_dwords(subkey: &str, values: &[(&str, u32)]) -> Result<(), PositionError> {
        let subkey_w = wide(subkey);
        let mut hkey = HKEY::default();

        unsafe {
            RegCreateKeyExW(
                HKEY_CURRENT_USER,
                PCWSTR(subkey_w.as_ptr()),
                0,
                PCWSTR::null(),
                REG_OPTION_NON_VOLATILE,
                KEY_WRITE,
                None,
                &mut hkey,
                None,
            )
            .ok()
            .map_err(|e| PositionError::Registry(format!("create key: {}", e)))?;

            let mut result = Ok(());
            for (name, value) in values {
                let name_w = wide(name);
                let bytes = value.to_le_bytes();
                if let Err(e) =
                    RegSetValueExW(hkey, PCWSTR(name_w.as_ptr()), 0, REG_DWORD, Some(&bytes)).ok()
                {
                    result = Err(PositionError::Registry(format!("write {}: {}", name, e)));
                    break;
                }
            }

            let _ = RegCloseKey(hkey);
            result
        }
    }
}

/// Build the store selected in config
pub fn open_store(config: &PositionConfig, data_dir: &Path) -> Box<dyn PositionStore> {
    match config.backend {
        PositionBackend::File => Box::new(TextFileStore::new(data_dir.join(POSITION_FILE))),
        PositionBackend::Registry => Box::new(RegistryStore::default()),
    }
}

/// The store to use, or `None` when persistence is off or the file backend
/// has no data directory
pub fn store_for(config: &PositionConfig, data_dir: Option<&Path>) -> Option<Box<dyn PositionStore>> {
    if !config.persist {
        return None;
    }

    match (config.backend, data_dir) {
        (_, Some(dir)) => Some(open_store(config, dir)),
        (PositionBackend::Registry, None) => Some(Box::new(RegistryStore::default())),
        (PositionBackend::File, None) => {
            warn!("No data directory, window position will not be persisted");
            None
        }
    }
}

/// Read the persisted position, or `default` if it cannot be read
pub fn load_or_default(store: &dyn PositionStore, default: Position) -> Position {
    match store.load() {
        Ok(position) => {
            debug!("Restored window position ({}, {})", position.x, position.y);
            position
        }
        Err(e) => {
            warn!("Using default window position: {}", e);
            default
        }
    }
}

/// Persist the position, logging and ignoring failures
pub fn save_best_effort(store: &dyn PositionStore, position: Position) {
    match store.save(position) {
        Ok(()) => debug!("Saved window position ({}, {})", position.x, position.y),
        Err(e) => warn!("Failed to save window position: {}", e),
    }
}
