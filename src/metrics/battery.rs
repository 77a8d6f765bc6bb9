//! Battery status
//!
//! On Windows the status comes from `GetSystemPowerStatus`, whose
//! "unknown" sentinels (255 for bytes, `u32::MAX` for seconds) map onto
//! `None` / [`BatteryRemaining::Unknown`].

use super::MetricsError;

const UNKNOWN_BYTE: u8 = 255;
const UNKNOWN_SECONDS: u32 = u32::MAX;
const FLAG_CHARGING: u8 = 8;
const FLAG_NO_BATTERY: u8 = 128;
const AC_ONLINE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryRemaining {
    Seconds(u32),
    /// The OS cannot estimate yet, or the machine is on AC power
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryStatus {
    pub percent: Option<u8>,
    pub remaining: BatteryRemaining,
    /// Charging or running on AC power
    pub charging: bool,
}

impl BatteryStatus {
    /// Build from the raw `SYSTEM_POWER_STATUS` fields
    pub fn from_raw(
        ac_line_status: u8,
        battery_flag: u8,
        life_percent: u8,
        life_time: u32,
    ) -> Result<Self, MetricsError> {
        if battery_flag != UNKNOWN_BYTE && battery_flag & FLAG_NO_BATTERY != 0 {
            return Err(MetricsError::NotPresent("battery"));
        }

        let percent = (life_percent <= 100).then_some(life_percent);
        let remaining = if life_time == UNKNOWN_SECONDS {
            BatteryRemaining::Unknown
        } else {
            BatteryRemaining::Seconds(life_time)
        };
        let charging = ac_line_status == AC_ONLINE
            || (battery_flag != UNKNOWN_BYTE && battery_flag & FLAG_CHARGING != 0);

        Ok(BatteryStatus {
            percent,
            remaining,
            charging,
        })
    }
}

pub trait BatterySource: Send {
    fn battery(&mut self) -> Result<BatteryStatus, MetricsError>;
}

/// `"1h 30m remaining"`, or `"15m remaining"` under an hour
pub fn format_remaining(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m remaining", hours, minutes)
    } else {
        format!("{}m remaining", minutes)
    }
}

/// Human text for the time part of the battery line
pub fn remaining_text(remaining: BatteryRemaining, charging: bool) -> String {
    match remaining {
        BatteryRemaining::Seconds(s) => format_remaining(s),
        BatteryRemaining::Unknown if charging => "Charging".to_string(),
        BatteryRemaining::Unknown => "Calculating...".to_string(),
    }
}

/// Reads the system power status
pub struct PowerStatusSource;

#[cfg(windows)]
impl BatterySource for PowerStatusSource {
    fn battery(&mut self) -> Result<BatteryStatus, MetricsError> {
        use windows::Win32::System::Power::{GetSystemPowerStatus, SYSTEM_POWER_STATUS};

        let mut status = SYSTEM_POWER_STATUS::default();
        unsafe { GetSystemPowerStatus(&mut status) }
            .map_err(|e| MetricsError::query("battery", e))?;

        BatteryStatus::from_raw(
            status.ACLineStatus,
            status.BatteryFlag,
            status.BatteryLifePercent,
            status.BatteryLifeTime,
        )
    }
}

#[cfg(not(windows))]
impl BatterySource for PowerStatusSource {
    fn battery(&mut self) -> Result<BatteryStatus, MetricsError> {
        Err(MetricsError::Unsupported("battery"))
    }
}
