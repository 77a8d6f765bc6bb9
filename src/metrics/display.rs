//! Snapshot to overlay text

use super::battery::remaining_text;
use super::{MetricsSnapshot, Reading};

/// Shown in place of any value whose source is unavailable
pub const PLACEHOLDER: &str = "N/A";

fn or_placeholder<T>(reading: &Reading<T>, f: impl FnOnce(&T) -> String) -> String {
    reading.value().map_or_else(|| PLACEHOLDER.to_string(), f)
}

fn mute_label(reading: &Reading<bool>) -> String {
    or_placeholder(reading, |muted| {
        let label = if *muted { "Muted" } else { "On" };
        label.to_string()
    })
}

fn battery_line(snapshot: &MetricsSnapshot) -> String {
    let percent = or_placeholder(&snapshot.battery_percent, |p| format!("{}%", p));
    match snapshot.battery_remaining {
        Reading::Value(remaining) => format!(
            "Battery: {} ({})",
            percent,
            remaining_text(remaining, snapshot.charging)
        ),
        Reading::Unavailable => format!("Battery: {}", percent),
    }
}

/// One line per metric, newline separated
pub fn display_text(snapshot: &MetricsSnapshot) -> String {
    let mut lines = vec![
        battery_line(snapshot),
        format!(
            "CPU: {}",
            or_placeholder(&snapshot.cpu_percent, |c| format!("{:.0}%", c))
        ),
        format!(
            "RAM: {}",
            or_placeholder(&snapshot.available_ram_mb, |mb| format!("{} MB free", mb))
        ),
    ];

    if let Some(gpu) = &snapshot.gpu_vram_mb {
        lines.push(format!(
            "GPU: {}",
            or_placeholder(gpu, |mb| format!("{} MB", mb))
        ));
    }

    if snapshot.audio_muted.is_some() || snapshot.mic_muted.is_some() {
        let speaker = snapshot
            .audio_muted
            .as_ref()
            .map_or_else(|| PLACEHOLDER.to_string(), mute_label);
        let mic = snapshot
            .mic_muted
            .as_ref()
            .map_or_else(|| PLACEHOLDER.to_string(), mute_label);
        lines.push(format!("Audio: {}  Mic: {}", speaker, mic));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::BatteryRemaining;

    fn snapshot() -> MetricsSnapshot {
        MetricsSnapshot {
            battery_percent: Reading::Value(87),
            battery_remaining: Reading::Value(BatteryRemaining::Seconds(5400)),
            charging: false,
            cpu_percent: Reading::Value(12.4),
            available_ram_mb: Reading::Value(4096),
            gpu_vram_mb: None,
            audio_muted: None,
            mic_muted: None,
        }
    }

    #[test]
    fn renders_all_lines() {
        assert_eq!(
            display_text(&snapshot()),
            "Battery: 87% (1h 30m remaining)\nCPU: 12%\nRAM: 4096 MB free"
        );
    }

    #[test]
    fn short_remaining_time() {
        let mut snap = snapshot();
        snap.battery_remaining = Reading::Value(BatteryRemaining::Seconds(900));
        assert!(display_text(&snap).starts_with("Battery: 87% (15m remaining)\n"));
    }

    #[test]
    fn unknown_remaining_while_charging() {
        let mut snap = snapshot();
        snap.battery_remaining = Reading::Value(BatteryRemaining::Unknown);
        snap.charging = true;
        assert!(display_text(&snap).starts_with("Battery: 87% (Charging)"));

        snap.charging = false;
        assert!(display_text(&snap).starts_with("Battery: 87% (Calculating...)"));
    }

    #[test]
    fn unavailable_values_use_placeholder() {
        let text = display_text(&MetricsSnapshot::unavailable());
        assert_eq!(text, "Battery: N/A\nCPU: N/A\nRAM: N/A");
        assert!(!text.is_empty());
    }

    #[test]
    fn optional_gpu_and_audio_lines() {
        let mut snap = snapshot();
        snap.gpu_vram_mb = Some(Reading::Value(512));
        snap.audio_muted = Some(Reading::Value(true));
        snap.mic_muted = Some(Reading::Unavailable);

        let text = display_text(&snap);
        assert!(text.contains("\nGPU: 512 MB\n"));
        assert!(text.ends_with("Audio: Muted  Mic: N/A"));

        snap.gpu_vram_mb = Some(Reading::Unavailable);
        assert!(display_text(&snap).contains("GPU: N/A"));
    }
}
