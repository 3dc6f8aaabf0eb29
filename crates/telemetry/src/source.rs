//! Telemetry sources: where the raw battery dictionary comes from.

use std::io::Cursor;
use std::process::Command;

use plist::{Dictionary, Value};
use tracing::warn;

use crate::raw::RawBatteryInfo;

/// Strategy for fetching the raw telemetry dictionary.
///
/// A fetch that fails returns `None`; sources never surface errors to the
/// caller beyond a log line.
pub trait TelemetrySource {
    /// Human-readable name of the data source, shown in the UI footer.
    fn name(&self) -> &str;

    /// Whether this source also covers the OS settings battery health data.
    fn includes_settings_battery_info(&self) -> bool {
        false
    }

    fn fetch_raw(&self) -> Option<Dictionary>;

    fn fetch(&self) -> Option<RawBatteryInfo> {
        self.fetch_raw().map(|dict| RawBatteryInfo::from_dict(&dict))
    }
}

/// Reads the smart-battery service properties from the IO registry by
/// shelling out to `ioreg` and parsing its plist output.
pub struct IoRegSource;

const IOREG_BATTERY_CLASS: &str = "AppleSmartBattery";

impl IoRegSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for IoRegSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetrySource for IoRegSource {
    fn name(&self) -> &str {
        "IORegistry"
    }

    fn includes_settings_battery_info(&self) -> bool {
        true
    }

    fn fetch_raw(&self) -> Option<Dictionary> {
        let output = match Command::new("ioreg")
            .args(["-a", "-r", "-c", IOREG_BATTERY_CLASS])
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                warn!("failed to spawn ioreg: {}", e);
                return None;
            }
        };

        if !output.status.success() || output.stdout.is_empty() {
            warn!(status = ?output.status, "ioreg returned no battery data");
            return None;
        }

        let value = match Value::from_reader(Cursor::new(output.stdout)) {
            Ok(value) => value,
            Err(e) => {
                warn!("failed to parse ioreg plist output: {}", e);
                return None;
            }
        };

        // ioreg -r returns an array of matched services; the device has a
        // single battery, so the first entry is the one.
        match value {
            Value::Array(entries) => entries.into_iter().find_map(|v| match v {
                Value::Dictionary(dict) => Some(dict),
                _ => None,
            }),
            Value::Dictionary(dict) => Some(dict),
            _ => None,
        }
    }
}

/// A fixed in-memory dictionary, for tests and composition without hardware.
pub struct StaticSource {
    name: String,
    dict: Dictionary,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, dict: Dictionary) -> Self {
        Self {
            name: name.into(),
            dict,
        }
    }

    /// Source that reports no telemetry at all.
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Dictionary::new())
    }
}

impl TelemetrySource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_raw(&self) -> Option<Dictionary> {
        if self.dict.is_empty() {
            None
        } else {
            Some(self.dict.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_source_round_trips_its_dictionary() {
        let mut dict = Dictionary::new();
        dict.insert("CycleCount".into(), Value::Integer(42.into()));
        let source = StaticSource::new("test", dict);

        let info = source.fetch().expect("fetch");
        assert_eq!(info.cycle_count, Some(42));
        assert_eq!(source.name(), "test");
    }

    #[test]
    fn empty_static_source_yields_nothing() {
        let source = StaticSource::empty("test");
        assert!(source.fetch_raw().is_none());
        assert!(source.fetch().is_none());
    }
}
