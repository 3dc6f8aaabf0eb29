use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::data::items::group_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" => LogLevel::Off,
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    pub fn as_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Trace => Some(tracing::Level::TRACE),
        }
    }
}

/// Rounding applied to the displayed health percentage.
///
/// The default rounds up; a battery reading 83.2% shows as 84%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyMode {
    /// Keep two decimal places, trailing zeros trimmed.
    Keep,
    #[default]
    Ceiling,
    Round,
    Floor,
}

impl AccuracyMode {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "keep" => AccuracyMode::Keep,
            "round" => AccuracyMode::Round,
            "floor" => AccuracyMode::Floor,
            _ => AccuracyMode::Ceiling,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccuracyMode::Keep => "Keep",
            AccuracyMode::Ceiling => "Ceiling",
            AccuracyMode::Round => "Round",
            AccuracyMode::Floor => "Floor",
        }
    }
}

/// When an automatic history sample should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordPolicy {
    /// New day, cycle count change, or nominal capacity change.
    #[default]
    Automatic,
    /// Cycle count or nominal capacity change only.
    DataChanged,
    /// Calendar day boundary only.
    EveryDay,
    /// Only explicit user-requested samples.
    Manual,
}

impl RecordPolicy {
    /// Tag stored in the history table's recordType column.
    pub fn record_type_code(&self) -> i64 {
        match self {
            RecordPolicy::Automatic => 1,
            RecordPolicy::DataChanged => 2,
            RecordPolicy::EveryDay => 3,
            RecordPolicy::Manual => 4,
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "datachanged" | "data-changed" => RecordPolicy::DataChanged,
            "everyday" | "every-day" => RecordPolicy::EveryDay,
            "manual" => RecordPolicy::Manual,
            _ => RecordPolicy::Automatic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RecordPolicy::Automatic => "Automatic",
            RecordPolicy::DataChanged => "Data changed",
            RecordPolicy::EveryDay => "Every day",
            RecordPolicy::Manual => "Manual",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    pub enabled: bool,
    pub policy: RecordPolicy,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            policy: RecordPolicy::Automatic,
        }
    }
}

/// When the widget snapshot file is rewritten and a timeline reload requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WidgetRefreshPolicy {
    #[default]
    DataChanged,
    EveryTime,
    /// Persist the snapshot but never request a reload.
    Manual,
    /// At most once every five minutes.
    FixedInterval,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub enabled: bool,
    pub refresh: WidgetRefreshPolicy,
    /// Bundle identifier marker used to recognize the widget's container.
    pub bundle_identifier: String,
    /// Cached widget sandbox container paths, revalidated before each write.
    pub sandbox_paths: Vec<String>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            refresh: WidgetRefreshPolicy::DataChanged,
            bundle_identifier: "com.developlab.batinfo.widget".to_string(),
            sandbox_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub language: String,
    pub accuracy: AccuracyMode,
    pub auto_refresh: bool,
    pub refresh_secs: u64,
    pub force_show_charging_data: bool,
    pub show_settings_battery_info: bool,
    /// Estimate the OS health panel's refresh date from history rows.
    pub use_history_for_refresh_date: bool,
    /// Path of the privileged helper that reads the OS health numbers.
    pub settings_helper_path: String,
    pub home_group_sequence: Vec<i64>,
    pub recording: RecordingConfig,
    pub widget: WidgetConfig,
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "system".to_string(),
            accuracy: AccuracyMode::Ceiling,
            auto_refresh: true,
            refresh_secs: 3,
            force_show_charging_data: false,
            show_settings_battery_info: false,
            use_history_for_refresh_date: true,
            settings_helper_path: "/usr/local/libexec/batinfo-settings-helper".to_string(),
            home_group_sequence: default_home_sequence(),
            recording: RecordingConfig::default(),
            widget: WidgetConfig::default(),
            log_level: LogLevel::Info,
        }
    }
}

fn default_home_sequence() -> Vec<i64> {
    vec![
        group_id::BASIC,
        group_id::CHARGE,
        group_id::SETTINGS_BATTERY,
    ]
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("batinfo")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("batinfo")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn ensure_dirs() -> std::io::Result<()> {
    fs::create_dir_all(config_dir())?;
    fs::create_dir_all(data_dir())?;
    Ok(())
}

impl Settings {
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let _ = ensure_dirs();
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(config_path(), content)
    }

    /// Home view group order. Empty or duplicated stored sequences fall back
    /// to the default order, and a duplicated stored value is cleared.
    pub fn effective_home_sequence(&mut self) -> Vec<i64> {
        if self.home_group_sequence.is_empty() {
            return default_home_sequence();
        }

        let unique: std::collections::HashSet<_> = self.home_group_sequence.iter().collect();
        if unique.len() != self.home_group_sequence.len() {
            self.home_group_sequence = Vec::new();
            let _ = self.save();
            return default_home_sequence();
        }

        self.home_group_sequence.clone()
    }

    pub fn set_home_group_sequence(&mut self, sequence: Vec<i64>) {
        let unique: std::collections::HashSet<_> = sequence.iter().collect();
        if sequence.is_empty() || unique.len() != sequence.len() {
            return;
        }
        self.home_group_sequence = sequence;
        let _ = self.save();
    }

    pub fn set_recording_enabled(&mut self, enabled: bool) {
        self.recording.enabled = enabled;
        let _ = self.save();
    }

    pub fn set_record_policy(&mut self, policy: RecordPolicy) {
        self.recording.policy = policy;
        let _ = self.save();
    }

    pub fn set_widget_enabled(&mut self, enabled: bool) {
        self.widget.enabled = enabled;
        if !enabled {
            self.widget.sandbox_paths.clear();
        }
        let _ = self.save();
    }

    pub fn set_widget_sandbox_paths(&mut self, paths: Vec<String>) {
        self.widget.sandbox_paths = paths;
        let _ = self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_shipping_behavior() {
        let settings = Settings::default();
        assert_eq!(settings.accuracy, AccuracyMode::Ceiling);
        assert!(settings.recording.enabled);
        assert_eq!(settings.recording.policy, RecordPolicy::Automatic);
        assert_eq!(settings.widget.refresh, WidgetRefreshPolicy::DataChanged);
        assert_eq!(settings.refresh_secs, 3);
    }

    #[test]
    fn empty_sequence_falls_back_to_default_order() {
        let mut settings = Settings {
            home_group_sequence: Vec::new(),
            ..Settings::default()
        };
        assert_eq!(
            settings.effective_home_sequence(),
            vec![group_id::BASIC, group_id::CHARGE, group_id::SETTINGS_BATTERY]
        );
    }

    #[test]
    fn duplicated_sequence_is_cleared_and_defaulted() {
        let mut settings = Settings {
            home_group_sequence: vec![2, 2, 1],
            ..Settings::default()
        };
        let sequence = settings.effective_home_sequence();
        assert_eq!(
            sequence,
            vec![group_id::BASIC, group_id::CHARGE, group_id::SETTINGS_BATTERY]
        );
        assert!(settings.home_group_sequence.is_empty());
    }

    #[test]
    fn set_sequence_rejects_duplicates() {
        let mut settings = Settings::default();
        settings.set_home_group_sequence(vec![1, 1]);
        assert_eq!(settings.home_group_sequence, default_home_sequence());

        settings.set_home_group_sequence(vec![2, 1, 3]);
        assert_eq!(settings.home_group_sequence, vec![2, 1, 3]);
    }

    #[test]
    fn record_type_codes_are_stable() {
        // Persisted in existing databases; the mapping can never change.
        assert_eq!(RecordPolicy::Automatic.record_type_code(), 1);
        assert_eq!(RecordPolicy::DataChanged.record_type_code(), 2);
        assert_eq!(RecordPolicy::EveryDay.record_type_code(), 3);
        assert_eq!(RecordPolicy::Manual.record_type_code(), 4);
    }

    #[test]
    fn settings_round_trip_through_toml() {
        let settings = Settings::default();
        let text = toml::to_string_pretty(&settings).expect("serialize");
        let parsed: Settings = toml::from_str(&text).expect("parse");
        assert_eq!(parsed.accuracy, settings.accuracy);
        assert_eq!(parsed.home_group_sequence, settings.home_group_sequence);
        assert_eq!(
            parsed.widget.bundle_identifier,
            settings.widget.bundle_identifier
        );
    }
}
