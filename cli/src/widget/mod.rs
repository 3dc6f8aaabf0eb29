//! Widget snapshot bridge.
//!
//! The widget process cannot read the battery service itself, so the app
//! drops a small plist into the widget's sandbox container and the widget
//! renders whatever it finds there.

pub mod bridge;
pub mod locator;

use serde::{Deserialize, Serialize};

pub use bridge::{RefreshSuggestion, SyncOutcome, WidgetBridge};
pub use locator::{FixedLocator, PluginKitLocator, SnapshotLocator};

pub const SNAPSHOT_FILE_NAME: &str = "BatteryData.plist";

/// Data handed to the widget. Field names are the plist keys the widget
/// decodes; they cannot change without shipping a new widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetSnapshot {
    #[serde(rename = "maximumCapacity")]
    pub maximum_capacity: String,
    #[serde(rename = "cycleCount")]
    pub cycle_count: i64,
    /// Human-readable variant of the timestamp, rendered by the widget as-is.
    #[serde(rename = "updateDate")]
    pub update_date: String,
    #[serde(rename = "updateTimeStamp")]
    pub update_time_stamp: i64,
}

impl WidgetSnapshot {
    pub fn new(maximum_capacity: impl Into<String>, cycle_count: i64, timestamp: i64) -> Self {
        Self {
            maximum_capacity: maximum_capacity.into(),
            cycle_count,
            update_date: crate::data::format::format_timestamp(timestamp),
            update_time_stamp: timestamp,
        }
    }
}
