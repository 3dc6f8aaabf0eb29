//! The OS settings app's own battery health numbers.
//!
//! Reading them requires root, so a small privileged helper prints them as
//! JSON on stdout and we cache the result; the figures only move when the OS
//! recomputes them, which is rare.

use std::process::Command;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CACHE_TTL: Duration = Duration::from_secs(6 * 3600);

/// Health data as the OS settings app reports it. Field names follow the
/// helper's JSON output verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsBatteryData {
    #[serde(rename = "CycleCount")]
    pub cycle_count: i64,
    #[serde(rename = "Maximum Capacity Percent")]
    pub maximum_capacity_percent: i64,
}

/// Where the settings health numbers come from. Production uses the helper
/// executable; tests inject a fixed value.
pub trait SettingsBatteryFetcher {
    fn fetch(&self) -> Option<SettingsBatteryData>;
}

/// Spawns the privileged helper and decodes its JSON stdout.
pub struct HelperFetcher {
    helper_path: String,
}

impl HelperFetcher {
    pub fn new(helper_path: impl Into<String>) -> Self {
        Self {
            helper_path: helper_path.into(),
        }
    }
}

impl SettingsBatteryFetcher for HelperFetcher {
    fn fetch(&self) -> Option<SettingsBatteryData> {
        let output = match Command::new(&self.helper_path).output() {
            Ok(output) => output,
            Err(e) => {
                warn!(helper = %self.helper_path, "failed to spawn settings helper: {}", e);
                return None;
            }
        };

        if !output.status.success() {
            warn!(status = ?output.status, "settings helper exited with failure");
            return None;
        }

        match serde_json::from_slice(&output.stdout) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("failed to decode settings helper output: {}", e);
                None
            }
        }
    }
}

/// A fixed value, for tests and composition without the helper installed.
pub struct StaticFetcher(pub Option<SettingsBatteryData>);

impl SettingsBatteryFetcher for StaticFetcher {
    fn fetch(&self) -> Option<SettingsBatteryData> {
        self.0.clone()
    }
}

/// Caches fetch results for six hours. A failed fetch keeps serving the
/// previous value rather than clearing it.
pub struct SettingsBatteryCache {
    fetcher: Box<dyn SettingsBatteryFetcher>,
    cached: Option<SettingsBatteryData>,
    fetched_at: Option<Instant>,
}

impl SettingsBatteryCache {
    pub fn new(fetcher: Box<dyn SettingsBatteryFetcher>) -> Self {
        Self {
            fetcher,
            cached: None,
            fetched_at: None,
        }
    }

    pub fn get(&mut self, force_refresh: bool) -> Option<SettingsBatteryData> {
        let fresh = matches!(self.fetched_at, Some(at) if at.elapsed() < CACHE_TTL);
        if fresh && !force_refresh {
            return self.cached.clone();
        }

        match self.fetcher.fetch() {
            Some(data) => {
                debug!(
                    cycle_count = data.cycle_count,
                    maximum_capacity_percent = data.maximum_capacity_percent,
                    "refreshed settings battery data"
                );
                self.cached = Some(data);
                self.fetched_at = Some(Instant::now());
            }
            None => {
                // Keep whatever we had; stale beats empty here.
                self.fetched_at = Some(Instant::now());
            }
        }

        self.cached.clone()
    }
}
