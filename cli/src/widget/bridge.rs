//! Writing and reading the widget snapshot file.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, warn};

use crate::config::{WidgetConfig, WidgetRefreshPolicy};
use crate::widget::locator::SnapshotLocator;
use crate::widget::{WidgetSnapshot, SNAPSHOT_FILE_NAME};

const SNAPSHOT_SUBDIR: &str = "Library/Preferences";
const FRESH_WINDOW_SECS: i64 = 5 * 60;
const STALE_RECHECK_SECS: u64 = 45 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// A snapshot file was written to at least one candidate container.
    pub persisted: bool,
    /// The widget timeline should be asked to reload.
    pub reload_requested: bool,
}

impl SyncOutcome {
    pub const SKIPPED: SyncOutcome = SyncOutcome {
        persisted: false,
        reload_requested: false,
    };
}

/// What the widget should do after inspecting its snapshot's age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshSuggestion {
    Fresh,
    /// The app has not refreshed the file recently; back off instead of
    /// polling a file nobody is updating.
    Stale,
}

impl RefreshSuggestion {
    pub fn recheck_after_secs(&self) -> u64 {
        match self {
            RefreshSuggestion::Fresh => FRESH_WINDOW_SECS as u64,
            RefreshSuggestion::Stale => STALE_RECHECK_SECS,
        }
    }
}

pub struct WidgetBridge {
    locator: Box<dyn SnapshotLocator>,
    config: WidgetConfig,
}

impl WidgetBridge {
    pub fn new(locator: Box<dyn SnapshotLocator>, config: WidgetConfig) -> Self {
        Self { locator, config }
    }

    pub fn candidates(&self) -> Vec<PathBuf> {
        self.locator.candidates()
    }

    /// Write the snapshot to every candidate container, honoring the master
    /// switch and the refresh policy. A policy that decides nothing needs
    /// writing yields [`SyncOutcome::SKIPPED`].
    pub fn publish(&self, snapshot: &WidgetSnapshot) -> SyncOutcome {
        if !self.config.enabled {
            return SyncOutcome::SKIPPED;
        }

        let candidates = self.locator.candidates();
        if candidates.is_empty() {
            debug!("no widget containers found, nothing to publish");
            return SyncOutcome::SKIPPED;
        }

        let existing = self.read_from(&candidates);
        let (write, reload) = match self.config.refresh {
            WidgetRefreshPolicy::EveryTime => (true, true),
            WidgetRefreshPolicy::Manual => (true, false),
            WidgetRefreshPolicy::DataChanged => {
                let changed = existing.as_ref().map_or(true, |old| {
                    old.maximum_capacity != snapshot.maximum_capacity
                        || old.cycle_count != snapshot.cycle_count
                });
                (changed, changed)
            }
            WidgetRefreshPolicy::FixedInterval => {
                let due = existing.as_ref().map_or(true, |old| {
                    snapshot.update_time_stamp - old.update_time_stamp >= FRESH_WINDOW_SECS
                });
                (due, due)
            }
        };

        if !write {
            return SyncOutcome::SKIPPED;
        }

        let mut persisted = false;
        for candidate in &candidates {
            match write_snapshot(candidate, snapshot) {
                Ok(path) => {
                    debug!(path = %path.display(), "published widget snapshot");
                    persisted = true;
                }
                Err(e) => {
                    warn!(container = %candidate.display(), "widget snapshot write failed: {}", e);
                }
            }
        }

        SyncOutcome {
            persisted,
            reload_requested: persisted && reload,
        }
    }

    /// The current snapshot, from the first candidate that has a readable one.
    pub fn read(&self) -> Option<WidgetSnapshot> {
        self.read_from(&self.locator.candidates())
    }

    fn read_from(&self, candidates: &[PathBuf]) -> Option<WidgetSnapshot> {
        candidates.iter().find_map(|candidate| {
            let path = snapshot_path(candidate);
            plist::from_file(&path).ok()
        })
    }

    /// Judge snapshot age against the current clock.
    pub fn staleness(&self, snapshot: &WidgetSnapshot) -> RefreshSuggestion {
        Self::staleness_at(snapshot, Local::now().timestamp())
    }

    pub fn staleness_at(snapshot: &WidgetSnapshot, now: i64) -> RefreshSuggestion {
        // Timestamp zero means the file was never really populated.
        if snapshot.update_time_stamp == 0 || now - snapshot.update_time_stamp > FRESH_WINDOW_SECS {
            RefreshSuggestion::Stale
        } else {
            RefreshSuggestion::Fresh
        }
    }
}

fn snapshot_path(candidate: &Path) -> PathBuf {
    candidate.join(SNAPSHOT_SUBDIR).join(SNAPSHOT_FILE_NAME)
}

fn write_snapshot(candidate: &Path, snapshot: &WidgetSnapshot) -> std::io::Result<PathBuf> {
    let dir = candidate.join(SNAPSHOT_SUBDIR);
    std::fs::create_dir_all(&dir)?;

    let path = dir.join(SNAPSHOT_FILE_NAME);
    let mut buf = Vec::new();
    plist::to_writer_xml(&mut buf, snapshot)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    std::fs::write(&path, buf)?;
    Ok(path)
}
