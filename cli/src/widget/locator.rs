//! Finding the widget's sandbox container.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

const PLUGINKIT_CONTAINER_ROOT: &str = "/var/mobile/Containers/Data/PluginKitPlugin";
const CONTAINER_METADATA_FILE: &str = ".com.apple.mobile_container_manager.metadata.plist";
const METADATA_IDENTIFIER_KEY: &str = "MCMMetadataIdentifier";

/// Yields candidate directories that may hold the widget's data container.
pub trait SnapshotLocator {
    fn candidates(&self) -> Vec<PathBuf>;
}

/// Scans the PluginKit container root for a sandbox whose container
/// metadata names the widget's bundle identifier. The sandbox UUID changes
/// across reinstalls, so the scan runs fresh each time it is asked.
pub struct PluginKitLocator {
    container_root: PathBuf,
    bundle_identifier: String,
}

impl PluginKitLocator {
    pub fn new(bundle_identifier: impl Into<String>) -> Self {
        Self::with_root(PLUGINKIT_CONTAINER_ROOT, bundle_identifier)
    }

    pub fn with_root(root: impl Into<PathBuf>, bundle_identifier: impl Into<String>) -> Self {
        Self {
            container_root: root.into(),
            bundle_identifier: bundle_identifier.into(),
        }
    }

    fn container_matches(&self, dir: &Path) -> bool {
        let metadata_path = dir.join(CONTAINER_METADATA_FILE);
        if !metadata_path.is_file() {
            return false;
        }

        let value: plist::Value = match plist::from_file(&metadata_path) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %metadata_path.display(), "unreadable container metadata: {}", e);
                return false;
            }
        };

        value
            .as_dictionary()
            .and_then(|d| d.get(METADATA_IDENTIFIER_KEY))
            .and_then(plist::Value::as_string)
            .map(|id| id == self.bundle_identifier)
            .unwrap_or(false)
    }
}

impl SnapshotLocator for PluginKitLocator {
    fn candidates(&self) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(&self.container_root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    root = %self.container_root.display(),
                    "cannot scan container root: {}", e
                );
                return Vec::new();
            }
        };

        let matches: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && self.container_matches(path))
            .collect();

        debug!(
            bundle = %self.bundle_identifier,
            count = matches.len(),
            "scanned widget containers"
        );
        matches
    }
}

/// A fixed candidate list, for tests and non-sandboxed setups.
pub struct FixedLocator {
    paths: Vec<PathBuf>,
}

impl FixedLocator {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl SnapshotLocator for FixedLocator {
    fn candidates(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_metadata(dir: &Path, identifier: &str) {
        let mut dict = plist::Dictionary::new();
        dict.insert(
            METADATA_IDENTIFIER_KEY.to_string(),
            plist::Value::String(identifier.to_string()),
        );
        plist::Value::Dictionary(dict)
            .to_file_xml(dir.join(CONTAINER_METADATA_FILE))
            .expect("write metadata");
    }

    #[test]
    fn pluginkit_scan_matches_on_metadata_identifier() {
        let root = std::env::temp_dir().join(format!("batinfo-locator-{}", std::process::id()));
        let ours = root.join("AAAA-1111");
        let other = root.join("BBBB-2222");
        let empty = root.join("CCCC-3333");
        for dir in [&ours, &other, &empty] {
            std::fs::create_dir_all(dir).expect("mkdir");
        }
        write_metadata(&ours, "com.developlab.batinfo.widget");
        write_metadata(&other, "com.example.other.widget");

        let locator = PluginKitLocator::with_root(&root, "com.developlab.batinfo.widget");
        assert_eq!(locator.candidates(), vec![ours]);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn missing_container_root_yields_no_candidates() {
        let locator = PluginKitLocator::with_root("/nonexistent/batinfo-test", "com.example");
        assert!(locator.candidates().is_empty());
    }

    #[test]
    fn fixed_locator_returns_configured_paths() {
        let locator = FixedLocator::new(vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]);
        assert_eq!(locator.candidates().len(), 2);
    }
}
