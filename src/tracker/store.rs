use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::TrackerError;
use crate::locator::types::ChangeSignal;
use crate::report::UpdateReport;
use crate::version::comparator::{UNSEEN_VERSION, is_newer, is_size_changed};

/// Last recorded value for a tracking key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Baseline {
    /// Payload size in bytes, for targets without an extractable version
    Size(u64),
    Version(String),
}

impl Baseline {
    pub fn from_signal(signal: &ChangeSignal) -> Self {
        match signal {
            ChangeSignal::Version(v) => Baseline::Version(v.clone()),
            ChangeSignal::Size(size) => Baseline::Size(*size),
        }
    }
}

/// Check whether a discovered signal supersedes the recorded baseline.
///
/// A baseline of the other kind (a size where a version is now found, or the
/// reverse) is treated as no baseline at all.
pub fn is_superseded(baseline: Option<&Baseline>, signal: &ChangeSignal) -> bool {
    match signal {
        ChangeSignal::Version(current) => {
            let previous = match baseline {
                Some(Baseline::Version(v)) => v.as_str(),
                _ => UNSEEN_VERSION,
            };
            is_newer(current, previous)
        }
        ChangeSignal::Size(current) => {
            let previous = match baseline {
                Some(Baseline::Size(size)) => Some(*size),
                _ => None,
            };
            is_size_changed(*current, previous)
        }
    }
}

/// Trait for reading and recording baselines
#[cfg_attr(test, automock)]
pub trait BaselineStore: Send + Sync {
    /// Get the recorded baseline for a tracking key
    fn get(&self, key: &str) -> Option<Baseline>;

    /// Record a new baseline for a tracking key
    fn set(&mut self, key: &str, value: Baseline);
}

/// JSON-backed mapping from tracking key to last-seen version or size
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerStore {
    entries: IndexMap<String, Baseline>,
}

impl TrackerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the tracker from disk.
    ///
    /// A missing file starts an empty tracker. An unreadable or corrupt file
    /// does the same with a warning, so a damaged tracker never stops a run.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Tracker file not found, starting empty");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read tracker file, starting empty");
                return Self::new();
            }
        };

        match serde_json::from_str::<IndexMap<String, Baseline>>(&content) {
            Ok(entries) => {
                info!(path = %path.display(), entries = entries.len(), "Loaded tracker file");
                Self { entries }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Tracker file is corrupt, starting empty");
                Self::new()
            }
        }
    }

    /// Write the tracker as pretty JSON, replacing the file atomically
    pub fn save(&self, path: &Path) -> Result<(), TrackerError> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let io_err = |source| TrackerError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let tmp_path = temp_path(path);
        fs::write(&tmp_path, json).map_err(io_err)?;
        fs::rename(&tmp_path, path).map_err(io_err)?;

        debug!(path = %path.display(), entries = self.entries.len(), "Saved tracker file");
        Ok(())
    }

    /// Recorded version for a key, `0.0.0` when nothing usable is recorded
    pub fn version_or_default(&self, key: &str) -> String {
        match self.entries.get(key) {
            Some(Baseline::Version(v)) => v.clone(),
            _ => UNSEEN_VERSION.to_string(),
        }
    }

    /// Record the baseline carried by every update in the report
    pub fn apply(&mut self, report: &UpdateReport) {
        for record in report.iter() {
            self.set(&record.tracking_id, record.current_version_for_tracking.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl BaselineStore for TrackerStore {
    fn get(&self, key: &str) -> Option<Baseline> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Baseline) {
        self.entries.insert(key.to_string(), value);
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn load_returns_empty_for_missing_file() {
        let temp_dir = TempDir::new().unwrap();

        let store = TrackerStore::load(&temp_dir.path().join("missing.json"));

        assert!(store.is_empty());
        assert_eq!(store.version_or_default("sampleapp_universal"), "0.0.0");
    }

    #[test]
    fn load_returns_empty_for_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracker.json");
        fs::write(&path, "{ not json").unwrap();

        let store = TrackerStore::load(&path);

        assert!(store.is_empty());
    }

    #[test]
    fn load_reads_versions_and_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tracker.json");
        fs::write(
            &path,
            r#"{"sampleapp_universal": "14.0.38", "telegram_universal": 52428800}"#,
        )
        .unwrap();

        let store = TrackerStore::load(&path);

        assert_eq!(
            store.get("sampleapp_universal"),
            Some(Baseline::Version("14.0.38".to_string()))
        );
        assert_eq!(
            store.get("telegram_universal"),
            Some(Baseline::Size(52428800))
        );
        assert_eq!(store.version_or_default("telegram_universal"), "0.0.0");
    }

    #[test]
    fn save_round_trips_and_preserves_key_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("tracker.json");
        let mut store = TrackerStore::new();
        store.set("zeta_universal", Baseline::Version("1.0".to_string()));
        store.set("alpha_x86", Baseline::Size(1024));

        store.save(&path).unwrap();
        let loaded = TrackerStore::load(&path);

        assert_eq!(loaded, store);
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.find("zeta_universal").unwrap() < content.find("alpha_x86").unwrap());
        assert!(!temp_path(&path).exists());
    }

    #[rstest]
    #[case(None, ChangeSignal::Version("1.0".to_string()), true)]
    #[case(Some(Baseline::Version("14.0.38".to_string())), ChangeSignal::Version("14.0.38".to_string()), false)]
    #[case(Some(Baseline::Version("14.0.37".to_string())), ChangeSignal::Version("14.0.38".to_string()), true)]
    #[case(Some(Baseline::Size(100)), ChangeSignal::Version("1.0".to_string()), true)]
    #[case(None, ChangeSignal::Size(100), true)]
    #[case(Some(Baseline::Size(100)), ChangeSignal::Size(100), false)]
    #[case(Some(Baseline::Size(100)), ChangeSignal::Size(200), true)]
    #[case(Some(Baseline::Version("1.0".to_string())), ChangeSignal::Size(200), true)]
    #[case(None, ChangeSignal::Size(0), false)]
    fn is_superseded_returns_expected(
        #[case] baseline: Option<Baseline>,
        #[case] signal: ChangeSignal,
        #[case] expected: bool,
    ) {
        assert_eq!(is_superseded(baseline.as_ref(), &signal), expected);
    }
}
