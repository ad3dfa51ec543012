//! Update report handed to the CI pipeline
//!
//! The report is written as a JSON array of [`UpdateRecord`]s, and the number
//! of updates is appended to the CI output file as `updates_count=N`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ReportError;
use crate::locator::page::url_filename;
use crate::locator::types::{CandidateArtifact, Variant};
use crate::tracker::key::suggested_filename;
use crate::tracker::store::Baseline;

/// Name of the CI output variable carrying the number of updates
pub const UPDATES_COUNT_OUTPUT: &str = "updates_count";

const DEFAULT_EXTENSION: &str = "apk";

/// One confirmed update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRecord {
    pub app_name: String,
    /// `None` when the update was detected by payload size only
    pub version: Option<String>,
    pub size_bytes: Option<u64>,
    pub variant: Variant,
    pub download_url: String,
    pub page_url: String,
    pub tracking_id: String,
    pub suggested_filename: String,
    /// Value to record as the new baseline once the update is handled
    pub current_version_for_tracking: Baseline,
    pub discovered_at: DateTime<Utc>,
}

impl UpdateRecord {
    pub fn from_candidate(candidate: &CandidateArtifact, discovered_at: DateTime<Utc>) -> Self {
        let version = candidate.signal.version().map(str::to_string);
        let extension = file_extension(&url_filename(&candidate.download_url));
        Self {
            suggested_filename: suggested_filename(
                &candidate.app_name,
                version.as_deref(),
                candidate.variant,
                &extension,
            ),
            app_name: candidate.app_name.clone(),
            version,
            size_bytes: candidate.signal.size(),
            variant: candidate.variant,
            download_url: candidate.download_url.to_string(),
            page_url: candidate.source_page_url.to_string(),
            tracking_id: candidate.tracking_key(),
            current_version_for_tracking: Baseline::from_signal(&candidate.signal),
            discovered_at,
        }
    }
}

/// All updates discovered in one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateReport {
    records: Vec<UpdateRecord>,
}

impl UpdateReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: UpdateRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UpdateRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[UpdateRecord] {
        &self.records
    }

    /// Write the report as a pretty-printed JSON array
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        let io_err = |source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, json).map_err(io_err)?;
        info!(path = %path.display(), updates = self.len(), "Wrote update report");
        Ok(())
    }
}

impl Extend<UpdateRecord> for UpdateReport {
    fn extend<T: IntoIterator<Item = UpdateRecord>>(&mut self, iter: T) {
        self.records.extend(iter);
    }
}

/// Append `updates_count=N` to a CI output file such as `$GITHUB_OUTPUT`
pub fn publish_count(path: &Path, count: usize) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(io_err)?;
    writeln!(file, "{UPDATES_COUNT_OUTPUT}={count}").map_err(io_err)?;
    debug!(path = %path.display(), count, "Published update count");
    Ok(())
}

/// Lower-cased extension of a filename, `apk` when there is no plausible one
fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
