//! One complete checking run
//!
//! Reads the URL list, routes each URL to a locator, checks the targets
//! against the tracker and writes the update report and CI output.
//!
//! - [`targets`]: URL list loading
//! - [`checker`]: the per-target checking loop

pub mod checker;
pub mod targets;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::{CheckerConfig, FilesConfig};
use crate::error::RunError;
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::locator::{TargetRouter, TargetSpec};
use crate::report::{UpdateReport, publish_count};
use crate::tracker::TrackerStore;

pub use checker::UpdateChecker;
pub use targets::load_url_list;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub targets: usize,
    pub updates: usize,
    pub report_path: PathBuf,
    /// Whether the tracker file was rewritten with the new baselines
    pub tracker_updated: bool,
}

/// Run a full check with the given configuration.
///
/// A missing URL list still produces an empty report and a zero count before
/// the error is returned, so downstream CI steps always find their inputs.
pub async fn execute(config: &CheckerConfig) -> Result<RunSummary, RunError> {
    let files = &config.files;
    let ci_output = config.ci_output_path();

    let urls = match load_url_list(&files.url_list) {
        Ok(urls) => urls,
        Err(e @ RunError::MissingUrlList(_)) => {
            error!(path = %files.url_list.display(), "URL list not found");
            write_outputs(&UpdateReport::new(), files, ci_output.as_deref())?;
            return Err(e);
        }
        Err(e) => return Err(e),
    };

    let router = TargetRouter::from_rules(&config.targets)?;
    if urls.is_empty() {
        warn!(path = %files.url_list.display(), "URL list is empty, nothing to check");
        write_outputs(&UpdateReport::new(), files, ci_output.as_deref())?;
        return Ok(RunSummary {
            targets: 0,
            updates: 0,
            report_path: files.output.clone(),
            tracker_updated: false,
        });
    }

    let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new(&config.http)?);
    let checker = UpdateChecker::with_default_locators(fetcher, &config.listing)?;
    let targets: Vec<TargetSpec> = urls.into_iter().map(|url| router.route(url)).collect();

    let mut tracker = TrackerStore::load(&files.tracker);
    let report = checker.check_targets(&targets, &tracker).await;
    write_outputs(&report, files, ci_output.as_deref())?;

    let tracker_updated = files.update_tracker && !report.is_empty();
    if tracker_updated {
        tracker.apply(&report);
        tracker.save(&files.tracker)?;
        info!(path = %files.tracker.display(), entries = tracker.len(), "Updated tracker file");
    }

    Ok(RunSummary {
        targets: targets.len(),
        updates: report.len(),
        report_path: files.output.clone(),
        tracker_updated,
    })
}

fn write_outputs(
    report: &UpdateReport,
    files: &FilesConfig,
    ci_output: Option<&Path>,
) -> Result<(), RunError> {
    report.write_json(&files.output)?;
    match ci_output {
        Some(path) => publish_count(path, report.len())?,
        None => info!(updates = report.len(), "No CI output file configured, skipping count"),
    }
    Ok(())
}
