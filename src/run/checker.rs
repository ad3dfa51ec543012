//! Per-target checking loop

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::ListingSelectors;
use crate::error::{ConfigError, FetchError};
use crate::fetch::PageFetcher;
use crate::locator::{
    ArtifactLocator, CandidateArtifact, DirectLinkLocator, ListingPageLocator, LocatorKind,
    RedirectChainLocator, TargetSpec,
};
use crate::report::{UpdateRecord, UpdateReport};
use crate::tracker::{BaselineStore, is_superseded};

/// Fetches each target, runs its locator and keeps the candidates that
/// supersede their recorded baseline
pub struct UpdateChecker {
    fetcher: Arc<dyn PageFetcher>,
    locators: HashMap<LocatorKind, Arc<dyn ArtifactLocator>>,
}

impl UpdateChecker {
    /// Create a checker with no locators registered
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            fetcher,
            locators: HashMap::new(),
        }
    }

    /// Create a checker with the listing, redirect and direct locators
    pub fn with_default_locators(
        fetcher: Arc<dyn PageFetcher>,
        selectors: &ListingSelectors,
    ) -> Result<Self, ConfigError> {
        let listing = ListingPageLocator::new(selectors)?;
        let redirect = RedirectChainLocator::new(Arc::clone(&fetcher));
        Ok(Self::new(fetcher)
            .with_locator(Arc::new(listing))
            .with_locator(Arc::new(redirect))
            .with_locator(Arc::new(DirectLinkLocator)))
    }

    /// Register a locator, replacing any previous one of the same kind
    pub fn with_locator(mut self, locator: Arc<dyn ArtifactLocator>) -> Self {
        self.locators.insert(locator.kind(), locator);
        self
    }

    /// Check targets one after another.
    ///
    /// A failing target is logged and skipped; the remaining targets are
    /// still checked.
    pub async fn check_targets<S>(&self, targets: &[TargetSpec], store: &S) -> UpdateReport
    where
        S: BaselineStore + ?Sized,
    {
        let mut report = UpdateReport::new();

        for (index, target) in targets.iter().enumerate() {
            info!(
                target_url = %target.url,
                locator = target.locator.as_str(),
                position = index + 1,
                total = targets.len(),
                "Checking target"
            );

            match self.check_target(target, store).await {
                Ok(records) => report.extend(records),
                Err(e) => {
                    error!(
                        target_url = %target.url,
                        error = %e,
                        timeout = e.is_timeout(),
                        "Failed to check target"
                    );
                }
            }
        }

        info!(targets = targets.len(), updates = report.len(), "Finished checking targets");
        report
    }

    async fn check_target<S>(
        &self,
        target: &TargetSpec,
        store: &S,
    ) -> Result<Vec<UpdateRecord>, FetchError>
    where
        S: BaselineStore + ?Sized,
    {
        let Some(locator) = self.locators.get(&target.locator) else {
            warn!(
                target_url = %target.url,
                locator = target.locator.as_str(),
                "No locator registered for target"
            );
            return Ok(Vec::new());
        };

        let page = self.fetcher.fetch_page(&target.url).await?;
        let candidates = locator.locate(&page, target).await?;
        if candidates.is_empty() {
            info!(target_url = %target.url, "No downloads found on page");
        }

        Ok(candidates
            .iter()
            .filter(|candidate| evaluate(candidate, store))
            .map(|candidate| UpdateRecord::from_candidate(candidate, Utc::now()))
            .collect())
    }
}

fn evaluate<S>(candidate: &CandidateArtifact, store: &S) -> bool
where
    S: BaselineStore + ?Sized,
{
    let key = candidate.tracking_key();
    let baseline = store.get(&key);
    let superseded = is_superseded(baseline.as_ref(), &candidate.signal);

    if superseded {
        info!(
            app_name = candidate.app_name,
            variant = candidate.variant.as_str(),
            signal = ?candidate.signal,
            baseline = ?baseline,
            "Update found"
        );
    } else {
        debug!(
            key,
            signal = ?candidate.signal,
            baseline = ?baseline,
            "Already up to date"
        );
    }
    superseded
}
