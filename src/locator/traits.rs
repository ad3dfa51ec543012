//! Locator trait definition

use crate::error::FetchError;
use crate::fetch::FetchedPage;
use crate::locator::types::{CandidateArtifact, LocatorKind, TargetSpec};

/// Trait for finding downloadable artifacts on a fetched page
#[async_trait::async_trait]
pub trait ArtifactLocator: Send + Sync {
    /// Returns the kind of page this locator understands
    fn kind(&self) -> LocatorKind;

    /// Find candidate artifacts on the page
    ///
    /// # Returns
    /// * `Ok(Vec<CandidateArtifact>)` - Possibly empty when the page does not
    ///   have the expected structure
    /// * `Err(FetchError)` - When a follow-up request made by the locator fails
    async fn locate(
        &self,
        page: &FetchedPage,
        target: &TargetSpec,
    ) -> Result<Vec<CandidateArtifact>, FetchError>;
}
