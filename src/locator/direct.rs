//! Locator for pages that link straight to a versioned artifact

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetch::FetchedPage;
use crate::locator::page::{decoded_path, match_target_link, url_filename};
use crate::locator::traits::ArtifactLocator;
use crate::locator::types::{CandidateArtifact, ChangeSignal, LocatorKind, TargetSpec, Variant};
use crate::version::parser::{ExtractionSource, extract_first};

/// Reads the version from the matched link itself, without following it
#[derive(Debug, Default)]
pub struct DirectLinkLocator;

impl DirectLinkLocator {
    fn locate_in_document(&self, page: &FetchedPage, target: &TargetSpec) -> Option<CandidateArtifact> {
        let (link, app_name) = match_target_link(page, target)?;
        info!(target_url = %target.url, app_name, link = %link.url, "Found download link");

        let path = decoded_path(&link.url);
        let Some(extracted) = extract_first([
            (ExtractionSource::UrlPath, path.as_str()),
            (ExtractionSource::LinkText, link.text.as_str()),
            (ExtractionSource::SurroundingText, link.surrounding_text.as_str()),
        ]) else {
            warn!(target_url = %target.url, link = %link.url, "No version found for download link");
            return None;
        };
        debug!(
            version = extracted.version,
            source = extracted.source.as_str(),
            "Found version"
        );

        let variant = Variant::classify(&format!("{} {}", url_filename(&link.url), link.text))
            .or(target.variant)
            .unwrap_or(Variant::Unknown);

        Some(CandidateArtifact {
            app_name,
            variant,
            signal: ChangeSignal::Version(extracted.version),
            download_url: link.url,
            source_page_url: target.url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ArtifactLocator for DirectLinkLocator {
    fn kind(&self) -> LocatorKind {
        LocatorKind::DirectLink
    }

    async fn locate(
        &self,
        page: &FetchedPage,
        target: &TargetSpec,
    ) -> Result<Vec<CandidateArtifact>, FetchError> {
        Ok(self.locate_in_document(page, target).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use rstest::rstest;
    use url::Url;

    const PAGE_URL: &str = "https://desktop.telegram.org/";

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse(PAGE_URL).unwrap(),
            body: body.to_string(),
        }
    }

    fn target() -> TargetSpec {
        TargetSpec::new(Url::parse(PAGE_URL).unwrap(), LocatorKind::DirectLink)
            .with_link_pattern(Regex::new(r"(?i)tsetup[.-]x64.*\.exe").unwrap())
            .with_app_name("Telegram Desktop")
    }

    #[rstest]
    #[case::version_in_filename(
        r#"<a href="https://updates.tdesktop.com/tx64/tsetup.x64.4.8.1.exe">Get Telegram for Windows x64</a>"#,
        "4.8.1"
    )]
    #[case::version_in_link_text(
        r#"<a href="/dl/tsetup-x64.exe">Telegram 5.0.2 for Windows x64</a>"#,
        "5.0.2"
    )]
    #[case::version_in_surrounding_text(
        r#"<div class="dl"><a href="/dl/tsetup-x64.exe">Get Telegram</a><span>Version 5.1.0</span></div>"#,
        "5.1.0"
    )]
    #[tokio::test]
    async fn locate_extracts_version(#[case] markup: &str, #[case] expected: &str) {
        let body = format!("<html><body>{markup}</body></html>");

        let candidates = DirectLinkLocator.locate(&page(&body), &target()).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].signal.version(), Some(expected));
        assert_eq!(candidates[0].variant, Variant::X86_64);
        assert_eq!(candidates[0].app_name, "Telegram Desktop");
    }

    #[tokio::test]
    async fn locate_uses_link_url_as_download_url() {
        let body = r#"<html><body><a href="/dl/tsetup.x64.4.8.1.exe">Download</a></body></html>"#;

        let candidates = DirectLinkLocator.locate(&page(body), &target()).await.unwrap();

        assert_eq!(
            candidates[0].download_url.as_str(),
            "https://desktop.telegram.org/dl/tsetup.x64.4.8.1.exe"
        );
        assert_eq!(candidates[0].source_page_url.as_str(), PAGE_URL);
    }

    #[tokio::test]
    async fn locate_returns_empty_when_no_version_found() {
        let body = r#"<html><body><a href="/dl/tsetup-x64.exe">Download</a></body></html>"#;

        let candidates = DirectLinkLocator.locate(&page(body), &target()).await.unwrap();

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn locate_returns_empty_without_link_pattern() {
        let target = TargetSpec::new(Url::parse(PAGE_URL).unwrap(), LocatorKind::DirectLink);
        let body = r#"<html><body><a href="/dl/tsetup.x64.4.8.1.exe">Download</a></body></html>"#;

        let candidates = DirectLinkLocator.locate(&page(body), &target).await.unwrap();

        assert!(candidates.is_empty());
    }
}
