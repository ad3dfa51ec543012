//! Locator for download boxes listing one link per build variant

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use crate::config::ListingSelectors;
use crate::error::{ConfigError, FetchError};
use crate::fetch::FetchedPage;
use crate::locator::page::{decoded_path, element_text, extract_app_name, resolve_href, url_filename};
use crate::locator::traits::ArtifactLocator;
use crate::locator::types::{CandidateArtifact, ChangeSignal, LocatorKind, TargetSpec, Variant};
use crate::version::parser::{ExtractionSource, extract_first};

/// Reads pages shaped like
///
/// ```html
/// <section class="downloadbox">
///   <ul class="download-links">
///     <li class="download-link">
///       <a class="download-btn" href="/dl/App-1.2.3-arm64-v8a.apk"><span class="txt">Arm64-v8a</span></a>
///     </li>
///   </ul>
/// </section>
/// ```
pub struct ListingPageLocator {
    container: Selector,
    list: Selector,
    item: Selector,
    link: Selector,
    label: Selector,
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

impl ListingPageLocator {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            container: parse_selector(&selectors.container)?,
            list: parse_selector(&selectors.list)?,
            item: parse_selector(&selectors.item)?,
            link: parse_selector(&selectors.link)?,
            label: parse_selector(&selectors.label)?,
        })
    }

    /// Parse the page and collect candidates.
    ///
    /// Kept synchronous so the parsed document never lives across an await.
    fn locate_in_document(&self, page: &FetchedPage, target: &TargetSpec) -> Vec<CandidateArtifact> {
        let document = Html::parse_document(&page.body);
        let app_name = target
            .app_name
            .clone()
            .unwrap_or_else(|| extract_app_name(&document, &target.url));
        info!(target_url = %target.url, app_name, "Processing listing page");

        let Some(container) = document.select(&self.container).next() else {
            warn!(target_url = %target.url, "Download box not found");
            return Vec::new();
        };
        let Some(list) = container.select(&self.list).next() else {
            warn!(target_url = %target.url, "Download link list not found");
            return Vec::new();
        };

        let items: Vec<_> = list.select(&self.item).collect();
        debug!(target_url = %target.url, entries = items.len(), "Found download entries");
        if items.is_empty() {
            warn!(target_url = %target.url, "Download list has no entries");
            return Vec::new();
        }

        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| self.candidate_from_item(index + 1, item, &app_name, page, target))
            .collect()
    }

    fn candidate_from_item(
        &self,
        entry: usize,
        item: &ElementRef<'_>,
        app_name: &str,
        page: &FetchedPage,
        target: &TargetSpec,
    ) -> Option<CandidateArtifact> {
        let Some(link) = item.select(&self.link).next() else {
            warn!(entry, "Download button not found, skipping entry");
            return None;
        };

        let Some(download_url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_href(&page.url, href))
        else {
            warn!(entry, "Download link has no usable href, skipping entry");
            return None;
        };

        let label = link
            .select(&self.label)
            .next()
            .map(|label| element_text(&label))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| element_text(&link));
        if label.is_empty() {
            warn!(entry, url = %download_url, "Download link has no label, skipping entry");
            return None;
        }

        let path = decoded_path(&download_url);
        let Some(extracted) = extract_first([
            (ExtractionSource::UrlPath, path.as_str()),
            (ExtractionSource::LinkText, label.as_str()),
        ]) else {
            warn!(entry, url = %download_url, "No version found in link, skipping entry");
            return None;
        };

        let filename = url_filename(&download_url);
        let variant = Variant::classify(&format!("{filename} {label}"))
            .or(target.variant)
            .unwrap_or(Variant::Universal);

        debug!(
            entry,
            url = %download_url,
            version = extracted.version,
            source = extracted.source.as_str(),
            variant = variant.as_str(),
            "Found download entry"
        );

        Some(CandidateArtifact {
            app_name: app_name.to_string(),
            variant,
            signal: ChangeSignal::Version(extracted.version),
            download_url,
            source_page_url: target.url.clone(),
        })
    }
}

impl Default for ListingPageLocator {
    fn default() -> Self {
        Self::new(&ListingSelectors::default()).expect("default listing selectors must parse")
    }
}

#[async_trait::async_trait]
impl ArtifactLocator for ListingPageLocator {
    fn kind(&self) -> LocatorKind {
        LocatorKind::Listing
    }

    async fn locate(
        &self,
        page: &FetchedPage,
        target: &TargetSpec,
    ) -> Result<Vec<CandidateArtifact>, FetchError> {
        Ok(self.locate_in_document(page, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    const PAGE_URL: &str = "https://www.example.com/sampleapp/";

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse(PAGE_URL).unwrap(),
            body: body.to_string(),
        }
    }

    fn target() -> TargetSpec {
        TargetSpec::new(Url::parse(PAGE_URL).unwrap(), LocatorKind::Listing)
    }

    fn listing(entries: &str) -> String {
        format!(
            r#"<html><head><title>Download SampleApp 14.0.38 for Android</title></head><body>
            <section class="downloadbox"><ul class="download-links">{entries}</ul></section>
            </body></html>"#
        )
    }

    fn entry(href: &str, label: &str) -> String {
        format!(
            r#"<li class="download-link"><a class="download-btn" href="{href}"><span class="txt">{label}</span></a></li>"#
        )
    }

    #[tokio::test]
    async fn locate_returns_one_candidate_per_variant() {
        let body = listing(&[
            entry("https://dl.example.com/SampleApp-14.0.38-arm64-v8a.apk", "Download Arm64-v8a"),
            entry("https://dl.example.com/SampleApp-14.0.37-x86.apk", "Download x86"),
            entry("/files/SampleApp-14.0.38-universal.apk", "Download Universal"),
        ]
        .concat());

        let candidates = ListingPageLocator::default()
            .locate(&page(&body), &target())
            .await
            .unwrap();

        let summary: Vec<_> = candidates
            .iter()
            .map(|c| (c.signal.version().unwrap(), c.variant, c.download_url.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    "14.0.38",
                    Variant::Arm64V8a,
                    "https://dl.example.com/SampleApp-14.0.38-arm64-v8a.apk"
                ),
                (
                    "14.0.37",
                    Variant::X86,
                    "https://dl.example.com/SampleApp-14.0.37-x86.apk"
                ),
                (
                    "14.0.38",
                    Variant::Universal,
                    "https://www.example.com/files/SampleApp-14.0.38-universal.apk"
                ),
            ]
        );
        assert!(candidates.iter().all(|c| c.app_name == "SampleApp"));
        assert!(candidates.iter().all(|c| c.source_page_url.as_str() == PAGE_URL));
    }

    #[tokio::test]
    async fn locate_falls_back_to_label_for_version() {
        let body = listing(&entry("/dl/latest", "SampleApp 3.2.1 Universal"));

        let candidates = ListingPageLocator::default()
            .locate(&page(&body), &target())
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].signal,
            ChangeSignal::Version("3.2.1".to_string())
        );
    }

    #[tokio::test]
    async fn locate_skips_entries_without_href_or_version() {
        let body = listing(
            &[
                r#"<li class="download-link"><a class="download-btn"><span class="txt">No href</span></a></li>"#
                    .to_string(),
                entry("/dl/latest", "No version here"),
                r#"<li class="download-link"><span>No button</span></li>"#.to_string(),
                entry("/dl/SampleApp-2.0.apk", "Download"),
            ]
            .concat(),
        );

        let candidates = ListingPageLocator::default()
            .locate(&page(&body), &target())
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].signal, ChangeSignal::Version("2.0".to_string()));
        assert_eq!(candidates[0].variant, Variant::Universal);
    }

    #[tokio::test]
    async fn locate_returns_empty_when_download_box_missing() {
        let candidates = ListingPageLocator::default()
            .locate(&page("<html><body><p>Redesigned page</p></body></html>"), &target())
            .await
            .unwrap();

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn locate_uses_target_overrides() {
        let body = listing(&entry("/dl/SampleApp-2.0.apk", "Download"));
        let target = target()
            .with_app_name("Sample Pro")
            .with_variant(Variant::ArmeabiV7a);

        let candidates = ListingPageLocator::default()
            .locate(&page(&body), &target)
            .await
            .unwrap();

        assert_eq!(candidates[0].app_name, "Sample Pro");
        assert_eq!(candidates[0].variant, Variant::ArmeabiV7a);
    }

    #[test]
    fn new_rejects_invalid_selector() {
        let selectors = ListingSelectors {
            container: "section[".to_string(),
            ..ListingSelectors::default()
        };

        assert!(matches!(
            ListingPageLocator::new(&selectors),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
