//! Locator for pages whose download link redirects to the real artifact

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::fetch::{FetchedPage, PageFetcher};
use crate::locator::page::{match_target_link, url_filename};
use crate::locator::traits::ArtifactLocator;
use crate::locator::types::{CandidateArtifact, ChangeSignal, LocatorKind, TargetSpec, Variant};
use crate::version::parser::{ExtractionSource, extract_first};

/// Finds a link matching the target's pattern and follows it.
///
/// The version comes from where the redirects end up. When nothing carries a
/// version the advertised size is used instead.
pub struct RedirectChainLocator {
    fetcher: Arc<dyn PageFetcher>,
}

impl RedirectChainLocator {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl ArtifactLocator for RedirectChainLocator {
    fn kind(&self) -> LocatorKind {
        LocatorKind::RedirectChain
    }

    async fn locate(
        &self,
        page: &FetchedPage,
        target: &TargetSpec,
    ) -> Result<Vec<CandidateArtifact>, FetchError> {
        let Some((link, app_name)) = match_target_link(page, target) else {
            return Ok(Vec::new());
        };
        info!(target_url = %target.url, app_name, link = %link.url, "Following download link");

        let resolved = self.fetcher.resolve(&link.url).await?;
        let final_filename = url_filename(&resolved.final_url);
        let disposition_filename = resolved.disposition_filename().unwrap_or_default();

        let extracted = extract_first([
            (ExtractionSource::FinalUrlFilename, final_filename.as_str()),
            (ExtractionSource::ContentDisposition, disposition_filename.as_str()),
            (ExtractionSource::LinkText, link.text.as_str()),
            (ExtractionSource::SurroundingText, link.surrounding_text.as_str()),
        ]);

        let signal = match (extracted, resolved.content_length) {
            (Some(extracted), _) => {
                debug!(
                    version = extracted.version,
                    source = extracted.source.as_str(),
                    "Found version"
                );
                ChangeSignal::Version(extracted.version)
            }
            (None, Some(size)) if size > 0 => {
                debug!(size, "No version found, using content length");
                ChangeSignal::Size(size)
            }
            (None, _) => {
                warn!(
                    target_url = %target.url,
                    final_url = %resolved.final_url,
                    "Neither a version nor a size is available"
                );
                return Ok(Vec::new());
            }
        };

        let variant = Variant::classify(&format!("{final_filename} {disposition_filename} {}", link.text))
            .or(target.variant)
            .unwrap_or(Variant::Unknown);

        Ok(vec![CandidateArtifact {
            app_name,
            variant,
            signal,
            download_url: resolved.final_url,
            source_page_url: target.url.clone(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{MockPageFetcher, ResolvedLink};
    use regex::Regex;
    use url::Url;

    const PAGE_URL: &str = "https://telegram.org/android";
    const ANDROID_PAGE: &str = r#"<html><head><title>Telegram for Android</title></head><body>
        <div class="dl"><a href="/dl/android/apk">Download APK</a></div>
        <a href="https://play.google.com/store/apps/details?id=org.telegram.messenger">Google Play</a>
        </body></html>"#;

    fn page(body: &str) -> FetchedPage {
        FetchedPage {
            url: Url::parse(PAGE_URL).unwrap(),
            body: body.to_string(),
        }
    }

    fn target() -> TargetSpec {
        TargetSpec::new(Url::parse(PAGE_URL).unwrap(), LocatorKind::RedirectChain)
            .with_link_pattern(Regex::new(r"/dl/android/apk").unwrap())
            .with_app_name("Telegram")
            .with_variant(Variant::Universal)
    }

    fn resolved(final_url: &str, length: Option<u64>, disposition: Option<&str>) -> ResolvedLink {
        ResolvedLink {
            final_url: Url::parse(final_url).unwrap(),
            content_length: length,
            content_disposition: disposition.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn locate_takes_version_from_final_url() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_resolve()
            .withf(|url| url.as_str() == "https://telegram.org/dl/android/apk")
            .times(1)
            .returning(|_| {
                Ok(resolved(
                    "https://cdn.telegram.org/files/Telegram-11.2.3.apk",
                    Some(80_000_000),
                    None,
                ))
            });

        let locator = RedirectChainLocator::new(Arc::new(fetcher));
        let candidates = locator.locate(&page(ANDROID_PAGE), &target()).await.unwrap();

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.signal, ChangeSignal::Version("11.2.3".to_string()));
        assert_eq!(candidate.app_name, "Telegram");
        assert_eq!(candidate.variant, Variant::Universal);
        assert_eq!(
            candidate.download_url.as_str(),
            "https://cdn.telegram.org/files/Telegram-11.2.3.apk"
        );
        assert_eq!(candidate.source_page_url.as_str(), PAGE_URL);
    }

    #[tokio::test]
    async fn locate_reads_content_disposition_filename() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_resolve().returning(|_| {
            Ok(resolved(
                "https://telegram.org/dl/android/apk",
                None,
                Some(r#"attachment; filename="Telegram-11.4.0.apk""#),
            ))
        });

        let locator = RedirectChainLocator::new(Arc::new(fetcher));
        let candidates = locator.locate(&page(ANDROID_PAGE), &target()).await.unwrap();

        assert_eq!(candidates[0].signal, ChangeSignal::Version("11.4.0".to_string()));
    }

    #[tokio::test]
    async fn locate_falls_back_to_size_signal() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_resolve().returning(|_| {
            Ok(resolved(
                "https://telegram.org/dl/android/apk",
                Some(52_428_800),
                None,
            ))
        });

        let locator = RedirectChainLocator::new(Arc::new(fetcher));
        let candidates = locator.locate(&page(ANDROID_PAGE), &target()).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].signal, ChangeSignal::Size(52_428_800));
    }

    #[tokio::test]
    async fn locate_returns_empty_without_version_or_size() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_resolve()
            .returning(|_| Ok(resolved("https://telegram.org/dl/android/apk", Some(0), None)));

        let locator = RedirectChainLocator::new(Arc::new(fetcher));
        let candidates = locator.locate(&page(ANDROID_PAGE), &target()).await.unwrap();

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn locate_skips_resolution_when_no_link_matches() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_resolve().never();

        let locator = RedirectChainLocator::new(Arc::new(fetcher));
        let candidates = locator
            .locate(&page("<html><body><a href=\"/faq\">FAQ</a></body></html>"), &target())
            .await
            .unwrap();

        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn locate_propagates_resolution_errors() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_resolve().returning(|url| {
            Err(FetchError::Status {
                url: url.to_string(),
                status: 503,
            })
        });

        let locator = RedirectChainLocator::new(Arc::new(fetcher));
        let result = locator.locate(&page(ANDROID_PAGE), &target()).await;

        assert!(matches!(result, Err(FetchError::Status { status: 503, .. })));
    }
}
