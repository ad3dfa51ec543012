//! Network access for page fetching and redirect resolution
//!
//! [`PageFetcher`] is the seam between the checking logic and the network;
//! [`http::HttpFetcher`] is the reqwest-backed implementation.

pub mod http;

use std::sync::LazyLock;

#[cfg(test)]
use mockall::automock;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use crate::error::FetchError;

pub use http::HttpFetcher;

/// `filename*=UTF-8''name.apk` or `filename="name.apk"`
static DISPOSITION_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\*?\s*=\s*(?:[\w-]+'[^']*')?"?([^";]+)"?"#)
        .expect("disposition pattern must compile")
});

/// A fetched HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects; relative links resolve against it
    pub url: Url,
    pub body: String,
}

/// Where a download link ends up once redirects are followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub final_url: Url,
    pub content_length: Option<u64>,
    pub content_disposition: Option<String>,
}

impl ResolvedLink {
    /// Filename announced by the `Content-Disposition` header, if any
    pub fn disposition_filename(&self) -> Option<String> {
        let header = self.content_disposition.as_deref()?;
        let raw = DISPOSITION_FILENAME.captures(header)?.get(1)?.as_str().trim();
        let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
        (!decoded.is_empty()).then_some(decoded)
    }

    /// True when the headers carry something usable for change detection
    pub fn has_artifact_headers(&self) -> bool {
        self.content_length.is_some_and(|len| len > 0) || self.content_disposition.is_some()
    }
}

/// Trait for fetching pages and resolving download links
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page body, following redirects
    ///
    /// # Returns
    /// * `Ok(FetchedPage)` - Final URL and body text
    /// * `Err(FetchError)` - On timeout, connection failure or non-2xx status
    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError>;

    /// Follow redirects for a download link without downloading the payload
    async fn resolve(&self, url: &Url) -> Result<ResolvedLink, FetchError>;
}
