//! reqwest-backed page fetcher

use std::time::Duration;

use reqwest::Response;
use reqwest::header::{
    ACCEPT_LANGUAGE, CONTENT_DISPOSITION, CONTENT_LENGTH, HeaderMap, HeaderValue, REFERER,
};
use tracing::{debug, warn};
use url::Url;

use crate::config::HttpConfig;
use crate::error::FetchError;
use crate::fetch::{FetchedPage, PageFetcher, ResolvedLink};

/// HTTP fetcher sending the same browser-like headers on every request
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value("Accept-Language", &config.accept_language)?,
        );
        if let Some(referer) = config.referer.as_deref().filter(|r| !r.is_empty()) {
            headers.insert(REFERER, header_value("Referer", referer)?);
        }

        let client = reqwest::Client::builder()
            .user_agent(header_value("User-Agent", &config.user_agent)?)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client })
    }
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, FetchError> {
    HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader {
        name,
        value: value.to_string(),
    })
}

fn ensure_success(url: &Url, response: &Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    warn!(url = %url, status = status.as_u16(), "Server returned unexpected status");
    Err(FetchError::Status {
        url: url.to_string(),
        status: status.as_u16(),
    })
}

fn resolved_from(response: &Response) -> ResolvedLink {
    let headers = response.headers();
    ResolvedLink {
        final_url: response.url().clone(),
        content_length: headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok()),
        content_disposition: headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        debug!(url = %url, "Fetching page");
        let response = self.client.get(url.clone()).send().await?;
        ensure_success(url, &response)?;

        let final_url = response.url().clone();
        let body = response.text().await?;
        debug!(url = %final_url, bytes = body.len(), "Fetched page");

        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }

    async fn resolve(&self, url: &Url) -> Result<ResolvedLink, FetchError> {
        match self.client.head(url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                let resolved = resolved_from(&response);
                if resolved.has_artifact_headers() {
                    debug!(url = %url, final_url = %resolved.final_url, "Resolved link with HEAD");
                    return Ok(resolved);
                }
                debug!(url = %url, "HEAD response has no artifact headers, retrying with GET");
            }
            Ok(response) => {
                debug!(
                    url = %url,
                    status = response.status().as_u16(),
                    "HEAD rejected, retrying with GET"
                );
            }
            Err(e) if e.is_timeout() => return Err(e.into()),
            Err(e) => {
                debug!(url = %url, error = %e, "HEAD failed, retrying with GET");
            }
        }

        // Only the headers are inspected; dropping the response closes the
        // stream before the payload is downloaded.
        let response = self.client.get(url.clone()).send().await?;
        ensure_success(url, &response)?;
        let resolved = resolved_from(&response);
        debug!(url = %url, final_url = %resolved.final_url, "Resolved link with GET");
        Ok(resolved)
    }
}
