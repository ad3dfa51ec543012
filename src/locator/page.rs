//! HTML helpers shared by the locators

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;
use url::Url;

use crate::fetch::FetchedPage;
use crate::locator::types::TargetSpec;

static H1_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("h1 selector must parse"));

static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("title selector must parse"));

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector must parse"));

/// Page titles look like `Download Sample App 14.0.38 for Android – Site`.
/// Captures the app name between the optional "download" word and the
/// version or dash-separated tail. The prefix only counts as a separate word.
static TITLE_APP_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:دانلود|download)\s+)?(.+?)(?:\s+v?\d+\.\d+.*|\s+[–-]\s+.*|\s+برنامه.*)?$")
        .expect("title pattern must compile")
});

static TRAILING_PLATFORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:for\s+)?(?:اندروید|آیفون|ios|iphone|android|windows)$")
        .expect("platform pattern must compile")
});

const UNKNOWN_APP: &str = "UnknownApp";

/// A link picked out of a page by pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedLink {
    pub url: Url,
    pub text: String,
    /// Text of the enclosing element, used as a last-resort version source
    pub surrounding_text: String,
}

/// Percent-decoded last path segment of a URL
pub fn url_filename(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .unwrap_or_default()
}

/// Percent-decoded path of a URL, without host or query
pub fn decoded_path(url: &Url) -> String {
    percent_decode_str(url.path())
        .decode_utf8_lossy()
        .into_owned()
}

/// Resolve a possibly relative href against the page URL
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok()
}

/// Visible text of an element with whitespace runs collapsed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// First anchor whose resolved href matches `pattern`
pub fn find_matching_link(document: &Html, base: &Url, pattern: &Regex) -> Option<MatchedLink> {
    document.select(&ANCHOR_SELECTOR).find_map(|anchor| {
        let url = resolve_href(base, anchor.value().attr("href")?)?;
        if !pattern.is_match(url.as_str()) {
            return None;
        }
        let surrounding_text = anchor
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| element_text(&parent))
            .unwrap_or_default();
        Some(MatchedLink {
            url,
            text: element_text(&anchor),
            surrounding_text,
        })
    })
}

/// Pick the target's download link and the app name out of the page.
///
/// Returns `None` when the target has no link pattern or nothing matches.
pub fn match_target_link(page: &FetchedPage, target: &TargetSpec) -> Option<(MatchedLink, String)> {
    let Some(pattern) = target.link_pattern.as_ref() else {
        warn!(target_url = %target.url, "No link pattern configured for target");
        return None;
    };

    let document = Html::parse_document(&page.body);
    let Some(link) = find_matching_link(&document, &page.url, pattern) else {
        warn!(target_url = %target.url, pattern = pattern.as_str(), "No link matched the pattern");
        return None;
    };

    let app_name = target
        .app_name
        .clone()
        .unwrap_or_else(|| extract_app_name(&document, &target.url));
    Some((link, app_name))
}

/// Best-effort human-readable app name for a page.
///
/// Tries an `<h1>` whose class mentions "title", then `<title>`, then the last
/// segment of the page URL.
pub fn extract_app_name(document: &Html, page_url: &Url) -> String {
    let heading = document.select(&H1_SELECTOR).find(|h1| {
        h1.value()
            .attr("class")
            .is_some_and(|class| class.to_lowercase().contains("title"))
    });

    let from_markup = heading
        .into_iter()
        .chain(document.select(&TITLE_SELECTOR).take(1))
        .find_map(|element| app_name_from_title(&element_text(&element)));

    from_markup.unwrap_or_else(|| app_name_from_url(page_url))
}

fn app_name_from_title(title: &str) -> Option<String> {
    let captured = TITLE_APP_NAME.captures(title.trim())?.get(1)?.as_str().trim();
    let name = TRAILING_PLATFORM.replace(captured, "").trim().to_string();
    (!name.is_empty()).then_some(name)
}

fn app_name_from_url(page_url: &Url) -> String {
    let last_segment = page_url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned());

    match last_segment {
        Some(segment) => title_case(&segment.replace(['-', '_'], " ")),
        None => UNKNOWN_APP.to_string(),
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
