//! Common types for artifact locators

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::tracker::key::tracking_key;

/// Strategy used to find downloads on a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    /// A download box listing one link per build variant
    Listing,
    /// A single stable link that redirects to the current artifact
    RedirectChain,
    /// A single link whose href already names the current artifact
    DirectLink,
}

impl LocatorKind {
    /// Returns the string representation of the locator kind
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorKind::Listing => "listing",
            LocatorKind::RedirectChain => "redirect_chain",
            LocatorKind::DirectLink => "direct_link",
        }
    }

    /// Whether this locator needs a link pattern to pick its anchor
    pub fn needs_link_pattern(&self) -> bool {
        !matches!(self, LocatorKind::Listing)
    }
}

impl std::str::FromStr for LocatorKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listing" => Ok(LocatorKind::Listing),
            "redirect_chain" => Ok(LocatorKind::RedirectChain),
            "direct_link" => Ok(LocatorKind::DirectLink),
            _ => Err(()),
        }
    }
}

/// Build variant of a downloadable artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    #[serde(rename = "Universal", alias = "universal")]
    Universal,
    #[serde(rename = "Armeabi-v7a", alias = "armeabi-v7a")]
    ArmeabiV7a,
    #[serde(rename = "Arm64-v8a", alias = "arm64-v8a")]
    Arm64V8a,
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "Unknown", alias = "unknown")]
    Unknown,
}

/// Keyword table in precedence order.
///
/// 64-bit entries come before their 32-bit counterparts so `x86_64` is not
/// read as `x86` and `arm64-v8a` is not read as an ARM 32-bit build.
const VARIANT_KEYWORDS: &[(Variant, &[&str])] = &[
    (
        Variant::Arm64V8a,
        &["arm64-v8a", "arm64_v8a", "arm64", "aarch64", "v8a"],
    ),
    (
        Variant::ArmeabiV7a,
        &["armeabi-v7a", "armeabi_v7a", "armeabi", "armv7", "v7a"],
    ),
    (Variant::X86_64, &["x86_64", "x86-64", "x64", "amd64"]),
    (Variant::X86, &["x86"]),
    (Variant::Universal, &["universal"]),
];

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Universal => "Universal",
            Variant::ArmeabiV7a => "Armeabi-v7a",
            Variant::Arm64V8a => "Arm64-v8a",
            Variant::X86 => "x86",
            Variant::X86_64 => "x86_64",
            Variant::Unknown => "Unknown",
        }
    }

    /// Classify a variant from a filename and link label, case-insensitively
    pub fn classify(text: &str) -> Option<Variant> {
        let text = text.to_lowercase();
        VARIANT_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
            .map(|(variant, _)| *variant)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a candidate offers for comparison against its baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSignal {
    /// Version string extracted from the page or download URL
    Version(String),
    /// Payload size in bytes, used when no version can be extracted
    Size(u64),
}

impl ChangeSignal {
    pub fn version(&self) -> Option<&str> {
        match self {
            ChangeSignal::Version(v) => Some(v),
            ChangeSignal::Size(_) => None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        match self {
            ChangeSignal::Version(_) => None,
            ChangeSignal::Size(size) => Some(*size),
        }
    }
}

/// One downloadable item discovered on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateArtifact {
    pub app_name: String,
    pub variant: Variant,
    pub signal: ChangeSignal,
    pub download_url: Url,
    pub source_page_url: Url,
}

impl CandidateArtifact {
    /// Key joining this candidate to its recorded baseline
    pub fn tracking_key(&self) -> String {
        tracking_key(&self.app_name, self.variant)
    }
}

/// One page to check and how to read it
#[derive(Debug, Clone)]
pub struct TargetSpec {
    pub url: Url,
    pub locator: LocatorKind,
    /// Pattern matched against resolved hrefs by link-based locators
    pub link_pattern: Option<Regex>,
    pub app_name: Option<String>,
    pub variant: Option<Variant>,
}

impl TargetSpec {
    pub fn new(url: Url, locator: LocatorKind) -> Self {
        Self {
            url,
            locator,
            link_pattern: None,
            app_name: None,
            variant: None,
        }
    }

    pub fn with_link_pattern(mut self, pattern: Regex) -> Self {
        self.link_pattern = Some(pattern);
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = Some(variant);
        self
    }
}
