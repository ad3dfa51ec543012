//! Version extraction from URLs, filenames, link labels and headers
//!
//! Download pages rarely expose a version in a structured field, so the
//! version is pulled out of whatever text is at hand. Each piece of text is
//! tagged with an [`ExtractionSource`] and the sources are tried in the order
//! the caller lists them.

use std::sync::LazyLock;

use regex::Regex;

/// Numeric core (2-4 components) followed by an optional `-`/`.` separated
/// alphanumeric suffix such as `-beta2`.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.\d+(?:\.\d+){0,2})((?:[.-][a-zA-Z0-9]+)*)")
        .expect("version pattern must compile")
});

/// `Version 4.8.1` style labels found in text surrounding a download link.
static VERSION_LABEL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bversion\s*:?\s*v?(\d+\.\d+(?:\.\d+)*)")
        .expect("version label pattern must compile")
});

/// Architecture tokens whose digits would otherwise be read as the start of
/// a version (`tsetup.x64.4.8.1.exe`).
static ARCH_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:x86_64|x86-64|x86|x64|amd64|arm64|aarch64|win64|win32)\b")
        .expect("architecture pattern must compile")
});

/// Suffix segments that belong to the filename rather than the version.
///
/// Architecture names are repeated here because `_` is a word character, so
/// `-arm64_v8a` escapes the masking pattern and reaches the suffix.
const NOISE_SEGMENTS: &[&str] = &[
    "apk", "apks", "xapk", "exe", "msi", "zip", "dmg", "armeabi", "arm", "armv7", "v7a", "v8a",
    "arm64", "aarch64", "x64", "x86", "amd64", "win64", "win32", "universal", "android",
    "windows", "setup",
];

/// Where a piece of text handed to the parser came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionSource {
    /// Path of the link target (query and host excluded)
    UrlPath,
    /// Filename segment of the URL reached after following redirects
    FinalUrlFilename,
    /// Filename announced by a `Content-Disposition` header
    ContentDisposition,
    /// Visible label of the download link
    LinkText,
    /// Text of the element enclosing the link; only `Version x.y.z` labels count
    SurroundingText,
}

impl ExtractionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionSource::UrlPath => "url_path",
            ExtractionSource::FinalUrlFilename => "final_url_filename",
            ExtractionSource::ContentDisposition => "content_disposition",
            ExtractionSource::LinkText => "link_text",
            ExtractionSource::SurroundingText => "surrounding_text",
        }
    }

    /// Extract a version from text originating from this source
    pub fn extract(&self, text: &str) -> Option<String> {
        match self {
            ExtractionSource::SurroundingText => extract_labeled_version(text),
            _ => extract_version(text),
        }
    }
}

/// A version together with the source that yielded it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedVersion {
    pub version: String,
    pub source: ExtractionSource,
}

/// Try each `(source, text)` pair in order and return the first hit
pub fn extract_first<'a, I>(candidates: I) -> Option<ExtractedVersion>
where
    I: IntoIterator<Item = (ExtractionSource, &'a str)>,
{
    candidates.into_iter().find_map(|(source, text)| {
        source
            .extract(text)
            .map(|version| ExtractedVersion { version, source })
    })
}

/// Extract the first version-looking substring from free text.
///
/// Architecture tokens are masked first, and suffix segments that are file
/// extensions or ABI names are cut off:
/// - `SampleApp-14.0.38-arm64-v8a.apk` -> `14.0.38`
/// - `app-2.1.0-beta3.apk` -> `2.1.0-beta3`
/// - `tsetup.x64.4.8.1.exe` -> `4.8.1`
pub fn extract_version(text: &str) -> Option<String> {
    let masked = ARCH_TOKEN_PATTERN.replace_all(text, " ");
    let captures = VERSION_PATTERN.captures(&masked)?;
    let core = captures.get(1)?.as_str();
    let suffix = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let mut version = core.to_string();
    for segment in split_suffix_segments(suffix) {
        let token = &segment[1..];
        if NOISE_SEGMENTS.contains(&token.to_ascii_lowercase().as_str()) {
            break;
        }
        version.push_str(segment);
    }
    Some(version)
}

/// Extract a version that follows a `Version` label
pub fn extract_labeled_version(text: &str) -> Option<String> {
    VERSION_LABEL_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Cut a raw version at the first character outside `[0-9.]` and trim dots.
///
/// Returns an empty string when nothing numeric is left, which callers treat
/// as "cannot be parsed structurally".
pub fn normalize_for_parse(version: &str) -> &str {
    let end = version
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(version.len());
    version[..end].trim_matches('.')
}

/// Split `-beta.2.apk` into `["-beta", ".2", ".apk"]`, keeping separators
fn split_suffix_segments(suffix: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (i, c) in suffix.char_indices().skip(1) {
        if c == '-' || c == '.' {
            segments.push(&suffix[start..i]);
            start = i;
        }
    }
    if start < suffix.len() {
        segments.push(&suffix[start..]);
    }
    segments
}
