//! Tracking keys and filename sanitization
//!
//! A tracking key is the join between a discovered artifact and its recorded
//! baseline. It must come out identical on every run for the same app and
//! variant, otherwise the history for that app silently resets.

use std::sync::LazyLock;

use regex::Regex;

use crate::locator::types::Variant;

/// Parenthesised groups such as a site's `(Farsroid.com)` branding tag
static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("parenthesis pattern must compile"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

/// Characters that are not allowed in filenames on common platforms
static FILENAME_ILLEGAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("filename pattern must compile"));

/// Normalize free text into a key fragment.
///
/// Lower-cases, drops parenthesised branding, strips stray parentheses and
/// collapses whitespace runs to `_`. With `for_filename` set, characters that
/// are illegal in filenames are replaced with `_` as well.
pub fn sanitize_text(text: &str, for_filename: bool) -> String {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return text;
    }

    let without_groups = PARENTHESISED.replace_all(&text, "");
    let mut cleaned: String = without_groups
        .trim()
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .collect();

    if for_filename {
        cleaned = FILENAME_ILLEGAL.replace_all(&cleaned, "_").into_owned();
    }

    WHITESPACE.replace_all(cleaned.trim(), "_").into_owned()
}

/// Derive the tracking key for an app and variant
pub fn tracking_key(app_name: &str, variant: Variant) -> String {
    format!(
        "{}_{}",
        sanitize_text(app_name, false),
        sanitize_text(variant.as_str(), false)
    )
    .to_lowercase()
}

/// Suggested filename for a downloaded artifact.
///
/// `{app}_v{version}_{variant}.{ext}` when a version is known, otherwise
/// `{app}_{variant}.{ext}`.
pub fn suggested_filename(
    app_name: &str,
    version: Option<&str>,
    variant: Variant,
    extension: &str,
) -> String {
    let app = sanitize_text(app_name, true);
    let variant = sanitize_text(variant.as_str(), true);
    match version {
        Some(version) => format!("{app}_v{version}_{variant}.{extension}"),
        None => format!("{app}_{variant}.{extension}"),
    }
}
