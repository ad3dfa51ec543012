use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::locator::types::{LocatorKind, Variant};

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_URL_LIST: &str = "urls_to_check.txt";
pub const DEFAULT_TRACKER_FILE: &str = "versions_tracker.json";
pub const DEFAULT_OUTPUT_FILE: &str = "updates_found.json";

/// Environment variable naming the CI step output file
pub const CI_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,fa;q=0.8";
pub const DEFAULT_REFERER: &str = "https://www.google.com/";

/// Top-level configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CheckerConfig {
    pub files: FilesConfig,
    pub http: HttpConfig,
    pub listing: ListingSelectors,
    pub logging: LoggingConfig,
    /// Routing rules, first match wins; unmatched URLs use the listing locator
    pub targets: Vec<TargetRule>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            files: FilesConfig::default(),
            http: HttpConfig::default(),
            listing: ListingSelectors::default(),
            logging: LoggingConfig::default(),
            targets: default_target_rules(),
        }
    }
}

impl CheckerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::from_file)
    }

    /// CI output file: the configured path, else `$GITHUB_OUTPUT`
    pub fn ci_output_path(&self) -> Option<PathBuf> {
        ci_output_with_env(
            self.files.ci_output.clone(),
            std::env::var(CI_OUTPUT_ENV).ok(),
        )
    }
}

/// Input and output locations
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct FilesConfig {
    pub url_list: PathBuf,
    pub tracker: PathBuf,
    pub output: PathBuf,
    pub ci_output: Option<PathBuf>,
    /// Write discovered versions back to the tracker after the run
    pub update_tracker: bool,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            url_list: PathBuf::from(DEFAULT_URL_LIST),
            tracker: PathBuf::from(DEFAULT_TRACKER_FILE),
            output: PathBuf::from(DEFAULT_OUTPUT_FILE),
            ci_output: None,
            update_tracker: false,
        }
    }
}

/// Request settings shared by every fetch in a run
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept_language: String,
    pub referer: Option<String>,
    pub timeout_secs: u64,
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            referer: Some(DEFAULT_REFERER.to_string()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// CSS selectors describing a download box page
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingSelectors {
    pub container: String,
    pub list: String,
    pub item: String,
    pub link: String,
    pub label: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container: "section.downloadbox".to_string(),
            list: "ul.download-links".to_string(),
            item: "li.download-link".to_string(),
            link: "a.download-btn".to_string(),
            label: "span.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

/// Maps a host (and optional path prefix) to a locator
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetRule {
    /// Exact host or parent domain (`telegram.org` matches `www.telegram.org`)
    pub host: String,
    #[serde(default)]
    pub path_prefix: Option<String>,
    pub locator: LocatorKind,
    /// Regex over resolved hrefs, required by link-based locators
    #[serde(default)]
    pub link_pattern: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub variant: Option<Variant>,
}

fn default_target_rules() -> Vec<TargetRule> {
    vec![
        TargetRule {
            host: "desktop.telegram.org".to_string(),
            path_prefix: None,
            locator: LocatorKind::DirectLink,
            link_pattern: Some(r"(?i)tsetup[.-]x64.*\.exe".to_string()),
            app_name: Some("Telegram Desktop".to_string()),
            variant: Some(Variant::X86_64),
        },
        TargetRule {
            host: "telegram.org".to_string(),
            path_prefix: Some("/android".to_string()),
            locator: LocatorKind::RedirectChain,
            link_pattern: Some(r"^https?://(?:www\.)?telegram\.org/dl/android/apk".to_string()),
            app_name: Some("Telegram".to_string()),
            variant: Some(Variant::Universal),
        },
        TargetRule {
            host: "farsroid.com".to_string(),
            path_prefix: None,
            locator: LocatorKind::Listing,
            link_pattern: None,
            app_name: None,
            variant: None,
        },
    ]
}

fn ci_output_with_env(configured: Option<PathBuf>, env_value: Option<String>) -> Option<PathBuf> {
    configured.or_else(|| env_value.filter(|v| !v.is_empty()).map(PathBuf::from))
}

/// Returns the path to the data directory for app-update-checker.
/// Uses $XDG_DATA_HOME/app-update-checker if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/app-update-checker,
/// or ./app-update-checker if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path of the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("app-update-checker.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("app-update-checker")
}
