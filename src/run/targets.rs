//! Reading the list of pages to check

use std::fs;
use std::path::Path;

use tracing::{info, warn};
use url::Url;

use crate::error::RunError;

/// Read target URLs, one per line.
///
/// Blank lines and lines starting with `#` are skipped, as are lines that do
/// not parse as absolute http(s) URLs.
pub fn load_url_list(path: &Path) -> Result<Vec<Url>, RunError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RunError::MissingUrlList(path.to_path_buf()));
        }
        Err(source) => {
            return Err(RunError::ReadUrlList {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let urls: Vec<Url> = content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(index + 1, line))
        .collect();

    info!(path = %path.display(), targets = urls.len(), "Loaded URL list");
    Ok(urls)
}

fn parse_line(line_number: usize, line: &str) -> Option<Url> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    match Url::parse(line) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            warn!(line = line_number, scheme = url.scheme(), "Skipping URL with unsupported scheme");
            None
        }
        Err(e) => {
            warn!(line = line_number, value = line, error = %e, "Skipping invalid URL");
            None
        }
    }
}
