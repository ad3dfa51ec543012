//! Shared setup for end-to-end runs

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;
use tokio::net::TcpListener;

use app_update_checker::config::{CheckerConfig, FilesConfig, HttpConfig};

/// Temporary directory holding the inputs and outputs of one run
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_urls(&self, urls: &[String]) {
        fs::write(self.path("urls_to_check.txt"), urls.join("\n")).unwrap();
    }

    pub fn write_tracker(&self, tracker: Value) {
        fs::write(
            self.path("versions_tracker.json"),
            serde_json::to_string_pretty(&tracker).unwrap(),
        )
        .unwrap();
    }

    /// Config pointing every file into the workspace, with the CI output
    /// file set explicitly
    pub fn config(&self) -> CheckerConfig {
        CheckerConfig {
            files: FilesConfig {
                url_list: self.path("urls_to_check.txt"),
                tracker: self.path("versions_tracker.json"),
                output: self.path("updates_found.json"),
                ci_output: Some(self.path("github_output.txt")),
                update_tracker: false,
            },
            http: HttpConfig {
                timeout_secs: 5,
                ..HttpConfig::default()
            },
            ..CheckerConfig::default()
        }
    }

    pub fn read_report(&self) -> Vec<Value> {
        let content = fs::read_to_string(self.path("updates_found.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    pub fn read_tracker(&self) -> Value {
        let content = fs::read_to_string(self.path("versions_tracker.json")).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    pub fn read_ci_output(&self) -> String {
        fs::read_to_string(self.path("github_output.txt")).unwrap()
    }
}

/// Listing page with one `(href, label)` entry per variant
pub fn listing_page(title: &str, entries: &[(&str, &str)]) -> String {
    let items: String = entries
        .iter()
        .map(|(href, label)| {
            format!(
                r#"<li class="download-link"><a class="download-btn" href="{href}"><span class="txt">{label}</span></a></li>"#
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>{title}</title></head>
<body>
  <h1 class="post-title">{title}</h1>
  <section class="downloadbox">
    <ul class="download-links">{items}</ul>
  </section>
</body>
</html>"#
    )
}

/// Base URL of a server that accepts connections and never answers
pub async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}
