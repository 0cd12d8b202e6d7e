//! Where the pre-generated CSV snapshots come from.
//!
//! The dashboard only ever issues plain GETs for relative paths such as
//! `output/consensus/output_explorers.csv`. Two backends implement that:
//! an HTTP origin (the deployed static site) and a local directory (a checkout
//! of the data repository).

use std::path::{Path, PathBuf};

use reqwest::blocking::Client;

use crate::error::AppError;

/// A read-only store of CSV files addressed by relative path.
pub trait CsvSource: Send + Sync {
    /// Fetch the full text of `path`. No retries.
    fn fetch(&self, path: &str) -> Result<String, AppError>;

    /// Human-readable origin, for headers and logs.
    fn describe(&self) -> String;
}

pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl CsvSource for HttpSource {
    fn fetch(&self, path: &str) -> Result<String, AppError> {
        let url = self.url_for(path);
        tracing::debug!(%url, "fetching csv");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| AppError::new(4, format!("Request for {url} failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("Request for {url} failed with status {}.", resp.status()),
            ));
        }

        let body = resp
            .text()
            .map_err(|e| AppError::new(4, format!("Failed to read response body from {url}: {e}")))?;
        tracing::debug!(%url, bytes = body.len(), "fetched csv");
        Ok(body)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}

pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CsvSource for DirSource {
    fn fetch(&self, path: &str) -> Result<String, AppError> {
        let full = self.root.join(path.trim_start_matches('/'));
        tracing::debug!(path = %full.display(), "reading csv");
        std::fs::read_to_string(&full)
            .map_err(|e| AppError::new(4, format!("Failed to read {}: {e}", full.display())))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_join_with_a_single_slash() {
        let src = HttpSource::new("https://example.org/data/");
        assert_eq!(
            src.url_for("/output/network/output_organizations.csv"),
            "https://example.org/data/output/network/output_organizations.csv"
        );
        assert_eq!(src.describe(), "https://example.org/data/");
    }

    #[test]
    fn dir_source_reads_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("output/governance");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("gini.csv"), "date,ledger\n").unwrap();

        let src = DirSource::new(dir.path());
        assert_eq!(src.fetch("output/governance/gini.csv").unwrap(), "date,ledger\n");
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DirSource::new(dir.path()).fetch("nope.csv").unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().contains("nope.csv"));
    }
}
