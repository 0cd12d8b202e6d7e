//! Runtime settings from the environment (and `.env`).

use std::path::PathBuf;
use std::sync::Arc;

use crate::data::{CsvSource, DirSource, HttpSource};

pub const ENV_BASE_URL: &str = "DCHARTS_BASE_URL";
pub const ENV_DATA_DIR: &str = "DCHARTS_DATA_DIR";
pub const ENV_PREFS: &str = "DCHARTS_PREFS";
pub const ENV_LOG: &str = "DCHARTS_LOG";

pub const DEFAULT_PREFS_PATH: &str = ".dcharts/preferences.json";
pub const TUI_LOG_PATH: &str = ".dcharts/tui.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// When set, CSVs are fetched over HTTP from this origin.
    pub base_url: Option<String>,
    /// Local root used when no base URL is configured.
    pub data_dir: PathBuf,
    pub prefs_path: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            data_dir: PathBuf::from("."),
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
        }
    }
}

impl Settings {
    /// Load `.env` (if present) and read the `DCHARTS_*` variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            base_url: get(ENV_BASE_URL),
            data_dir: get(ENV_DATA_DIR).map_or(defaults.data_dir, PathBuf::from),
            prefs_path: get(ENV_PREFS).map_or(defaults.prefs_path, PathBuf::from),
        }
    }

    /// Apply command-line overrides. `--data-dir` also clears any base URL.
    pub fn with_overrides(mut self, base_url: Option<String>, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
            self.base_url = None;
        }
        if let Some(url) = base_url {
            self.base_url = Some(url);
        }
        self
    }

    pub fn source(&self) -> Arc<dyn CsvSource> {
        match &self.base_url {
            Some(url) => Arc::new(HttpSource::new(url.clone())),
            None => Arc::new(DirSource::new(self.data_dir.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(Settings::from_lookup(lookup(&[])), Settings::default());
    }

    #[test]
    fn reads_every_variable_and_ignores_blanks() {
        let s = Settings::from_lookup(lookup(&[
            (ENV_BASE_URL, " https://example.org "),
            (ENV_DATA_DIR, "  "),
            (ENV_PREFS, "/tmp/prefs.json"),
        ]));
        assert_eq!(s.base_url.as_deref(), Some("https://example.org"));
        assert_eq!(s.data_dir, PathBuf::from("."));
        assert_eq!(s.prefs_path, PathBuf::from("/tmp/prefs.json"));
        assert_eq!(s.source().describe(), "https://example.org");
    }

    #[test]
    fn data_dir_override_switches_to_local_source() {
        let s = Settings::from_lookup(lookup(&[(ENV_BASE_URL, "https://example.org")]))
            .with_overrides(None, Some(PathBuf::from("data")));
        assert_eq!(s.base_url, None);
        assert_eq!(s.source().describe(), "data");
    }
}
