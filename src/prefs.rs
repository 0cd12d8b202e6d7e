//! Persisted user preferences.
//!
//! A small JSON object with two fixed keys:
//!
//! ```json
//! { "theme": "dark", "withoutTor": true }
//! ```
//!
//! A missing or unreadable file yields the defaults; nothing else is stored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::Theme;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub theme: Theme,
    pub without_tor: bool,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Preferences {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "no preferences file, using defaults");
                return Preferences::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt preferences file");
            Preferences::default()
        })
    }

    pub fn save(&self, prefs: &Preferences) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::new(2, format!("Failed to create {}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string_pretty(prefs)
            .map_err(|e| AppError::new(4, format!("Failed to serialize preferences: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| AppError::new(2, format!("Failed to write {}: {e}", self.path.display())))
    }

    /// Load, apply `f`, save, and return the updated preferences.
    pub fn update<F>(&self, f: F) -> Result<Preferences, AppError>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.load();
        f(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load(), Preferences::default());
        assert_eq!(store.load().theme, Theme::Light);
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(PreferenceStore::new(path).load(), Preferences::default());
    }

    #[test]
    fn saves_with_fixed_keys_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/prefs.json");
        let store = PreferenceStore::new(&path);

        let prefs = store
            .update(|p| {
                p.theme = p.theme.toggled();
                p.without_tor = true;
            })
            .unwrap();
        assert_eq!(prefs.theme, Theme::Dark);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw, serde_json::json!({ "theme": "dark", "withoutTor": true }));
        assert_eq!(store.load(), prefs);
    }

    #[test]
    fn partial_file_fills_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"withoutTor": true}"#).unwrap();
        let prefs = PreferenceStore::new(path).load();
        assert_eq!(prefs, Preferences { theme: Theme::Light, without_tor: true });
    }
}
