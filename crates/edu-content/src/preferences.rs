//! Locally persisted display preferences.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SiteError};
use crate::model::Lang;

/// Preferences kept between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Display language for the public site.
    #[serde(default)]
    pub language: Lang,
}

/// Preferences backed by a JSON file.
///
/// The file is read once when the store is opened and rewritten on every
/// change.
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: Preferences,
}

impl PreferenceStore {
    /// Opens the preference file at `path`.
    ///
    /// A missing or unreadable file yields the defaults; the file is not
    /// created until the first change.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable preferences");
                Preferences::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No preferences file, using defaults");
                Preferences::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read preferences");
                Preferences::default()
            }
        };
        Self { path, current }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the current preferences.
    #[must_use]
    pub const fn get(&self) -> Preferences {
        self.current
    }

    /// Returns the current display language.
    #[must_use]
    pub const fn language(&self) -> Lang {
        self.current.language
    }

    /// Changes the display language and writes the file.
    ///
    /// # Errors
    ///
    /// Returns [`SiteError::PreferenceWrite`] if the file cannot be written.
    /// The in-memory value is changed only after a successful write.
    pub fn set_language(&mut self, language: Lang) -> Result<()> {
        let next = Preferences { language };
        self.write(&next)?;
        self.current = next;
        debug!(language = %language, "Display language saved");
        Ok(())
    }

    fn write(&self, preferences: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SiteError::preference_write(&self.path, e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, json)
            .map_err(|e| SiteError::preference_write(&self.path, e.to_string()))
    }
}
