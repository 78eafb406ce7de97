//! Settings remembered between runs
//!
//! Stored as TOML next to where kodiscope is started (`.kodiscope.toml` by
//! default). A missing file is normal on first run; an unreadable or
//! malformed one is logged and replaced by defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kodiscope_tui::AppState;
use kodiscope_types::LevelSelection;

/// Default session file name
pub const DEFAULT_SESSION_FILE: &str = ".kodiscope.toml";

/// Session settings stored on disk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    /// Last monitored log file
    pub path: Option<PathBuf>,

    /// Load the whole file instead of the tail window
    pub full_load: bool,

    /// Selected levels (empty = all)
    pub levels: LevelSelection,

    /// Selected keyword list name
    pub keyword_list: Option<String>,
}

impl Session {
    /// Load the session, falling back to defaults
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read session file");
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "malformed session file, using defaults");
                Self::default()
            }
        }
    }

    /// Save the session to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize session")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write session file {}", path.display()))
    }

    /// Capture the settings worth remembering from the running app
    pub fn capture(state: &AppState) -> Self {
        Self {
            path: state.path.clone(),
            full_load: state.full_load,
            levels: state.levels.clone(),
            keyword_list: state.keyword_list.clone(),
        }
    }

    /// Restore remembered settings into a fresh app state
    ///
    /// A remembered file that no longer exists is not reopened, and a keyword
    /// list that is gone from the keyword directory is not selected.
    pub fn apply(&self, state: &mut AppState) {
        if let Some(path) = &self.path
            && path.exists()
        {
            state.set_path(path);
        }
        state.full_load = self.full_load;
        state.levels = self.levels.clone();

        if let Some(name) = &self.keyword_list
            && state.keyword_lists.contains(name)
        {
            state.select_keyword_list(Some(name.clone()));
        }
    }
}
