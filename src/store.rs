//! Persisted widget state: the main location and the saved city list, kept as
//! a single JSON document on disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::City;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppState {
    #[serde(default)]
    pub main: Option<City>,

    #[serde(default)]
    pub cities: Vec<City>,
}

impl AppState {
    pub fn contains(&self, name: &str) -> bool {
        self.cities.iter().any(|c| c.name == name)
    }

    pub fn is_main(&self, name: &str) -> bool {
        self.main.as_ref().is_some_and(|m| m.name == name)
    }

    /// Drops later entries that repeat an earlier name.
    fn dedup(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.cities.len());
        self.cities.retain(|c| {
            if seen.contains(&c.name) {
                false
            } else {
                seen.push(c.name.clone());
                true
            }
        });
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state file I/O: {0}")]
    Io(#[from] io::Error),
    #[error("state file encoding: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored state, or the empty default when the file is missing
    /// or unreadable.
    pub fn load(&self) -> AppState {
        match self.try_load() {
            Ok(Some(state)) => {
                tracing::debug!(path = %self.path.display(), cities = state.cities.len(), "loaded state");
                state
            }
            Ok(None) => AppState::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "ignoring stored state: {e}");
                AppState::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<AppState>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // a stored `null` counts as absent
        let state: Option<AppState> = serde_json::from_str(&raw)?;
        Ok(state.map(|mut s| {
            s.dedup();
            s
        }))
    }

    /// Overwrites the stored state. Failures are logged and otherwise ignored.
    pub fn save(&self, state: &AppState) {
        if let Err(e) = self.try_save(state) {
            tracing::warn!(path = %self.path.display(), "failed to save state: {e}");
        }
    }

    fn try_save(&self, state: &AppState) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string(state)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
