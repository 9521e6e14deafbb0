//! Local preference storage: the dark-mode flag.
//!
//! One store instance is constructed at startup and handed to whoever needs
//! it; there is no ambient global. The flag lives under a fixed key in a JSON
//! file, is read once at load, written through on every toggle, and each
//! toggle is published to watch subscribers.

use std::path::{Path, PathBuf};

use tokio::sync::watch;

use crate::error::Result;
use crate::models::Preferences;

pub struct PreferenceStore {
    path: PathBuf,
    preferences: Preferences,
    dark_mode_tx: watch::Sender<bool>,
}

impl PreferenceStore {
    /// Load preferences from the given file, defaulting when absent.
    ///
    /// A corrupt file is logged and treated as unset rather than failing
    /// startup; the next toggle rewrites it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let preferences = read_preferences(&path)?;
        let (dark_mode_tx, _) = watch::channel(preferences.dark_mode);

        Ok(Self {
            path,
            preferences,
            dark_mode_tx,
        })
    }

    /// Current dark-mode flag; false when never set.
    #[must_use]
    pub fn dark_mode(&self) -> bool {
        self.preferences.dark_mode
    }

    /// Flip the flag, persist it, then notify subscribers.
    ///
    /// The in-memory value changes only after the write lands, so the
    /// persisted and observed values never disagree.
    pub fn toggle_dark_mode(&mut self) -> Result<bool> {
        let mut next = self.preferences;
        next.dark_mode = !next.dark_mode;
        write_preferences(&self.path, next)?;

        self.preferences = next;
        self.dark_mode_tx.send_replace(next.dark_mode);
        Ok(next.dark_mode)
    }

    /// Subscribe to dark-mode changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.dark_mode_tx.subscribe()
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_preferences(path: &Path) -> Result<Preferences> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Preferences::default());
        }
        Err(error) => return Err(error.into()),
    };

    match serde_json::from_str(&raw) {
        Ok(preferences) => Ok(preferences),
        Err(error) => {
            tracing::warn!(
                "Ignoring unreadable preference file {}: {}",
                path.display(),
                error
            );
            Ok(Preferences::default())
        }
    }
}

fn write_preferences(path: &Path, preferences: Preferences) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let serialized = serde_json::to_string_pretty(&preferences)?;
    std::fs::write(path, serialized)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn store_in(dir: &Path) -> PreferenceStore {
        PreferenceStore::load(dir.join("preferences.json")).unwrap()
    }

    #[test]
    fn missing_file_defaults_to_light_mode() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(!store.dark_mode());
    }

    #[test]
    fn corrupt_file_is_treated_as_unset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "not json").unwrap();

        let store = PreferenceStore::load(&path).unwrap();
        assert!(!store.dark_mode());
    }

    #[test]
    fn toggle_twice_returns_to_original_and_persists_each_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());

        assert!(store.toggle_dark_mode().unwrap());
        assert!(store.dark_mode());
        let persisted = read_preferences(store.path()).unwrap();
        assert_eq!(persisted.dark_mode, store.dark_mode());

        assert!(!store.toggle_dark_mode().unwrap());
        assert!(!store.dark_mode());
        let persisted = read_preferences(store.path()).unwrap();
        assert_eq!(persisted.dark_mode, store.dark_mode());
    }

    #[test]
    fn toggled_value_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");

        let mut store = PreferenceStore::load(&path).unwrap();
        store.toggle_dark_mode().unwrap();
        drop(store);

        let reloaded = PreferenceStore::load(&path).unwrap();
        assert!(reloaded.dark_mode());
    }

    #[tokio::test]
    async fn subscribers_observe_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        let mut receiver = store.subscribe();

        assert!(!*receiver.borrow());

        store.toggle_dark_mode().unwrap();
        receiver.changed().await.unwrap();
        assert!(*receiver.borrow());
    }
}
