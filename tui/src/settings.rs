use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

/// Key the stream endpoint is stored under.
pub const ENDPOINT_KEY: &str = "api_endpoint";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// String key-value persistence for client settings.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// Settings kept in a flat TOML file, rewritten on every change.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettingsStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, values })
    }

    /// `<config dir>/progress-stream/settings.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("progress-stream").join("settings.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string(&self.values)?)?;
        info!("Saved setting '{}' to {}", key, self.path.display());
        Ok(())
    }
}

/// In-memory store, for tests and for runs without a config directory.
#[derive(Debug, Default)]
pub struct MemorySettingsStore(BTreeMap<String, String>);

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.0.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persisted endpoint, or an empty string when none was saved.
pub fn load_endpoint(store: &impl SettingsStore) -> String {
    store.get(ENDPOINT_KEY).unwrap_or_default()
}

pub fn save_endpoint(store: &mut impl SettingsStore, endpoint: &str) -> Result<(), SettingsError> {
    store.set(ENDPOINT_KEY, endpoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::open(dir.path().join("settings.toml")).unwrap();
        assert_eq!(load_endpoint(&store), "");
    }

    #[test]
    fn saved_endpoint_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut store = FileSettingsStore::open(&path).unwrap();
        save_endpoint(&mut store, "http://127.0.0.1:8080/stream").unwrap();

        let reopened = FileSettingsStore::open(&path).unwrap();
        assert_eq!(load_endpoint(&reopened), "http://127.0.0.1:8080/stream");

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("api_endpoint"));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_endpoint = ").unwrap();

        assert!(matches!(
            FileSettingsStore::open(&path),
            Err(SettingsError::TomlParse(_))
        ));
    }

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemorySettingsStore::default();
        assert_eq!(load_endpoint(&store), "");
        save_endpoint(&mut store, "http://x").unwrap();
        assert_eq!(load_endpoint(&store), "http://x");
    }
}
