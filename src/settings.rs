//! Shared settings store
//!
//! A small key-value store scoped to an app group. Both the main app and the
//! extension read and write it, so every change is written straight through to
//! disk.

use crate::error::{ExtensionError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Setting keys shared with the main app
pub mod keys {
    pub const LAST_ACTIVITY_DATE: &str = "lastActivityDate";
    pub const APP_ID: &str = "appId";
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";
    pub const LOCK_TYPE: &str = "lockType";
}

const SETTINGS_FILE: &str = "settings.json";

pub struct SettingsStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl SettingsStore {
    /// Open the store in an app-group directory, creating it if needed
    pub fn open(app_group_dir: &Path) -> Result<Self> {
        if !app_group_dir.exists() {
            fs::create_dir_all(app_group_dir)
                .map_err(|e| ExtensionError::SettingsError(e.to_string()))?;
        }

        let path = app_group_dir.join(SETTINGS_FILE);
        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| ExtensionError::SettingsError(e.to_string()))?;
            match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    warn!("Settings file is corrupt, starting empty: {}", e);
                    Map::new()
                }
            }
        } else {
            Map::new()
        };

        debug!("Opened settings store with {} keys", values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Read a value; missing or mistyped values read as `None`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let values = self.values.read().ok()?;
        let value = values.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!("Setting {} has unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Insert or replace a value and persist the store
    pub fn add_or_update<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        {
            let mut values = self
                .values
                .write()
                .map_err(|_| ExtensionError::SettingsError("settings lock poisoned".to_string()))?;
            values.insert(key.to_string(), value);
        }
        self.flush()
    }

    pub fn flush(&self) -> Result<()> {
        let content = {
            let values = self
                .values
                .read()
                .map_err(|_| ExtensionError::SettingsError("settings lock poisoned".to_string()))?;
            serde_json::to_string_pretty(&*values)?
        };
        fs::write(&self.path, content).map_err(|e| ExtensionError::SettingsError(e.to_string()))
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.get(keys::LAST_ACTIVITY_DATE)
    }

    pub fn touch_last_activity(&self) -> Result<DateTime<Utc>> {
        let now = Utc::now();
        self.add_or_update(keys::LAST_ACTIVITY_DATE, now)?;
        Ok(now)
    }

    /// Installation id shared with the main app, created on first use
    pub fn app_id(&self) -> Result<Uuid> {
        if let Some(id) = self.get::<Uuid>(keys::APP_ID) {
            return Ok(id);
        }
        let id = Uuid::new_v4();
        self.add_or_update(keys::APP_ID, id)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_persist_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path()).unwrap();
        store.add_or_update(keys::IS_AUTHENTICATED, true).unwrap();
        let stamp = store.touch_last_activity().unwrap();

        let reopened = SettingsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get::<bool>(keys::IS_AUTHENTICATED), Some(true));
        assert_eq!(reopened.last_activity(), Some(stamp));
    }

    #[test]
    fn test_mistyped_value_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path()).unwrap();
        store.add_or_update(keys::IS_AUTHENTICATED, "yes").unwrap();
        assert_eq!(store.get::<bool>(keys::IS_AUTHENTICATED), None);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SETTINGS_FILE), "{not json").unwrap();
        let store = SettingsStore::open(dir.path()).unwrap();
        assert!(store.last_activity().is_none());
    }

    #[test]
    fn test_app_id_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path()).unwrap();
        let first = store.app_id().unwrap();
        assert_eq!(store.app_id().unwrap(), first);

        let reopened = SettingsStore::open(dir.path()).unwrap();
        assert_eq!(reopened.app_id().unwrap(), first);

        let other = tempfile::tempdir().unwrap();
        assert_ne!(SettingsStore::open(other.path()).unwrap().app_id().unwrap(), first);
    }
}
