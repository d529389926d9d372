use std::collections::HashMap;
use std::io;

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::config::Preferences;

pub const ASSIGNEE_CAPS_KEY: &str = "assigneeCaps";
pub const SPRINT_DAYS_KEY: &str = "sprintDaysConfig";
pub const PROGRAM_END_DATE_KEY: &str = "programEndDate";
pub const PROJECT_TARGETS_KEY: &str = "projectTargets";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type PreferenceResult<T> = Result<T, PreferenceError>;

/// Flat key/value storage for dashboard settings. Values are JSON documents.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> PreferenceResult<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> PreferenceResult<()>;
    fn remove(&self, key: &str) -> PreferenceResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> PreferenceResult<Option<Value>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> PreferenceResult<()> {
        self.values.write().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> PreferenceResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

fn load_key<T: DeserializeOwned + Default>(store: &dyn PreferenceStore, key: &str) -> T {
    let loaded = store
        .get(key)
        .and_then(|value| match value {
            Some(value) => Ok(Some(serde_json::from_value::<T>(value)?)),
            None => Ok(None),
        });
    match loaded {
        Ok(value) => value.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring unreadable preference");
            T::default()
        }
    }
}

fn save_key<T: Serialize>(store: &dyn PreferenceStore, key: &str, value: &T) -> PreferenceResult<()> {
    store.set(key, serde_json::to_value(value)?)
}

/// Restores each setting independently; an unreadable entry falls back to
/// its default without affecting the others.
pub fn load_preferences(store: &dyn PreferenceStore) -> Preferences {
    Preferences {
        assignee_caps: load_key(store, ASSIGNEE_CAPS_KEY),
        sprint_days_config: load_key(store, SPRINT_DAYS_KEY),
        program_end_date: load_key(store, PROGRAM_END_DATE_KEY),
        project_targets: load_key(store, PROJECT_TARGETS_KEY),
    }
}

/// Writes every setting; a cleared program end date removes its key.
pub fn save_preferences(store: &dyn PreferenceStore, preferences: &Preferences) -> PreferenceResult<()> {
    save_key(store, ASSIGNEE_CAPS_KEY, &preferences.assignee_caps)?;
    save_key(store, SPRINT_DAYS_KEY, &preferences.sprint_days_config)?;
    match preferences.program_end_date {
        Some(date) => save_key(store, PROGRAM_END_DATE_KEY, &date)?,
        None => store.remove(PROGRAM_END_DATE_KEY)?,
    }
    save_key(store, PROJECT_TARGETS_KEY, &preferences.project_targets)?;
    Ok(())
}

impl Preferences {
    pub fn load(store: &dyn PreferenceStore) -> Self {
        load_preferences(store)
    }

    pub fn save(&self, store: &dyn PreferenceStore) -> PreferenceResult<()> {
        save_preferences(store, self)
    }
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::JsonFilePreferenceStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqlitePreferenceStore;
