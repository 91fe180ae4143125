//! Injected key/value persistence for user preferences.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::domains::activity_types::ActivityTypeDefinition;

pub const THEME_KEY: &str = "theme";
pub const LOCALE_KEY: &str = "userLanguage";
pub const CUSTOM_TYPES_KEY: &str = "customActivityTypes";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed preference data: {0}")]
    Format(#[from] serde_json::Error),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON object on disk, rewritten on every `set`.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value);
        let body = serde_json::to_vec_pretty(&entries)?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        tokio::fs::write(&self.path, body).await.map_err(io_err)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-gb")]
    EnGb,
    #[serde(rename = "cs")]
    Cs,
    #[serde(rename = "it")]
    It,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PreferenceSnapshot {
    pub theme: Theme,
    pub locale: Locale,
    pub custom_activity_types: Vec<ActivityTypeDefinition>,
}

/// Typed view over a [`KeyValueStore`]. Unknown or corrupt values read back
/// as defaults.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    async fn read<T: for<'de> Deserialize<'de> + Default>(&self, key: &str) -> Result<T, StoreError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(T::default());
        };
        Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::debug!(key, error = %e, "ignoring unreadable preference");
            T::default()
        }))
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.set(key, serde_json::to_string(value)?).await
    }

    pub async fn theme(&self) -> Result<Theme, StoreError> {
        self.read(THEME_KEY).await
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.write(THEME_KEY, &theme).await
    }

    pub async fn locale(&self) -> Result<Locale, StoreError> {
        self.read(LOCALE_KEY).await
    }

    pub async fn set_locale(&self, locale: Locale) -> Result<(), StoreError> {
        self.write(LOCALE_KEY, &locale).await
    }

    pub async fn custom_types(&self) -> Result<Vec<ActivityTypeDefinition>, StoreError> {
        self.read(CUSTOM_TYPES_KEY).await
    }

    pub async fn set_custom_types(&self, types: &[ActivityTypeDefinition]) -> Result<(), StoreError> {
        self.write(CUSTOM_TYPES_KEY, &types).await
    }

    pub async fn snapshot(&self) -> Result<PreferenceSnapshot, StoreError> {
        Ok(PreferenceSnapshot {
            theme: self.theme().await?,
            locale: self.locale().await?,
            custom_activity_types: self.custom_types().await?,
        })
    }
}
