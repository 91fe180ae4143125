//! Registry of activity types: built-in, derived and user-defined.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sessions::{EATING_TYPE, VISIT_TYPE};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityTypeDefinition {
    pub key: String,
    pub label: String,
    /// CSS hex color, e.g. `#3b82f6`.
    pub color: String,
    pub icon: String,
}

impl ActivityTypeDefinition {
    pub fn new(key: &str, label: &str, color: &str, icon: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TypeOrigin {
    BuiltIn,
    /// Synthesized from another collection; cannot be logged directly.
    Derived,
    Custom,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RegisteredType {
    #[serde(flatten)]
    pub definition: ActivityTypeDefinition,
    pub origin: TypeOrigin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("activity type '{0}' already exists")]
    DuplicateKey(String),
    #[error("invalid activity type key '{0}': use lowercase letters, digits and underscores")]
    InvalidKey(String),
    #[error("invalid color '{0}': expected #rrggbb")]
    InvalidColor(String),
}

fn builtins() -> Vec<RegisteredType> {
    let built_in = |d| RegisteredType {
        definition: d,
        origin: TypeOrigin::BuiltIn,
    };
    let derived = |d| RegisteredType {
        definition: d,
        origin: TypeOrigin::Derived,
    };
    vec![
        built_in(ActivityTypeDefinition::new("sleeping", "Sleeping", "#3b82f6", "😴")),
        built_in(ActivityTypeDefinition::new("tummy_time", "Tummy Time", "#10b981", "🤸")),
        built_in(ActivityTypeDefinition::new("walking", "Walking", "#f59e0b", "🚶")),
        derived(ActivityTypeDefinition::new(EATING_TYPE, "Eating", "#ec4899", "🍼")),
        derived(ActivityTypeDefinition::new(VISIT_TYPE, "Doctor Visit", "#8b5cf6", "🩺")),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActivityTypeRegistry {
    types: Vec<RegisteredType>,
}

impl Default for ActivityTypeRegistry {
    fn default() -> Self {
        Self { types: builtins() }
    }
}

impl ActivityTypeRegistry {
    /// Built-ins plus previously saved custom types. Saved entries that clash
    /// with an existing key are skipped.
    pub fn with_custom(custom: impl IntoIterator<Item = ActivityTypeDefinition>) -> Self {
        let mut registry = Self::default();
        for def in custom {
            if let Err(e) = registry.register_custom(def) {
                tracing::debug!(error = %e, "skipping stored activity type");
            }
        }
        registry
    }

    pub fn register_custom(&mut self, def: ActivityTypeDefinition) -> Result<(), RegistryError> {
        let key_ok = !def.key.is_empty()
            && def
                .key
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !key_ok {
            return Err(RegistryError::InvalidKey(def.key));
        }
        let color_ok = def.color.len() == 7
            && def.color.starts_with('#')
            && def.color[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !color_ok {
            return Err(RegistryError::InvalidColor(def.color));
        }
        if self.get(&def.key).is_some() {
            return Err(RegistryError::DuplicateKey(def.key));
        }
        self.types.push(RegisteredType {
            definition: def,
            origin: TypeOrigin::Custom,
        });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&RegisteredType> {
        self.types.iter().find(|t| t.definition.key == key)
    }

    /// Registration order: built-ins, derived, then custom.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredType> {
        self.types.iter()
    }

    pub fn custom(&self) -> Vec<ActivityTypeDefinition> {
        self.types
            .iter()
            .filter(|t| t.origin == TypeOrigin::Custom)
            .map(|t| t.definition.clone())
            .collect()
    }

    /// Whether a user may start or enter this type by hand.
    pub fn is_loggable(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|t| t.origin != TypeOrigin::Derived)
    }

    /// Label for a key, falling back to the key itself for unknown types.
    pub fn label(&self, key: &str) -> String {
        self.get(key)
            .map(|t| t.definition.label.clone())
            .unwrap_or_else(|| key.to_string())
    }
}
