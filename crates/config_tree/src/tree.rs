use crate::error::ConfigError;
use crate::value::ConfigValue;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;

/// Insertion-ordered nested configuration.
///
/// Lookups are linear; configuration trees hold tens of keys, and keeping the
/// order the defaults were written in makes persisted `config.json` files
/// diffable against the factory that produced them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigTree {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts or replaces `key`, keeping the original position on replace.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Resolves a dotted path such as `reward_config.scales.feet_air_time`.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&ConfigValue> {
        let mut parts = path.split('.');
        let mut current = self.get(parts.next()?)?;
        for part in parts {
            current = current.as_tree()?.get(part)?;
        }
        Some(current)
    }

    #[must_use]
    pub fn subtree(&self, key: &str) -> Option<&ConfigTree> {
        self.get(key).and_then(ConfigValue::as_tree)
    }

    pub fn subtree_mut(&mut self, key: &str) -> Option<&mut ConfigTree> {
        self.get_mut(key).and_then(ConfigValue::as_tree_mut)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_path(key).and_then(ConfigValue::as_bool)
    }

    #[must_use]
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_path(key).and_then(ConfigValue::as_i64)
    }

    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get_path(key).and_then(ConfigValue::as_f64)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get_path(key).and_then(ConfigValue::as_str)
    }

    /// Like [`ConfigTree::get_f64`] but reports a missing or mistyped key.
    pub fn require_f64(&self, key: &str) -> Result<f64, ConfigError> {
        let value = self
            .get_path(key)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        value.as_f64().ok_or(ConfigError::TypeMismatch {
            key: key.to_string(),
            expected: "a number",
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applies dotted-key overrides (`a.b.c = v`) to existing keys.
    ///
    /// Unlike [`ConfigTree::merge`], an override naming a key the tree does
    /// not have is an error: these overrides come from code, not from flags,
    /// and a typo should not be silently ignored.
    ///
    /// [`ConfigTree::merge`]: crate::ConfigTree::merge
    pub fn update_from_flattened(&mut self, overrides: &ConfigTree) -> Result<(), ConfigError> {
        for (path, value) in overrides.iter() {
            let slot = self
                .lookup_path_mut(path)
                .ok_or_else(|| ConfigError::UnknownKey(path.to_string()))?;
            *slot = value.clone().coerced_to(slot);
        }
        Ok(())
    }

    fn lookup_path_mut(&mut self, path: &str) -> Option<&mut ConfigValue> {
        let mut parts = path.split('.');
        let mut current = self.get_mut(parts.next()?)?;
        for part in parts {
            current = current.as_tree_mut()?.get_mut(part)?;
        }
        Some(current)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<ConfigValue>(json)? {
            ConfigValue::Tree(tree) => Ok(tree),
            _ => Err(ConfigError::NotAnObject),
        }
    }

    /// Writes the tree as pretty JSON, creating or truncating `path`.
    pub fn save_json(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }
}

impl Serialize for ConfigTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConfigTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match ConfigValue::deserialize(deserializer)? {
            ConfigValue::Tree(tree) => Ok(tree),
            other => Err(serde::de::Error::custom(format!(
                "expected a map, found {}",
                other.kind()
            ))),
        }
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json_pretty() {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}
