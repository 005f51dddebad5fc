//! Constructor arguments handed to plugin factories

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed constructor arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginArgs {
    values: Map<String, Value>,
}

impl PluginArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// `default` when `key` is absent; a present value must be a
    /// non-negative integer.
    pub fn u64_or(&self, key: &str, default: u64) -> anyhow::Result<u64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_u64().ok_or_else(|| {
                anyhow::anyhow!("'{}' must be a non-negative integer, got {}", key, value)
            }),
        }
    }

    /// `default` when `key` is absent; a present value must be a number.
    pub fn f64_or(&self, key: &str, default: f64) -> anyhow::Result<f64> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value
                .as_f64()
                .ok_or_else(|| anyhow::anyhow!("'{}' must be a number, got {}", key, value)),
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    /// Fill keys missing here from `defaults`; existing keys win.
    pub fn merged_over(mut self, defaults: &Map<String, Value>) -> Self {
        for (key, value) in defaults {
            self.values
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }
}
