//! Per-session answer store.

use std::collections::BTreeMap;

use serde::Serialize;

/// String map holding one session's answers for one workflow.
///
/// Keys are only ever overwritten, never removed, until the session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowStore {
    namespace: String,
    values: BTreeMap<String, String>,
}

impl WorkflowStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// The value for `key`, or `default` when absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// All values, optionally restricted to `keys`.
    pub fn context(&self, keys: Option<&[&str]>) -> BTreeMap<String, String> {
        match keys {
            None => self.values.clone(),
            Some(keys) => self
                .values
                .iter()
                .filter(|(k, _)| keys.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Every key as a JSON object of strings.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        )
    }

    /// Drop everything. Only called when the session ends.
    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }
}
