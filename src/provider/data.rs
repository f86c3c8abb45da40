//! Attribute store of one resource instance
//!
//! [`ResourceData`] is what the surrounding framework hands to every operation:
//! the persisted identifier plus a flat map of named, dynamically typed values.
//! Handlers never work on it directly; each resource kind converts it to a
//! typed model on the way in and writes the model back on the way out.

use super::error::{ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Dynamically typed attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, AttrValue>> {
        match self {
            AttrValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(value: Vec<String>) -> Self {
        AttrValue::List(value.into_iter().map(AttrValue::String).collect())
    }
}

impl From<BTreeMap<String, String>> for AttrValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        AttrValue::Map(
            value
                .into_iter()
                .map(|(k, v)| (k, AttrValue::String(v)))
                .collect(),
        )
    }
}

/// Identifier and attributes of one resource instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttrValue>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a set of declared attributes
    pub fn with_attributes<I, K, V>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrValue>,
    {
        Self {
            id: String::new(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Persisted identifier, empty when the resource is absent
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Mark the resource as gone
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    pub fn is_present(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.attributes.remove(name)
    }

    /// String attribute that must be present and non-empty
    pub fn required_str(&self, name: &str) -> ProviderResult<&str> {
        match self.get(name) {
            Some(AttrValue::String(s)) if !s.is_empty() => Ok(s),
            Some(AttrValue::String(_)) | None => Err(ProviderError::missing(name)),
            Some(_) => Err(ProviderError::wrong_type(name)),
        }
    }

    /// String attribute, `None` when absent or empty
    pub fn optional_str(&self, name: &str) -> ProviderResult<Option<&str>> {
        match self.get(name) {
            Some(AttrValue::String(s)) if !s.is_empty() => Ok(Some(s)),
            Some(AttrValue::String(_)) | None => Ok(None),
            Some(_) => Err(ProviderError::wrong_type(name)),
        }
    }

    pub fn optional_bool(&self, name: &str) -> ProviderResult<Option<bool>> {
        match self.get(name) {
            Some(AttrValue::Bool(b)) => Ok(Some(*b)),
            None => Ok(None),
            Some(_) => Err(ProviderError::wrong_type(name)),
        }
    }

    /// List of strings, empty when absent
    pub fn string_list(&self, name: &str) -> ProviderResult<Vec<String>> {
        match self.get(name) {
            None => Ok(Vec::new()),
            Some(AttrValue::List(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ProviderError::wrong_type(name))
                })
                .collect(),
            Some(_) => Err(ProviderError::wrong_type(name)),
        }
    }
}
