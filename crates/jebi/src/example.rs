// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Training and evaluation examples
//!
//! An [`Example`] is an immutable attribute bag: `put`, `delete` and `merge`
//! return a new example and leave the receiver untouched.

use crate::signature::Signature;
use crate::types::{FieldMap, Inputs, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A labeled or generated data point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Example {
    /// Field values
    pub attrs: FieldMap,

    /// Free-form annotations (source, difficulty, ...); ignored by prompts
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
}

impl Example {
    /// Create an empty example
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an attribute map
    pub fn from_attrs(attrs: FieldMap) -> Self {
        Self {
            attrs,
            metadata: BTreeMap::new(),
        }
    }

    /// Get an attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Get a string attribute
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Copy with one attribute set
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.attrs.insert(key.into(), value.into());
        next
    }

    /// Copy without the given attribute
    pub fn delete(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.attrs.remove(key);
        next
    }

    /// Copy with `other`'s attributes layered on top; metadata is merged the same way
    pub fn merge(&self, other: &Example) -> Self {
        let mut next = self.clone();
        next.attrs
            .extend(other.attrs.iter().map(|(k, v)| (k.clone(), v.clone())));
        next.metadata
            .extend(other.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        next
    }

    /// Copy with one metadata entry set
    pub fn with_metadata(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.metadata.insert(key.into(), value.into());
        next
    }

    /// Attributes matching the signature's input fields, as forward inputs
    pub fn inputs_for(&self, signature: &Signature) -> Inputs {
        signature
            .input_fields
            .iter()
            .filter_map(|f| self.attrs.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect()
    }

    /// Attributes matching the signature's output fields
    pub fn labels_for(&self, signature: &Signature) -> FieldMap {
        signature
            .output_fields
            .iter()
            .filter_map(|f| self.attrs.get(&f.name).map(|v| (f.name.clone(), v.clone())))
            .collect()
    }

    /// Attribute-content equality; metadata is not compared
    #[inline]
    pub fn same_content(&self, other: &Example) -> bool {
        self.attrs == other.attrs
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// Whether the example has no attributes
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Example {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_attrs(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
