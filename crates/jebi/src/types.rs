// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Core type definitions

use crate::example::Example;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An attribute value. Strings, numbers, booleans and structured JSON all fit.
pub type Value = serde_json::Value;

/// Attribute bag keyed by field name.
///
/// Ordered so that equality, hashing of rendered text, and iteration are
/// independent of insertion order.
pub type FieldMap = BTreeMap<String, Value>;

/// Render a value the way it appears in prompt text.
///
/// Strings are written verbatim; everything else uses its JSON form.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Inputs to a module's forward call.
///
/// Besides the caller's fields, inputs may carry few-shot demos injected by a
/// wrapping module; these are rendered ahead of the module's own examples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inputs {
    fields: FieldMap,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    demos: Vec<Example>,
}

impl Inputs {
    /// Create new inputs
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether a field is present
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Few-shot demos injected into this call
    pub fn demos(&self) -> &[Example] {
        &self.demos
    }

    /// Prepend demos to this call's context
    pub fn with_demos(mut self, demos: &[Example]) -> Self {
        let mut injected = demos.to_vec();
        injected.append(&mut self.demos);
        self.demos = injected;
        self
    }
}

impl From<FieldMap> for Inputs {
    fn from(fields: FieldMap) -> Self {
        Self {
            fields,
            demos: Vec::new(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Inputs {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<FieldMap>(),
        )
    }
}
