// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Prediction results from module execution

use crate::example::Example;
use crate::types::{FieldMap, Value};
use serde::{Deserialize, Serialize};

/// Result of a module prediction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Output fields
    pub attrs: FieldMap,
}

impl Prediction {
    /// Create a new prediction
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with outputs
    pub fn with_attrs(attrs: FieldMap) -> Self {
        Self { attrs }
    }

    /// Get an output field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }

    /// Get a string output field
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }

    /// Insert an output field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// View the outputs as an example
    pub fn into_example(self) -> Example {
        Example::from_attrs(self.attrs)
    }

    /// Take an example's attributes as model output
    pub fn from_example(example: &Example) -> Self {
        Self {
            attrs: example.attrs.clone(),
        }
    }
}
