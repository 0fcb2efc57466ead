// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Tunable values tracked across optimization rounds.

use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a parameter holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// Instruction or prompt text
    Prompt,
    /// A list of few-shot examples
    Examples,
    /// A numeric knob
    Number,
    /// Anything else
    Other,
}

/// A named value with an append-only history of previous values.
///
/// `update` pushes the current value onto the history; `revert` restores the
/// most recent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name
    pub name: String,
    /// Kind of value
    pub kind: ParameterKind,
    value: Value,
    /// Free-form annotations
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    history: Vec<Value>,
}

impl Parameter {
    /// Create a parameter with an initial value and empty history
    pub fn new(name: impl Into<String>, kind: ParameterKind, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            metadata: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// Current value
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Previous values, oldest first
    pub fn history(&self) -> &[Value] {
        &self.history
    }

    /// Replace the value, keeping the old one in history
    pub fn update(&mut self, value: impl Into<Value>) {
        let previous = std::mem::replace(&mut self.value, value.into());
        self.history.push(previous);
    }

    /// Restore the previous value. Returns false when there is none.
    pub fn revert(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.value = previous;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_and_revert() {
        let mut p = Parameter::new("instructions", ParameterKind::Prompt, "v1");
        p.update("v2");
        p.update("v3");
        assert_eq!(p.value(), &json!("v3"));
        assert_eq!(p.history(), &[json!("v1"), json!("v2")]);

        assert!(p.revert());
        assert_eq!(p.value(), &json!("v2"));
        assert_eq!(p.history(), &[json!("v1")]);
    }

    #[test]
    fn test_revert_without_history() {
        let mut p = Parameter::new("k", ParameterKind::Number, 3);
        assert!(!p.revert());
        assert_eq!(p.value(), &json!(3));
    }

    #[test]
    fn test_serde_keeps_history() {
        let mut p = Parameter::new("demos", ParameterKind::Examples, json!([]));
        p.update(json!([{"q": "x"}]));
        let back: Parameter = serde_json::from_str(&serde_json::to_string(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }
}
