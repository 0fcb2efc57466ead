// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Property-based tests for signatures.
//!
//! Uses proptest to verify invariants hold across arbitrary inputs.

use proptest::prelude::*;
use std::collections::BTreeSet;

use jebi::types::value_text;
use jebi::{Field, FieldType, Inputs, ParseMode, Signature, Value};
use serde_json::json;

// ============================================================================
// Strategies
// ============================================================================

/// Distinct field names split into inputs and outputs, each with a required flag.
fn arb_signature() -> impl Strategy<Value = Signature> {
    prop::collection::btree_set("[a-z][a-z_]{0,8}", 1..8)
        .prop_flat_map(|names| {
            let n = names.len();
            (
                Just(names),
                0..=n,
                prop::collection::vec(any::<bool>(), n),
            )
        })
        .prop_map(|(names, split, required)| {
            let mut sig = Signature::new("fuzz");
            for (i, name) in names.into_iter().enumerate() {
                let mut field = Field::string(name);
                if !required[i] {
                    field = field.optional();
                }
                sig = if i < split {
                    sig.add_input(field).unwrap()
                } else {
                    sig.add_output(field).unwrap()
                };
            }
            sig
        })
}

/// Single-line text that survives label extraction unchanged.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9 ,.!?'()-]{0,40}[a-z0-9.!?]"
}

fn single_output(field_type: FieldType) -> Signature {
    Signature::new("roundtrip")
        .add_input(Field::string("input"))
        .unwrap()
        .add_output(Field::new("value", field_type))
        .unwrap()
}

/// Fill `value` into the prompt, then parse it back as model output.
fn roundtrip(field_type: FieldType, value: &Value) -> Option<Value> {
    let sig = single_output(field_type);
    let prompt = sig.build_prompt(&[], &Inputs::new().with("input", value.clone()));
    let filled = format!("Input: {}", value_text(value));
    assert!(prompt.contains(&filled), "prompt missing {:?}", filled);

    let completion = format!("Value: {}", value_text(value));
    sig.parse_outputs(&completion, ParseMode::Strict)
        .ok()
        .and_then(|mut map| map.remove("value"))
}

// ============================================================================
// Input Validation Properties
// ============================================================================

proptest! {
    /// validate_inputs is Ok exactly when every required input is present,
    /// and otherwise reports the missing names in declaration order.
    #[test]
    fn validate_inputs_is_total(
        sig in arb_signature(),
        present in prop::collection::btree_set("[a-z][a-z_]{0,8}", 0..8),
        extra in prop::collection::vec(any::<bool>(), 8),
    ) {
        let mut inputs = Inputs::new();
        for name in &present {
            inputs.insert(name.clone(), "x");
        }
        for (field, keep) in sig.input_fields.iter().zip(&extra) {
            if *keep {
                inputs.insert(field.name.clone(), 1);
            }
        }

        let expected: Vec<String> = sig
            .input_fields
            .iter()
            .filter(|f| f.required && !inputs.contains(&f.name))
            .map(|f| f.name.clone())
            .collect();

        match sig.validate_inputs(&inputs) {
            Ok(()) => prop_assert!(expected.is_empty()),
            Err(jebi::Error::MissingFields(missing)) => prop_assert_eq!(missing, expected),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Rendering is deterministic.
    #[test]
    fn render_is_deterministic(sig in arb_signature()) {
        prop_assert_eq!(sig.render(&[]), sig.render(&[]));
    }
}

// ============================================================================
// Reasoning Injection Properties
// ============================================================================

proptest! {
    /// The reasoning field leads the outputs and the source is untouched.
    #[test]
    fn reasoning_injection(sig in arb_signature()) {
        prop_assume!(sig.field("reasoning").is_none());
        let before = sig.clone();

        let augmented = sig.with_reasoning("reasoning").unwrap();

        prop_assert_eq!(&augmented.output_fields[0].name, "reasoning");
        prop_assert!(augmented.output_fields[0].required);
        prop_assert_eq!(&augmented.output_fields[1..], &sig.output_fields[..]);
        prop_assert_eq!(&augmented.input_fields, &sig.input_fields);
        prop_assert_eq!(sig, before);
    }
}

// ============================================================================
// Round-Trip Properties
// ============================================================================

proptest! {
    #[test]
    fn string_roundtrip(text in arb_text()) {
        let value = Value::String(text);
        prop_assert_eq!(roundtrip(FieldType::String, &value), Some(value));
    }

    #[test]
    fn padded_string_roundtrip(text in " {1,4}[a-z][a-z ]{0,20}[a-z]") {
        let value = Value::String(text);
        prop_assert_eq!(roundtrip(FieldType::String, &value), Some(value));
    }

    #[test]
    fn boolean_roundtrip(b in any::<bool>()) {
        prop_assert_eq!(roundtrip(FieldType::Boolean, &Value::Bool(b)), Some(Value::Bool(b)));
    }

    #[test]
    fn integer_roundtrip(n in -1_000_000_000i64..1_000_000_000) {
        prop_assert_eq!(roundtrip(FieldType::Number, &json!(n)), Some(json!(n)));
    }

    #[test]
    fn float_roundtrip(x in -1.0e9f64..1.0e9) {
        let parsed = roundtrip(FieldType::Number, &json!(x)).and_then(|v| v.as_f64());
        prop_assert_eq!(parsed, Some(x));
    }

    #[test]
    fn json_roundtrip(map in prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 0..5)) {
        let value = serde_json::to_value(&map).unwrap();
        prop_assert_eq!(roundtrip(FieldType::Json, &value), Some(value));
    }

    #[test]
    fn code_roundtrip(name in "[a-z][a-z0-9_]{0,10}", n in 0u32..1000) {
        let code = format!("fn {}() -> u32 {{ let v = [{}]; v[0] }}", name, n);
        let value = Value::String(code);
        prop_assert_eq!(roundtrip(FieldType::Code, &value), Some(value));
    }

    /// Parsing never panics on arbitrary completions.
    #[test]
    fn parse_outputs_never_panics(text in "\\PC{0,300}", sig in arb_signature()) {
        let _ = sig.parse_outputs(&text, ParseMode::Lenient);
        let _ = sig.parse_outputs(&text, ParseMode::Strict);
    }
}

#[test]
fn number_equivalent_forms() {
    let sig = single_output(FieldType::Number);
    for text in ["Value: 4", "Value: 4.0", "Value:  4.00 "] {
        let parsed = sig.parse_outputs(text, ParseMode::Strict).unwrap();
        assert_eq!(parsed.get("value"), Some(&json!(4)), "{}", text);
    }
}

#[test]
fn unique_names_enforced() {
    let names: BTreeSet<&str> = ["a", "b"].into_iter().collect();
    let mut sig = Signature::new("dupes");
    for name in &names {
        sig = sig.add_input(Field::string(*name)).unwrap();
    }
    assert!(sig.add_output(Field::string("a")).is_err());
}
