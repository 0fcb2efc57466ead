// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Field definitions for signatures
//!
//! A [`Field`] names one value in a signature and fixes how model text is
//! coerced back into that value ([`FieldType::coerce`]).

use crate::error::{Error, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Value type of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Free text, kept verbatim
    #[default]
    String,
    /// Integer or floating-point number
    Number,
    /// true/false, yes/no, 1/0
    Boolean,
    /// Any JSON document
    Json,
    /// Source code in the host grammar, kept as text
    Code,
}

impl FieldType {
    /// Coerce captured model text into a value of this type.
    ///
    /// The error string describes why the text was rejected.
    pub fn coerce(self, raw: &str) -> core::result::Result<Value, String> {
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Number => coerce_number(raw),
            Self::Boolean => coerce_boolean(raw),
            Self::Json => serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e)),
            Self::Code => check_code(raw).map(|()| Value::String(raw.to_string())),
        }
    }

    /// Lowercase type name, as used in prompts
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Json => "json",
            Self::Code => "code",
        }
    }
}

fn coerce_number(raw: &str) -> core::result::Result<Value, String> {
    let text = raw.trim();
    if let Ok(f) = text.parse::<f64>() {
        if !f.is_finite() {
            return Err("number is not finite".to_string());
        }
        // Integral floats become integers so "4" and "4.0" compare equal.
        if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            return Ok(Value::from(f as i64));
        }
        return serde_json::Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| "number is not representable".to_string());
    }
    text.parse::<i64>()
        .map(Value::from)
        .map_err(|_| "not a number".to_string())
}

fn coerce_boolean(raw: &str) -> core::result::Result<Value, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "0" => Ok(Value::Bool(false)),
        _ => Err("not a boolean".to_string()),
    }
}

/// Lexical syntax check for code in the host grammar.
///
/// Accepts any non-empty text whose brackets balance and whose string, char and
/// block-comment literals terminate. Lifetimes (`'a`) are not char literals.
fn check_code(raw: &str) -> core::result::Result<(), String> {
    if raw.trim().is_empty() {
        return Err("empty code".to_string());
    }

    let chars: Vec<char> = raw.chars().collect();
    let mut stack: Vec<char> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if next == Some('*') => {
                let mut depth = 1;
                i += 2;
                while depth > 0 {
                    match (chars.get(i), chars.get(i + 1)) {
                        (Some('/'), Some('*')) => {
                            depth += 1;
                            i += 2;
                        }
                        (Some('*'), Some('/')) => {
                            depth -= 1;
                            i += 2;
                        }
                        (Some(_), _) => i += 1,
                        (None, _) => return Err("unterminated block comment".to_string()),
                    }
                }
                continue;
            }
            'r' if matches!(next, Some('"') | Some('#')) && !prev_is_ident(&chars, i) => {
                let mut j = i + 1;
                let mut hashes = 0;
                while chars.get(j) == Some(&'#') {
                    hashes += 1;
                    j += 1;
                }
                if chars.get(j) == Some(&'"') {
                    i = skip_raw_string(&chars, j + 1, hashes)?;
                    continue;
                }
            }
            '"' => {
                i = skip_quoted(&chars, i + 1, '"')
                    .ok_or_else(|| "unterminated string literal".to_string())?;
                continue;
            }
            '\'' => {
                let is_char = match (next, chars.get(i + 2)) {
                    (Some('\\'), _) => true,
                    (Some(_), Some('\'')) => true,
                    _ => false,
                };
                if is_char {
                    i = skip_quoted(&chars, i + 1, '\'')
                        .ok_or_else(|| "unterminated char literal".to_string())?;
                    continue;
                }
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return Err(format!("unbalanced '{}'", c));
                }
            }
            _ => {}
        }
        i += 1;
    }

    match stack.pop() {
        Some(open) => Err(format!("unclosed '{}'", open)),
        None => Ok(()),
    }
}

#[inline]
fn prev_is_ident(chars: &[char], i: usize) -> bool {
    i > 0 && (chars[i - 1].is_alphanumeric() || chars[i - 1] == '_')
}

/// Index just past the closing quote, honouring backslash escapes.
fn skip_quoted(chars: &[char], mut i: usize, quote: char) -> Option<usize> {
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn skip_raw_string(chars: &[char], mut i: usize, hashes: usize) -> core::result::Result<usize, String> {
    while i < chars.len() {
        if chars[i] == '"' && (1..=hashes).all(|k| chars.get(i + k) == Some(&'#')) {
            return Ok(i + 1 + hashes);
        }
        i += 1;
    }
    Err("unterminated raw string literal".to_string())
}

/// A field in a signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name (identifier)
    pub name: String,

    /// Value type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,

    /// Field description
    #[serde(default)]
    pub description: String,

    /// Whether the value must be present
    #[serde(default = "default_required")]
    pub required: bool,

    /// Value used when the caller or the model leaves the field out
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl Field {
    /// Create a required field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            description: String::new(),
            required: true,
            default: None,
        }
    }

    /// Create a required string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Set the description
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the field optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set a default value; implies optional
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    /// Label used in prompts and when parsing completions.
    ///
    /// The name with its first character uppercased: `answer` -> `Answer`.
    pub fn label(&self) -> String {
        label_for(&self.name)
    }

    /// Description, or a generic one derived from the name
    pub fn description_or_name(&self) -> &str {
        if self.description.is_empty() {
            &self.name
        } else {
            &self.description
        }
    }

    /// Coerce captured text, reporting failures against this field
    pub fn coerce(&self, raw: &str) -> Result<Value> {
        self.field_type
            .coerce(raw)
            .map_err(|reason| Error::invalid_value(&self.name, raw, reason))
    }
}

/// Helper to create an input field
pub struct InputField;

impl InputField {
    /// Create a required string input field.
    pub fn create(name: impl Into<String>, desc: impl Into<String>) -> Field {
        Field::string(name).describe(desc)
    }
}

/// Helper to create an output field
pub struct OutputField;

impl OutputField {
    /// Create a required output field of the given type.
    pub fn create(name: impl Into<String>, desc: impl Into<String>, field_type: FieldType) -> Field {
        Field::new(name, field_type).describe(desc)
    }
}

/// Prompt label for a field name: the name with its first character uppercased.
pub(crate) fn label_for(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label() {
        assert_eq!(Field::string("question").label(), "Question");
        assert_eq!(Field::string("final_answer").label(), "Final_answer");
        assert_eq!(Field::string("answerText").label(), "AnswerText");
        assert_eq!(Field::string("").label(), "");
    }

    #[test]
    fn test_field_creation() {
        let field = InputField::create("query", "User query");
        assert_eq!(field.name, "query");
        assert_eq!(field.description, "User query");
        assert_eq!(field.field_type, FieldType::String);
        assert!(field.required);
    }

    #[test]
    fn test_default_implies_optional() {
        let field = Field::new("k", FieldType::Number).with_default(3);
        assert!(!field.required);
        assert_eq!(field.default, Some(json!(3)));
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(FieldType::Number.coerce("4").unwrap(), json!(4));
        assert_eq!(FieldType::Number.coerce("4.0").unwrap(), json!(4));
        assert_eq!(FieldType::Number.coerce(" -2.5 ").unwrap(), json!(-2.5));
        assert_eq!(FieldType::Number.coerce("1e3").unwrap(), json!(1000));
        assert!(FieldType::Number.coerce("four").is_err());
        assert!(FieldType::Number.coerce("NaN").is_err());
        assert!(FieldType::Number.coerce("inf").is_err());
    }

    #[test]
    fn test_boolean_coercion() {
        for yes in ["true", "YES", "1", " True "] {
            assert_eq!(FieldType::Boolean.coerce(yes).unwrap(), json!(true));
        }
        for no in ["false", "No", "0"] {
            assert_eq!(FieldType::Boolean.coerce(no).unwrap(), json!(false));
        }
        assert!(FieldType::Boolean.coerce("maybe").is_err());
    }

    #[test]
    fn test_json_coercion() {
        assert_eq!(
            FieldType::Json.coerce(r#"{"a": [1, 2]}"#).unwrap(),
            json!({"a": [1, 2]})
        );
        assert!(FieldType::Json.coerce("{a: 1").is_err());
    }

    #[test]
    fn test_code_accepts_balanced() {
        let ok = [
            "fn add(a: i32, b: i32) -> i32 { a + b }",
            "let s = \"}\"; // {",
            "let c = '{';",
            "fn f<'a>(x: &'a str) -> &'a str { x }",
            "let r = r#\"raw \" ( \"#;",
            "/* outer /* inner */ ) */ x",
            "a[0](b)",
        ];
        for code in ok {
            assert!(FieldType::Code.coerce(code).is_ok(), "rejected: {}", code);
        }
    }

    #[test]
    fn test_code_rejects_malformed() {
        assert!(FieldType::Code.coerce("fn main() {").is_err());
        assert!(FieldType::Code.coerce("x)").is_err());
        assert!(FieldType::Code.coerce("(]").is_err());
        assert!(FieldType::Code.coerce("let s = \"open").is_err());
        assert!(FieldType::Code.coerce("/* never closed").is_err());
        assert!(FieldType::Code.coerce("   ").is_err());
    }

    #[test]
    fn test_field_coerce_error_names_field() {
        let err = Field::new("count", FieldType::Number)
            .coerce("lots")
            .unwrap_err();
        match err {
            Error::InvalidFieldValue { field, raw, .. } => {
                assert_eq!(field, "count");
                assert_eq!(raw, "lots");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_field_deserialize_defaults() {
        let field: Field = serde_json::from_str(r#"{"name": "answer"}"#).unwrap();
        assert_eq!(field.field_type, FieldType::String);
        assert!(field.required);
    }
}
