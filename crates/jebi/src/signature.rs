// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Signature system for defining input/output contracts
//!
//! A [`Signature`] renders the prompt template for a task
//! ([`Signature::render`], [`Signature::fill`]), validates caller inputs
//! ([`Signature::validate_inputs`]) and parses completions back into typed
//! values ([`Signature::parse_outputs`]).
//!
//! ## Prompt layout
//!
//! Sections appear in this order, separated by a blank line; a section with
//! nothing to say is left out:
//!
//! 1. instructions
//! 2. output format (`Label: description` per output field)
//! 3. field descriptions (`Input Fields:` / `Output Fields:` bullet lists)
//! 4. worked examples
//! 5. the final input block (`Label: [input]` per input, bare `Label:` per output)

use crate::error::{Error, Result};
use crate::example::Example;
use crate::field::{label_for, Field, FieldType};
use crate::types::{value_text, FieldMap, Inputs};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Placeholder written after each input label in the final input block.
pub const INPUT_PLACEHOLDER: &str = "[input]";

/// Description of the synthetic reasoning field injected by chain of thought.
pub const REASONING_DESCRIPTION: &str =
    "Think step by step in order to produce the outputs. Explain your reasoning before answering.";

/// Instruction appended by chain of thought.
pub const REASONING_INSTRUCTION: &str =
    "Let's think step by step. Write out your reasoning before giving the final answer.";

/// How coercion failures are treated when parsing a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Drop the offending field; the required-output check still applies.
    #[default]
    Lenient,
    /// Fail the whole parse with [`Error::InvalidFieldValue`].
    Strict,
}

/// A signature defining the input/output contract of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Task name
    pub name: String,

    /// Short description of the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Instruction text placed at the top of the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Input fields, in declaration order
    #[serde(default)]
    pub input_fields: Vec<Field>,

    /// Output fields, in declaration order
    #[serde(default)]
    pub output_fields: Vec<Field>,
}

impl Signature {
    /// Create an empty signature
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instructions: None,
            input_fields: Vec::new(),
            output_fields: Vec::new(),
        }
    }

    /// Start a builder
    pub fn builder(name: impl Into<String>) -> SignatureBuilder {
        SignatureBuilder::new(name)
    }

    /// Add an input field
    pub fn add_input(mut self, field: Field) -> Result<Self> {
        self.ensure_unused(&field.name)?;
        self.input_fields.push(field);
        Ok(self)
    }

    /// Add an output field
    pub fn add_output(mut self, field: Field) -> Result<Self> {
        self.ensure_unused(&field.name)?;
        self.output_fields.push(field);
        Ok(self)
    }

    fn ensure_unused(&self, name: &str) -> Result<()> {
        if self.field(name).is_some() {
            return Err(Error::signature(format!("duplicate field name: {}", name)));
        }
        let label = label_for(name);
        if let Some(existing) = self.all_fields().find(|f| f.label() == label) {
            return Err(Error::signature(format!(
                "fields {} and {} share the label {}",
                existing.name, name, label
            )));
        }
        Ok(())
    }

    /// Check that field names and their prompt labels are unique across
    /// inputs and outputs.
    ///
    /// Completions are parsed by label, so `answer` and `Answer` cannot both
    /// appear. Signatures built through `add_*` already hold; this is for
    /// builders and ones deserialized from elsewhere.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut labels = HashSet::new();
        for field in self.all_fields() {
            if !names.insert(field.name.as_str()) {
                return Err(Error::signature(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
            let label = field.label();
            if !labels.insert(label.clone()) {
                return Err(Error::signature(format!(
                    "duplicate field label: {} ({})",
                    label, field.name
                )));
            }
        }
        Ok(())
    }

    /// Get all fields (inputs then outputs)
    pub fn all_fields(&self) -> impl Iterator<Item = &Field> {
        self.input_fields.iter().chain(self.output_fields.iter())
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.all_fields().find(|f| f.name == name)
    }

    /// Parse a signature from string format: "input1, input2 -> output1, output2"
    ///
    /// Every field is a required string field.
    pub fn parse(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split("->").map(|p| p.trim()).collect();
        if parts.len() != 2 {
            return Err(Error::signature(
                "Signature must be in format 'inputs -> outputs'",
            ));
        }

        let mut sig = Self::new(s.trim());
        for input in split_names(parts[0]) {
            sig = sig.add_input(Field::string(input))?;
        }
        for output in split_names(parts[1]) {
            sig = sig.add_output(Field::string(output))?;
        }
        Ok(sig)
    }

    /// Convert signature to string format
    pub fn to_string_format(&self) -> String {
        let inputs: Vec<&str> = self.input_fields.iter().map(|f| f.name.as_str()).collect();
        let outputs: Vec<&str> = self.output_fields.iter().map(|f| f.name.as_str()).collect();
        format!("{} -> {}", inputs.join(", "), outputs.join(", "))
    }

    /// Required input fields missing from `inputs`, in declaration order.
    ///
    /// Values are not type-checked here.
    pub fn validate_inputs(&self, inputs: &Inputs) -> Result<()> {
        let missing: Vec<String> = self
            .input_fields
            .iter()
            .filter(|f| f.required && !inputs.contains(&f.name))
            .map(|f| f.name.clone())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingFields(missing))
        }
    }

    /// Render the prompt template with the given worked examples.
    ///
    /// Deterministic for the same signature and examples.
    pub fn render(&self, examples: &[Example]) -> String {
        let mut sections: Vec<String> = Vec::with_capacity(5);

        if let Some(instructions) = self.instructions.as_deref().map(str::trim) {
            if !instructions.is_empty() {
                sections.push(instructions.to_string());
            }
        }

        if !self.output_fields.is_empty() {
            let mut block = String::from("Follow the following format.");
            for field in &self.output_fields {
                block.push('\n');
                block.push_str(&field.label());
                block.push_str(": ");
                block.push_str(field.description_or_name());
            }
            sections.push(block);
        }

        let descriptions = [
            ("Input Fields:", &self.input_fields),
            ("Output Fields:", &self.output_fields),
        ]
        .iter()
        .filter(|(_, fields)| !fields.is_empty())
        .map(|(heading, fields)| {
            let mut list = heading.to_string();
            for field in fields.iter() {
                list.push_str(&format!(
                    "\n- {} ({}): {}",
                    field.name,
                    field.field_type.as_str(),
                    field.description_or_name()
                ));
            }
            list
        })
        .collect::<Vec<_>>();
        if !descriptions.is_empty() {
            sections.push(descriptions.join("\n"));
        }

        let rendered: Vec<String> = examples
            .iter()
            .map(|ex| self.render_example(ex))
            .filter(|text| !text.is_empty())
            .collect();
        if !rendered.is_empty() {
            sections.push(format!("Examples:\n\n{}", rendered.join("\n\n")));
        }

        let mut tail: Vec<String> = self
            .input_fields
            .iter()
            .map(|f| format!("{}: {}", f.label(), INPUT_PLACEHOLDER))
            .collect();
        tail.extend(self.output_fields.iter().map(|f| format!("{}:", f.label())));
        if !tail.is_empty() {
            sections.push(tail.join("\n"));
        }

        sections.join("\n\n")
    }

    /// One worked example as `Label: value` lines, inputs then outputs.
    fn render_example(&self, example: &Example) -> String {
        self.all_fields()
            .filter_map(|f| {
                example
                    .get(&f.name)
                    .map(|v| format!("{}: {}", f.label(), value_text(v)))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Substitute input values into a rendered template.
    ///
    /// For every input field, the last `Label: [input]` line is replaced with
    /// the label and the value's text. Absent inputs fall back to the field's
    /// default; with neither, the placeholder stays.
    pub fn fill(&self, template: &str, inputs: &Inputs) -> String {
        let mut lines: Vec<String> = template.split('\n').map(str::to_string).collect();

        for field in &self.input_fields {
            let Some(value) = inputs.get(&field.name).or(field.default.as_ref()) else {
                continue;
            };
            let label = field.label();
            let placeholder = format!("{}: {}", label, INPUT_PLACEHOLDER);
            if let Some(line) = lines.iter_mut().rev().find(|l| **l == placeholder) {
                *line = format!("{}: {}", label, value_text(value));
            }
        }

        lines.join("\n")
    }

    /// Render and fill in one step.
    pub fn build_prompt(&self, examples: &[Example], inputs: &Inputs) -> String {
        self.fill(&self.render(examples), inputs)
    }

    /// Parse model text into typed output values.
    ///
    /// Each output field is located by a line starting with its label and a
    /// colon; the value runs until the next `Capitalized:` label line or the
    /// end of the text. Missing fields are skipped, then defaults are applied,
    /// then every required output must be present.
    pub fn parse_outputs(&self, raw: &str, mode: ParseMode) -> Result<FieldMap> {
        let mut parsed = FieldMap::new();

        for field in &self.output_fields {
            let Some(captured) = extract_labeled(raw, &field.label())? else {
                continue;
            };
            match field.coerce(&captured) {
                Ok(value) => {
                    parsed.insert(field.name.clone(), value);
                }
                Err(err) if mode == ParseMode::Strict => return Err(err),
                Err(err) => {
                    tracing::debug!(field = %field.name, error = %err, "dropping unparseable output");
                }
            }
        }

        for field in &self.output_fields {
            if let Some(default) = &field.default {
                parsed
                    .entry(field.name.clone())
                    .or_insert_with(|| default.clone());
            }
        }

        let missing: Vec<String> = self
            .output_fields
            .iter()
            .filter(|f| f.required && !parsed.contains_key(&f.name))
            .map(|f| f.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingRequiredOutputs(missing));
        }

        Ok(parsed)
    }

    /// Copy of this signature with a reasoning field in front of the outputs.
    ///
    /// The reasoning instruction is appended to the existing instructions with
    /// a blank line between them. `self` is not modified.
    pub fn with_reasoning(&self, reasoning_field: &str) -> Result<Signature> {
        self.ensure_unused(reasoning_field)?;

        let mut augmented = self.clone();
        let reasoning = Field::new(reasoning_field, FieldType::String).describe(REASONING_DESCRIPTION);
        augmented.output_fields.insert(0, reasoning);

        let instructions: Vec<&str> = [self.instructions.as_deref(), Some(REASONING_INSTRUCTION)]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        augmented.instructions = Some(instructions.join("\n\n"));

        Ok(augmented)
    }
}

fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// A line that opens the next labeled value.
const LABEL_LINE: &str = r"^[A-Z][A-Za-z0-9_]*:";

fn label_line() -> Result<&'static Regex> {
    static COMPILED: OnceLock<core::result::Result<Regex, regex::Error>> = OnceLock::new();
    COMPILED
        .get_or_init(|| Regex::new(LABEL_LINE))
        .as_ref()
        .map_err(|e| Error::Other(e.to_string()))
}

/// Text following `label:` at the start of a line, up to the next label line.
///
/// The single space after the colon separates label and value; any further
/// leading whitespace belongs to the value. When the value starts on the
/// following line, blank lines before it are skipped. Trailing whitespace is
/// dropped. Returns `None` when the label is absent or its value is blank.
fn extract_labeled(text: &str, label: &str) -> Result<Option<String>> {
    let next_label = label_line()?;
    let prefix = format!("{}:", label);

    let mut lines = text.lines();
    let Some(first) = lines.find_map(|line| line.strip_prefix(prefix.as_str())) else {
        return Ok(None);
    };
    let first = first.strip_prefix(' ').unwrap_or(first);

    let mut value: Vec<&str> = Vec::new();
    if !first.trim().is_empty() {
        value.push(first);
    }
    value.extend(lines.take_while(|line| !next_label.is_match(line)));

    let Some(start) = value.iter().position(|line| !line.trim().is_empty()) else {
        return Ok(None);
    };
    Ok(Some(value[start..].join("\n").trim_end().to_string()))
}

/// Builder for creating signatures
pub struct SignatureBuilder {
    signature: Signature,
}

impl SignatureBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            signature: Signature::new(name),
        }
    }

    /// Set the description
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.signature.description = Some(description.into());
        self
    }

    /// Set the instructions
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.signature.instructions = Some(instructions.into());
        self
    }

    /// Add an input field
    pub fn input(mut self, field: Field) -> Self {
        self.signature.input_fields.push(field);
        self
    }

    /// Add an output field
    pub fn output(mut self, field: Field) -> Self {
        self.signature.output_fields.push(field);
        self
    }

    /// Build the signature, rejecting duplicate field names
    pub fn build(self) -> Result<Signature> {
        self.signature.validate()?;
        Ok(self.signature)
    }
}
