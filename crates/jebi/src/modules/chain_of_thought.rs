// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Chain of Thought module
//!
//! Implements the Chain of Thought (CoT) reasoning strategy where the LM
//! is prompted to show its reasoning steps before providing an answer.

use crate::error::Result;
use crate::example::Example;
use crate::module::Module;
use crate::predict::Predict;
use crate::prediction::Prediction;
use crate::retry::RetryPolicy;
use crate::signature::{ParseMode, Signature};
use crate::types::Inputs;
use async_trait::async_trait;
use jebi_client::LM;
use std::sync::Arc;

/// Default name of the injected reasoning field.
pub const DEFAULT_REASONING_FIELD: &str = "reasoning";

/// Chain of Thought module.
///
/// Wraps a Predict module whose signature carries a reasoning output field
/// ahead of the original outputs, prompting the LM to show its work before
/// answering. The caller's signature is copied, never modified.
///
/// ## Example
///
/// ```ignore
/// let sig = Signature::parse("question -> answer")?;
/// let cot = ChainOfThought::new(&sig)?;
/// // Signature becomes: question -> reasoning, answer
/// ```
#[derive(Clone, Debug)]
pub struct ChainOfThought {
    predict: Predict,
    reasoning_field: String,
}

impl ChainOfThought {
    /// Create a ChainOfThought module with the default `reasoning` field.
    pub fn new(signature: &Signature) -> Result<Self> {
        Self::with_reasoning_field(signature, DEFAULT_REASONING_FIELD)
    }

    /// Create with a custom reasoning field name.
    ///
    /// Fails if the signature already has a field with that name.
    pub fn with_reasoning_field(signature: &Signature, name: &str) -> Result<Self> {
        Ok(Self {
            predict: Predict::new(signature.with_reasoning(name)?),
            reasoning_field: name.to_string(),
        })
    }

    /// Set the LM.
    pub fn with_lm(mut self, lm: Arc<dyn LM>) -> Self {
        self.predict = self.predict.with_lm(lm);
        self
    }

    /// Set the module's own few-shot examples.
    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.predict = self.predict.with_examples(examples);
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.predict = self.predict.with_retry(retry);
        self
    }

    /// Set the number of retries, keeping the backoff.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.predict = self.predict.with_max_retries(max_retries);
        self
    }

    /// Set how coercion failures are handled.
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.predict = self.predict.with_parse_mode(mode);
        self
    }

    /// Name of the reasoning field.
    pub fn reasoning_field(&self) -> &str {
        &self.reasoning_field
    }

    /// The inner predictor.
    pub fn predict(&self) -> &Predict {
        &self.predict
    }

    /// Reasoning text from a prediction made by this module.
    pub fn rationale<'p>(&self, prediction: &'p Prediction) -> Option<&'p str> {
        prediction.get_str(&self.reasoning_field)
    }
}

#[async_trait]
impl Module for ChainOfThought {
    async fn forward(&self, inputs: Inputs) -> Result<Prediction> {
        self.predict.forward(inputs).await
    }

    fn signature(&self) -> &Signature {
        self.predict.signature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::signature::REASONING_INSTRUCTION;
    use jebi_client::MockLM;

    #[test]
    fn test_reasoning_field_comes_first() {
        let sig = Signature::parse("question -> answer").unwrap();
        let cot = ChainOfThought::new(&sig).unwrap();

        let names: Vec<&str> = cot
            .signature()
            .output_fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, ["reasoning", "answer"]);
        assert_eq!(sig.output_fields.len(), 1);
        assert!(sig.instructions.is_none());
        assert_eq!(
            cot.signature().instructions.as_deref(),
            Some(REASONING_INSTRUCTION)
        );
    }

    #[test]
    fn test_custom_field_name_clash() {
        let sig = Signature::parse("question -> rationale, answer").unwrap();
        let err = ChainOfThought::with_reasoning_field(&sig, "rationale").unwrap_err();
        assert!(matches!(err, Error::Signature(_)));
    }

    #[tokio::test]
    async fn test_forward_returns_reasoning_and_answer() {
        let lm = Arc::new(MockLM::new(|prompt| {
            let format_at = prompt.find("Reasoning:").unwrap();
            assert!(format_at < prompt.find("Answer:").unwrap());
            "Reasoning: 2 plus 2\nis 4.\nAnswer: 4".to_string()
        }));
        let sig = Signature::parse("question -> answer").unwrap();
        let cot = ChainOfThought::new(&sig).unwrap().with_lm(lm);

        let prediction = cot
            .forward(Inputs::new().with("question", "What is 2+2?"))
            .await
            .unwrap();

        assert_eq!(prediction.get_str("answer"), Some("4"));
        assert_eq!(cot.rationale(&prediction), Some("2 plus 2\nis 4."));
    }
}
