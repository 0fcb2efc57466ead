// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Predict module for LM-based predictions with demo management
//!
//! [`Predict`] is the basic prompt-in, fields-out module. A forward call runs
//! four stages and stops at the first failure:
//!
//! 1. validate the inputs against the signature
//! 2. render the prompt (injected demos, then the module's own examples)
//! 3. call the LM under the retry policy
//! 4. parse the completion into typed output fields

use crate::error::{Error, Result};
use crate::example::Example;
use crate::lm::{generate_text, GenerateOptions};
use crate::module::Module;
use crate::prediction::Prediction;
use crate::retry::RetryPolicy;
use crate::signature::{ParseMode, Signature};
use crate::types::Inputs;
use async_trait::async_trait;
use jebi_client::LM;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::Instrument;

/// Predict module that uses an LM to generate predictions.
///
/// The LM is held explicitly; a module built without one fails every
/// forward call with [`Error::NoLmConfigured`] before any retry.
///
/// ## Example
///
/// ```ignore
/// let predict = Predict::new(Signature::parse("question -> answer")?)
///     .with_lm(Arc::new(MockLM::constant("Answer: 4")));
/// let prediction = predict.forward(Inputs::new().with("question", "2+2?")).await?;
/// assert_eq!(prediction.get_str("answer"), Some("4"));
/// ```
#[derive(Clone)]
pub struct Predict {
    signature: Signature,
    examples: Vec<Example>,
    retry: RetryPolicy,
    lm: Option<Arc<dyn LM>>,
    options: GenerateOptions,
    parse_mode: ParseMode,
}

impl Predict {
    /// Create a Predict module with no examples and no LM.
    pub fn new(signature: Signature) -> Self {
        Self {
            signature,
            examples: Vec::new(),
            retry: RetryPolicy::default(),
            lm: None,
            options: GenerateOptions::default(),
            parse_mode: ParseMode::default(),
        }
    }

    /// Set the LM.
    pub fn with_lm(mut self, lm: Arc<dyn LM>) -> Self {
        self.lm = Some(lm);
        self
    }

    /// Set the module's own few-shot examples.
    pub fn with_examples(mut self, examples: Vec<Example>) -> Self {
        self.examples = examples;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the number of retries, keeping the backoff.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Set per-call generation options.
    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    /// Set how coercion failures are handled.
    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    /// The module's own examples.
    #[inline]
    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// The retry policy.
    #[inline]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// The configured LM, if any.
    pub fn lm(&self) -> Option<&Arc<dyn LM>> {
        self.lm.as_ref()
    }

    /// The parse mode.
    #[inline]
    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    /// Render the full prompt for `inputs`.
    pub fn build_prompt(&self, inputs: &Inputs) -> String {
        let demos: Cow<'_, [Example]> = if inputs.demos().is_empty() {
            Cow::Borrowed(&self.examples)
        } else {
            Cow::Owned(
                inputs
                    .demos()
                    .iter()
                    .chain(&self.examples)
                    .cloned()
                    .collect(),
            )
        };
        self.signature.build_prompt(&demos, inputs)
    }

    async fn run(&self, inputs: Inputs) -> Result<Prediction> {
        self.signature.validate_inputs(&inputs)?;
        let prompt = self.build_prompt(&inputs);

        let lm = self.lm.as_deref().ok_or(Error::NoLmConfigured)?;
        let prompt = prompt.as_str();
        let options = &self.options;
        let raw = self
            .retry
            .run(|| generate_text(Some(lm), prompt, options))
            .await?;

        let attrs = self.signature.parse_outputs(&raw, self.parse_mode)?;
        Ok(Prediction::with_attrs(attrs))
    }
}

#[async_trait]
impl Module for Predict {
    async fn forward(&self, inputs: Inputs) -> Result<Prediction> {
        let span = tracing::info_span!(
            "forward",
            module = %self.signature.name,
            demos = inputs.demos().len() + self.examples.len(),
        );
        self.run(inputs).instrument(span).await
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl core::fmt::Debug for Predict {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Predict")
            .field("signature", &self.signature.name)
            .field("examples", &self.examples.len())
            .field("retry", &self.retry)
            .field("lm", &self.lm.as_ref().map(|lm| lm.model().to_string()))
            .field("parse_mode", &self.parse_mode)
            .finish()
    }
}
