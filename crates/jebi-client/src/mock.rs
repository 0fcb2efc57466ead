// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Closure-driven LM for tests and offline demos.

use crate::lm::{LMConfig, LM};
use crate::request::LMRequest;
use crate::response::LMResponse;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

type Responder = Box<dyn Fn(&LMRequest) -> anyhow::Result<String> + Send + Sync>;

/// A mock LM whose completions come from a closure.
///
/// Every call is counted, which makes retry behaviour observable.
///
/// ```
/// use jebi_client::MockLM;
///
/// let lm = MockLM::new(|_prompt| "Answer: 4".to_string());
/// assert_eq!(lm.calls(), 0);
/// ```
pub struct MockLM {
    responder: Responder,
    config: LMConfig,
    calls: AtomicUsize,
}

impl MockLM {
    /// Respond to the last user message with the given function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::from_fn(move |request| Ok(f(request.last_user_content().unwrap_or_default())))
    }

    /// Respond to the full request; errors are returned as generation failures.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&LMRequest) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(f),
            config: LMConfig::new("mock"),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always return the same completion.
    pub fn constant(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| text.clone())
    }

    /// Always fail with the given reason.
    pub fn failing(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::from_fn(move |_| Err(anyhow::anyhow!("{}", reason)))
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LM for MockLM {
    async fn generate(&self, request: LMRequest) -> anyhow::Result<LMResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = (self.responder)(&request)?;
        Ok(LMResponse::new(text, self.config.model.clone()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn config(&self) -> &LMConfig {
        &self.config
    }
}
