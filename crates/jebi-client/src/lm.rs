// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Language model client abstraction

use crate::request::LMRequest;
use crate::response::LMResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default generation settings for an LM client.
///
/// Request-level options win over these; these win over backend defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LMConfig {
    /// Model name
    pub model: String,

    /// Temperature
    pub temperature: f32,

    /// Max tokens
    pub max_tokens: u32,

    /// Stop sequences
    pub stop: Vec<String>,
}

impl Default for LMConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.0,
            max_tokens: 4000,
            stop: Vec::new(),
        }
    }
}

impl LMConfig {
    /// Create a config for the given model with default knobs
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Fill every option the request leaves unset
    pub fn apply(&self, mut request: LMRequest) -> LMRequest {
        request.temperature.get_or_insert(self.temperature);
        request.max_tokens.get_or_insert(self.max_tokens);
        if request.stop.is_none() && !self.stop.is_empty() {
            request.stop = Some(self.stop.clone());
        }
        request
    }
}

/// Language model client trait
#[async_trait]
pub trait LM: Send + Sync {
    /// Generate a completion
    async fn generate(&self, request: LMRequest) -> anyhow::Result<LMResponse>;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get configuration
    fn config(&self) -> &LMConfig;
}
