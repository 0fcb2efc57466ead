// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! Text-in, text-out convenience over the LM boundary.

use crate::error::{Error, Result};
use jebi_client::{LMRequest, Message, LM};
use serde::{Deserialize, Serialize};

/// Per-call generation options; unset knobs fall back to the LM's config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// System message sent ahead of the prompt
    #[serde(default)]
    pub system: Option<String>,
    /// Max tokens
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Stop sequences
    #[serde(default)]
    pub stop: Option<Vec<String>>,
}

impl GenerateOptions {
    /// Build the chat request for a prompt
    pub fn request(&self, prompt: &str) -> LMRequest {
        let mut request = LMRequest::new();
        if let Some(system) = &self.system {
            request = request.add_message(Message::system(system.clone()));
        }
        request = request.add_message(Message::user(prompt));
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;
        request.stop = self.stop.clone();
        request
    }
}

/// Send `prompt` as a user message and return the first choice's content.
///
/// Fails with [`Error::NoLmConfigured`] when `lm` is `None`, and with
/// [`Error::LmInvocationFailed`] when the backend errors or returns no choices.
pub async fn generate_text(
    lm: Option<&dyn LM>,
    prompt: &str,
    options: &GenerateOptions,
) -> Result<String> {
    let lm = lm.ok_or(Error::NoLmConfigured)?;
    let request = lm.config().apply(options.request(prompt));
    let response = lm.generate(request).await.map_err(Error::lm)?;
    response
        .text()
        .map(str::to_string)
        .ok_or_else(|| Error::LmInvocationFailed("response contained no choices".to_string()))
}
