// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! LM response types

use crate::request::Message;
use serde::{Deserialize, Serialize};

/// Response from language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LMResponse {
    /// Generated choices, most likely first
    pub choices: Vec<Choice>,

    /// Token usage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Model that generated the response
    #[serde(default)]
    pub model: String,
}

/// A single generated message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// The generated message
    pub message: Message,

    /// Finish reason
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens
    pub prompt_tokens: u32,

    /// Completion tokens
    pub completion_tokens: u32,

    /// Total tokens
    pub total_tokens: u32,
}

impl Usage {
    /// Create new usage stats
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

impl LMResponse {
    /// Create a response with one assistant choice
    pub fn new(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: Message::assistant(text),
                finish_reason: Some("stop".to_string()),
            }],
            usage: None,
            model: model.into(),
        }
    }

    /// Add usage stats
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Content of the first choice
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}
