// Copyright © 2025 lituus-io <spicyzhug@gmail.com>
// All Rights Reserved.
// Licensed under PolyForm Noncommercial 1.0.0

//! LM request types

use serde::{Deserialize, Serialize};

/// Message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role (system, user, assistant)
    pub role: String,

    /// Content
    pub content: String,
}

impl Message {
    /// Create a message with an arbitrary role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Tool definition forwarded verbatim to backends that support tool calling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON schema of the tool arguments
    pub parameters: serde_json::Value,
}

/// Request to language model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LMRequest {
    /// Messages in the conversation, in order
    pub messages: Vec<Message>,

    /// Override max tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Override temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Tools the model may call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl LMRequest {
    /// Create a new request
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request holding a single user message
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self::new().add_message(Message::user(prompt))
    }

    /// Add a message
    pub fn add_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Content of the last user message, if any
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");
    }

    #[test]
    fn test_lm_request_builder() {
        let req = LMRequest::new()
            .add_message(Message::system("sys"))
            .add_message(Message::user("test"))
            .with_temperature(0.7)
            .with_max_tokens(100)
            .with_stop(vec!["\n\n".to_string()]);

        assert_eq!(req.messages.len(), 2);
        assert_eq!(req.temperature, Some(0.7));
        assert_eq!(req.max_tokens, Some(100));
        assert_eq!(req.stop.as_deref(), Some(&["\n\n".to_string()][..]));
        assert!(req.tools.is_none());
    }

    #[test]
    fn test_last_user_content() {
        let req = LMRequest::from_prompt("first")
            .add_message(Message::assistant("reply"))
            .add_message(Message::user("second"));
        assert_eq!(req.last_user_content(), Some("second"));
        assert_eq!(LMRequest::new().last_user_content(), None);
    }

    #[test]
    fn test_unset_options_are_not_serialized() {
        let json = serde_json::to_value(LMRequest::from_prompt("hi")).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("tools").is_none());
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
