//! Request value object and its parts.

use serde::{Deserialize, Serialize};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A prior turn carried as history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters forwarded to the provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Vec<String>,
}

/// Extra inputs a request may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attachment {
    /// Name of a tool the model may call
    Tool { name: String },
    /// Image passed by URL (or data URL)
    Image { url: String },
}

/// A single generation request. Value object, no identity.
///
/// # Example
///
/// ```
/// use switchboard_domain::request::Request;
///
/// let request = Request::new("Summarize the release notes")
///     .with_system_prompt("Be terse")
///     .with_temperature(0.2)
///     .with_max_tokens(256);
///
/// assert_eq!(request.params.max_tokens, Some(256));
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Request {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Turn>,
    #[serde(default)]
    pub params: SamplingParams,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

impl Request {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.params.stop.push(stop.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Whether any attachment needs a vision-capable provider
    pub fn needs_vision(&self) -> bool {
        self.attachments
            .iter()
            .any(|a| matches!(a, Attachment::Image { .. }))
    }

    /// Whether any attachment needs a tool-capable provider
    pub fn needs_tools(&self) -> bool {
        self.attachments
            .iter()
            .any(|a| matches!(a, Attachment::Tool { .. }))
    }

    /// Output-token cap for a model that allows at most `model_max`.
    pub fn effective_max_tokens(&self, model_max: u32) -> u32 {
        self.params
            .max_tokens
            .map_or(model_max, |requested| requested.min(model_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_max_tokens_is_capped_by_model() {
        let request = Request::new("hi").with_max_tokens(10_000);
        assert_eq!(request.effective_max_tokens(4096), 4096);
        assert_eq!(Request::new("hi").effective_max_tokens(512), 512);
        assert_eq!(
            Request::new("hi").with_max_tokens(100).effective_max_tokens(512),
            100
        );
    }

    #[test]
    fn attachment_requirements() {
        let request = Request::new("look").with_attachment(Attachment::Image {
            url: "https://example.com/cat.png".to_string(),
        });
        assert!(request.needs_vision());
        assert!(!request.needs_tools());
    }

    #[test]
    fn deserializes_minimal_json() {
        let request: Request = serde_json::from_str(r#"{"prompt":"hello"}"#).unwrap();
        assert_eq!(request.prompt, "hello");
        assert!(request.history.is_empty());
        assert_eq!(request.params, SamplingParams::default());
    }
}
