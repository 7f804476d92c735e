//! Provider gateway port
//!
//! Defines the interface for invoking a model on an external provider.
//! Adapters own the wire format; the router only sees normalized replies.

use async_trait::async_trait;
use switchboard_domain::{DomainError, FinishReason, Model, Provider, ProviderStatus, Request, Usage};
use thiserror::Error;

/// Errors that can occur while talking to a provider
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl GatewayError {
    pub fn status(&self) -> ProviderStatus {
        match self {
            GatewayError::Status { code, .. } => ProviderStatus::Http(*code),
            GatewayError::Auth(_) => ProviderStatus::Http(401),
            GatewayError::Timeout => ProviderStatus::Timeout,
            GatewayError::Transport(_) => ProviderStatus::Transport,
            GatewayError::Malformed(_) => ProviderStatus::Malformed,
        }
    }

    /// Convert into the domain taxonomy, attributing the failure to `provider`.
    pub fn into_domain(self, provider: &str) -> DomainError {
        let status = self.status();
        let message = match self {
            GatewayError::Status { message, .. }
            | GatewayError::Auth(message)
            | GatewayError::Transport(message)
            | GatewayError::Malformed(message) => message,
            GatewayError::Timeout => "call exceeded its deadline".to_string(),
        };
        DomainError::ProviderError {
            provider: provider.to_string(),
            status,
            message,
        }
    }
}

/// Normalized provider answer, before cost and latency are attached
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub content: String,
    pub usage: Usage,
    pub finish_reason: FinishReason,
    pub metadata: serde_json::Value,
}

impl ProviderReply {
    pub fn new(content: impl Into<String>, usage: Usage) -> Self {
        Self {
            content: content.into(),
            usage,
            finish_reason: FinishReason::Stop,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_finish_reason(mut self, finish_reason: FinishReason) -> Self {
        self.finish_reason = finish_reason;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Gateway for model invocation
///
/// Implementations (adapters) live in the infrastructure layer. An
/// implementation must not retry; the router decides what a failure means.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// Send `request` to `model` on `provider` and wait for the full reply
    async fn invoke(
        &self,
        provider: &Provider,
        model: &Model,
        request: &Request,
    ) -> Result<ProviderReply, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_maps_to_401() {
        let err = GatewayError::Auth("missing key".to_string()).into_domain("openai");
        match err {
            DomainError::ProviderError {
                provider, status, ..
            } => {
                assert_eq!(provider, "openai");
                assert_eq!(status, ProviderStatus::Http(401));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn timeout_is_retryable() {
        let err = GatewayError::Timeout.into_domain("anthropic");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn server_error_is_not_retryable() {
        let err = GatewayError::Status {
            code: 500,
            message: "boom".to_string(),
        }
        .into_domain("openai");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("500"));
    }
}
