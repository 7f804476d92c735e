//! Domain error types

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Status attached to a failed provider call.
///
/// Transport, auth and non-2xx failures carry the HTTP status when one exists;
/// deadline expiry is reported as `Timeout` so callers can tell it apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Non-2xx HTTP status returned by the provider
    Http(u16),
    /// The call exceeded its deadline
    Timeout,
    /// The request never produced a status (DNS, TLS, connection reset, ...)
    Transport,
    /// The provider answered 2xx but the body could not be normalized
    Malformed,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderStatus::Http(code) => write!(f, "{}", code),
            ProviderStatus::Timeout => write!(f, "timeout"),
            ProviderStatus::Transport => write!(f, "transport"),
            ProviderStatus::Malformed => write!(f, "malformed"),
        }
    }
}

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Provider {provider} rate limited, retry after {}ms", retry_after.as_millis())]
    RateLimited {
        provider: String,
        retry_after: Duration,
    },

    #[error("Provider {provider} failed ({status}): {message}")]
    ProviderError {
        provider: String,
        status: ProviderStatus,
        message: String,
    },

    #[error("Chain graph contains a cycle through node '{node}'")]
    CyclicGraph { node: String },

    #[error("Invalid chain graph: {0}")]
    InvalidGraph(String),

    #[error("No models given")]
    NoModels,

    #[error("No model matches the requested constraints")]
    NoCandidates,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' failed: {message}")]
    ToolFailed { tool: String, message: String },

    #[error("Node '{node}' failed: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: Box<DomainError>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            DomainError::Cancelled => true,
            DomainError::NodeFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether a caller may retry the same call later.
    ///
    /// Only rate limiting and provider timeouts/transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            DomainError::RateLimited { .. } => true,
            DomainError::ProviderError { status, .. } => matches!(
                status,
                ProviderStatus::Timeout | ProviderStatus::Transport | ProviderStatus::Http(429)
            ),
            _ => false,
        }
    }

    /// Delay hint for `RateLimited`.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            DomainError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Wrap this error as the failure of a chain node.
    pub fn in_node(self, node: impl Into<String>) -> Self {
        match self {
            DomainError::Cancelled => DomainError::Cancelled,
            other => DomainError::NodeFailed {
                node: node.into(),
                source: Box::new(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_timeout_status_display() {
        let error = DomainError::ProviderError {
            provider: "openai".to_string(),
            status: ProviderStatus::Timeout,
            message: "deadline exceeded".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Provider openai failed (timeout): deadline exceeded"
        );
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let error = DomainError::RateLimited {
            provider: "anthropic".to_string(),
            retry_after: Duration::from_millis(1500),
        };
        assert!(error.is_retryable());
        assert_eq!(error.retry_after(), Some(Duration::from_millis(1500)));
        assert!(error.to_string().contains("1500ms"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(!DomainError::UnknownModel("x".to_string()).is_retryable());
        assert!(
            !DomainError::CyclicGraph {
                node: "a".to_string()
            }
            .is_retryable()
        );
        assert!(
            !DomainError::ProviderError {
                provider: "p".to_string(),
                status: ProviderStatus::Http(401),
                message: "bad key".to_string(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_in_node_keeps_cancellation_flat() {
        assert!(matches!(
            DomainError::Cancelled.in_node("n1"),
            DomainError::Cancelled
        ));

        let wrapped = DomainError::UnknownTool("grep".to_string()).in_node("t1");
        assert!(matches!(wrapped, DomainError::NodeFailed { ref node, .. } if node == "t1"));
        assert_eq!(wrapped.to_string(), "Node 't1' failed: Unknown tool: grep");
    }
}
