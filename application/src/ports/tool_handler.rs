//! Tool handler port
//!
//! Tools are named text transformers that chain `tool` nodes dispatch to.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_domain::DomainError;
use thiserror::Error;

/// Errors a tool handler may return
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Failed(String),
}

/// Result of one tool invocation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    pub text: String,
    pub generated_code: Option<String>,
    pub data: Option<serde_json::Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_generated_code(mut self, code: impl Into<String>) -> Self {
        self.generated_code = Some(code.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A named tool
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &str;

    /// Run the tool on `input` with node-supplied `args`
    async fn run(&self, input: &str, args: &serde_json::Value) -> Result<ToolOutput, ToolError>;
}

/// Name-keyed set of tool handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    handlers: HashMap<String, Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own name, replacing any previous one.
    pub fn register(mut self, handler: impl ToolHandler + 'static) -> Self {
        self.handlers
            .insert(handler.name().to_string(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolHandler>> {
        self.handlers.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch by name, mapping failures into the domain taxonomy.
    pub async fn dispatch(
        &self,
        name: &str,
        input: &str,
        args: &serde_json::Value,
    ) -> Result<ToolOutput, DomainError> {
        let handler = self
            .get(name)
            .ok_or_else(|| DomainError::UnknownTool(name.to_string()))?;
        handler
            .run(input, args)
            .await
            .map_err(|e| DomainError::ToolFailed {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}
