//! Node kinds and their configuration.

use serde::{Deserialize, Serialize};

/// Node type tag as it appears in graph descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Prompt,
    Llm,
    Tool,
    Condition,
    Merge,
    Output,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Prompt => "prompt",
            NodeType::Llm => "llm",
            NodeType::Tool => "tool",
            NodeType::Condition => "condition",
            NodeType::Merge => "merge",
            NodeType::Output => "output",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Literal text source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptConfig {
    #[serde(alias = "prompt", alias = "template")]
    pub text: String,
}

/// Model call through the router.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    pub model: String,
    /// Base text placed before the predecessors' outputs
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

/// Named tool dispatch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    #[serde(alias = "name")]
    pub tool: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Predicate over the incoming text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Predicate {
    Contains {
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    NotContains {
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    Equals {
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    StartsWith {
        value: String,
        #[serde(default)]
        case_sensitive: bool,
    },
    #[default]
    NonEmpty,
    MinLength {
        chars: usize,
    },
}

impl Predicate {
    pub fn evaluate(&self, input: &str) -> bool {
        match self {
            Predicate::Contains {
                value,
                case_sensitive,
            } => fold(input, *case_sensitive).contains(&fold(value, *case_sensitive)),
            Predicate::NotContains {
                value,
                case_sensitive,
            } => !fold(input, *case_sensitive).contains(&fold(value, *case_sensitive)),
            Predicate::Equals {
                value,
                case_sensitive,
            } => fold(input.trim(), *case_sensitive) == fold(value.trim(), *case_sensitive),
            Predicate::StartsWith {
                value,
                case_sensitive,
            } => fold(input.trim_start(), *case_sensitive).starts_with(&fold(value, *case_sensitive)),
            Predicate::NonEmpty => !input.trim().is_empty(),
            Predicate::MinLength { chars } => input.chars().count() >= *chars,
        }
    }
}

fn fold(text: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        text.to_string()
    } else {
        text.to_lowercase()
    }
}

/// Branch evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub predicate: Predicate,
}

/// Concatenation of all predecessors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConfig {
    /// Overrides the configured default separator
    #[serde(default)]
    pub separator: Option<String>,
}

/// Terminal collection point.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default)]
    pub separator: Option<String>,
}

/// Closed set of node kinds with their configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Prompt(PromptConfig),
    Llm(LlmConfig),
    Tool(ToolConfig),
    Condition(ConditionConfig),
    Merge(MergeConfig),
    Output(OutputConfig),
}

impl NodeKind {
    /// Decode the kind-specific `data` object of a node description.
    pub fn from_parts(
        node_type: NodeType,
        data: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let data = if data.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            data
        };
        Ok(match node_type {
            NodeType::Prompt => NodeKind::Prompt(serde_json::from_value(data)?),
            NodeType::Llm => NodeKind::Llm(serde_json::from_value(data)?),
            NodeType::Tool => NodeKind::Tool(serde_json::from_value(data)?),
            NodeType::Condition => NodeKind::Condition(serde_json::from_value(data)?),
            NodeType::Merge => NodeKind::Merge(serde_json::from_value(data)?),
            NodeType::Output => NodeKind::Output(serde_json::from_value(data)?),
        })
    }

    /// Encode back into a `(type, data)` pair.
    pub fn to_parts(&self) -> (NodeType, serde_json::Value) {
        let data = match self {
            NodeKind::Prompt(c) => serde_json::to_value(c),
            NodeKind::Llm(c) => serde_json::to_value(c),
            NodeKind::Tool(c) => serde_json::to_value(c),
            NodeKind::Condition(c) => serde_json::to_value(c),
            NodeKind::Merge(c) => serde_json::to_value(c),
            NodeKind::Output(c) => serde_json::to_value(c),
        };
        (self.node_type(), data.unwrap_or(serde_json::Value::Null))
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Prompt(_) => NodeType::Prompt,
            NodeKind::Llm(_) => NodeType::Llm,
            NodeKind::Tool(_) => NodeType::Tool,
            NodeKind::Condition(_) => NodeType::Condition,
            NodeKind::Merge(_) => NodeType::Merge,
            NodeKind::Output(_) => NodeType::Output,
        }
    }

    pub fn prompt(text: impl Into<String>) -> Self {
        NodeKind::Prompt(PromptConfig { text: text.into() })
    }

    pub fn llm(model: impl Into<String>) -> Self {
        NodeKind::Llm(LlmConfig {
            model: model.into(),
            ..Default::default()
        })
    }

    pub fn tool(tool: impl Into<String>) -> Self {
        NodeKind::Tool(ToolConfig {
            tool: tool.into(),
            args: serde_json::Value::Null,
        })
    }

    pub fn condition(predicate: Predicate) -> Self {
        NodeKind::Condition(ConditionConfig { predicate })
    }

    pub fn merge() -> Self {
        NodeKind::Merge(MergeConfig::default())
    }

    pub fn output() -> Self {
        NodeKind::Output(OutputConfig::default())
    }
}
