//! Per-node outputs and the final chain result.

use crate::request::Response;
use crate::request::response::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default separator between merged texts
pub const DEFAULT_MERGE_SEPARATOR: &str = "\n\n---\n\n";

/// Joiner between an llm node's base text and its predecessors' texts
const LLM_INPUT_JOINER: &str = "\n\n";

/// Joiner between collection points in the final output
const FINAL_JOINER: &str = "\n\n";

/// Branch taken by a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    True,
    False,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::True => "true",
            Branch::False => "false",
        }
    }
}

impl From<bool> for Branch {
    fn from(met: bool) -> Self {
        if met { Branch::True } else { Branch::False }
    }
}

/// Output produced by one node evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_met: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<Branch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    /// Handler-specific structured payload (tools)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Model that produced the text (llm nodes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default)]
    pub cost: f64,
}

impl NodeOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// `{text: input, conditionMet, branch}`
    pub fn condition(input: impl Into<String>, met: bool) -> Self {
        Self {
            text: input.into(),
            condition_met: Some(met),
            branch: Some(Branch::from(met)),
            ..Default::default()
        }
    }

    pub fn from_response(response: &Response) -> Self {
        Self {
            text: response.content.clone(),
            model_id: Some(response.model_id.clone()),
            cost: response.cost,
            ..Default::default()
        }
    }

    pub fn with_generated_code(mut self, code: Option<String>) -> Self {
        self.generated_code = code;
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = if data.is_null() { None } else { Some(data) };
        self
    }
}

/// Join predecessor texts with `separator`, in the given order.
pub fn merge_texts<'a>(inputs: impl IntoIterator<Item = &'a NodeOutput>, separator: &str) -> String {
    inputs
        .into_iter()
        .map(|output| output.text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Base text followed by each non-empty predecessor text.
pub fn llm_input<'a>(base: &str, inputs: impl IntoIterator<Item = &'a NodeOutput>) -> String {
    std::iter::once(base)
        .chain(inputs.into_iter().map(|output| output.text.as_str()))
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(LLM_INPUT_JOINER)
}

/// First generated code among `inputs`.
pub fn first_generated_code<'a>(
    inputs: impl IntoIterator<Item = &'a NodeOutput>,
) -> Option<String> {
    inputs
        .into_iter()
        .find_map(|output| output.generated_code.clone())
}

/// Output of one node, keyed by id, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub node_id: String,
    pub output: NodeOutput,
}

/// Final result of a chain run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainOutput {
    /// Trimmed texts of the collection points, joined by blank lines
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    pub nodes_executed: usize,
    pub total_cost: f64,
    #[serde(with = "duration_ms")]
    pub total_time: Duration,
    /// Outputs in execution order
    pub node_outputs: Vec<NodeRecord>,
}

impl ChainOutput {
    /// Assemble the final output from the collection points' outputs.
    pub fn collect<'a>(collected: impl IntoIterator<Item = &'a NodeOutput> + Clone) -> (String, Option<String>) {
        let output = collected
            .clone()
            .into_iter()
            .map(|o| o.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(FINAL_JOINER);
        (output, first_generated_code(collected))
    }

    pub fn node(&self, id: &str) -> Option<&NodeOutput> {
        self.node_outputs
            .iter()
            .find(|record| record.node_id == id)
            .map(|record| &record.output)
    }
}
