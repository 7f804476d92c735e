//! Chain graph domain
//!
//! A chain graph is a directed acyclic graph of processing nodes. This module
//! owns its wire description, the index-addressed arena with validation and
//! topological ordering, and the pure aggregation rules for node outputs.

pub mod chain;
pub mod description;
pub mod node;
pub mod output;

pub use chain::{ChainGraph, Node, NodeIndex};
pub use description::{EdgeDescription, GraphDescription, NodeDescription};
pub use node::{
    ConditionConfig, LlmConfig, MergeConfig, NodeKind, NodeType, OutputConfig, Predicate,
    PromptConfig, ToolConfig,
};
pub use output::{
    Branch, ChainOutput, DEFAULT_MERGE_SEPARATOR, NodeOutput, NodeRecord, first_generated_code,
    llm_input, merge_texts,
};
