//! Progress notification port
//!
//! Defines the interface for reporting progress during strategy and chain
//! execution.

use std::time::Duration;
use switchboard_domain::{NodeOutput, NodeType};

/// Callback for progress updates
///
/// Implementations live in the binary and can display progress in various
/// ways (log lines, a spinner, a web socket, ...). All methods default to
/// doing nothing.
pub trait ProgressNotifier: Send + Sync {
    /// Called when a chain node starts evaluating
    fn on_node_start(&self, _node_id: &str, _node_type: NodeType) {}

    /// Called when a chain node has produced its output
    fn on_node_complete(&self, _node_id: &str, _output: &NodeOutput, _elapsed: Duration) {}

    /// Called when one model call of a strategy finishes
    fn on_call_complete(&self, _model_id: &str, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {}
