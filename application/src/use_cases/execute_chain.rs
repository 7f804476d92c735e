//! Chain graph executor
//!
//! Evaluates every node of a [`ChainGraph`] exactly once, in topological
//! order, feeding each node the memoized outputs of its predecessors. The
//! first node failure ends the run.

use super::route_call::SingleCallRouter;
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::ports::provider_gateway::ProviderGateway;
use crate::ports::tool_handler::ToolRegistry;
use std::sync::Arc;
use std::time::Instant;
use switchboard_domain::graph::{
    DEFAULT_MERGE_SEPARATOR, LlmConfig, Node, first_generated_code, llm_input, merge_texts,
};
use switchboard_domain::{
    ChainGraph, ChainOutput, DomainError, GraphDescription, NodeKind, NodeOutput, NodeRecord,
    Request,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Use case for running a chain graph
pub struct ChainExecutor<G: ProviderGateway + 'static> {
    router: SingleCallRouter<G>,
    tools: Arc<ToolRegistry>,
    merge_separator: String,
    cancellation_token: Option<CancellationToken>,
}

impl<G: ProviderGateway + 'static> ChainExecutor<G> {
    pub fn new(router: SingleCallRouter<G>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            router,
            tools,
            merge_separator: DEFAULT_MERGE_SEPARATOR.to_string(),
            cancellation_token: None,
        }
    }

    /// Separator for merge and output nodes that do not set their own
    pub fn with_merge_separator(mut self, separator: impl Into<String>) -> Self {
        self.merge_separator = separator.into();
        self
    }

    /// Set cancellation token for graceful shutdown
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build a graph from its description and run it
    pub async fn execute_description(
        &self,
        description: &GraphDescription,
    ) -> Result<ChainOutput, DomainError> {
        let graph = ChainGraph::from_description(description)?;
        self.execute(&graph).await
    }

    /// Execute the graph with default (no-op) progress
    pub async fn execute(&self, graph: &ChainGraph) -> Result<ChainOutput, DomainError> {
        self.execute_with_progress(graph, &NoProgress).await
    }

    /// Execute the graph with per-node progress callbacks
    pub async fn execute_with_progress(
        &self,
        graph: &ChainGraph,
        progress: &dyn ProgressNotifier,
    ) -> Result<ChainOutput, DomainError> {
        let started = Instant::now();
        // Rejects cycles before anything is evaluated
        let order = graph.execution_order()?;

        info!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "Executing chain graph"
        );

        let mut outputs: Vec<Option<NodeOutput>> = vec![None; graph.len()];
        let mut records = Vec::with_capacity(order.len());

        for idx in order {
            self.check_cancelled()?;

            let node = graph.node(idx);
            progress.on_node_start(&node.id, node.kind.node_type());
            let node_started = Instant::now();

            let inputs: Vec<&NodeOutput> = graph
                .predecessors(idx)
                .iter()
                .filter_map(|&p| outputs[p].as_ref())
                .collect();
            let output = self
                .evaluate(node, &inputs)
                .await
                .map_err(|e| e.in_node(&node.id))?;

            let elapsed = node_started.elapsed();
            debug!(
                node = %node.id,
                kind = %node.kind.node_type(),
                latency_ms = elapsed.as_millis() as u64,
                "Node evaluated"
            );
            progress.on_node_complete(&node.id, &output, elapsed);

            records.push(NodeRecord {
                node_id: node.id.clone(),
                output: output.clone(),
            });
            outputs[idx] = Some(output);
        }

        let collected: Vec<&NodeOutput> = graph
            .collection_points()
            .into_iter()
            .filter_map(|idx| outputs[idx].as_ref())
            .collect();
        let (output, generated_code) = ChainOutput::collect(collected.iter().copied());
        let total_cost = records.iter().map(|r| r.output.cost).sum();
        let total_time = started.elapsed();

        info!(
            nodes_executed = records.len(),
            cost = total_cost,
            latency_ms = total_time.as_millis() as u64,
            "Chain graph finished"
        );

        Ok(ChainOutput {
            output,
            generated_code,
            nodes_executed: records.len(),
            total_cost,
            total_time,
            node_outputs: records,
        })
    }

    async fn evaluate(
        &self,
        node: &Node,
        inputs: &[&NodeOutput],
    ) -> Result<NodeOutput, DomainError> {
        let first_text = || inputs.first().map(|o| o.text.as_str()).unwrap_or("");

        match &node.kind {
            NodeKind::Prompt(config) => Ok(NodeOutput::text(config.text.clone())),
            NodeKind::Llm(config) => {
                let request = llm_request(config, inputs);
                let response = self.router.call(&request, &config.model).await?;
                Ok(NodeOutput::from_response(&response))
            }
            NodeKind::Tool(config) => {
                let out = self
                    .tools
                    .dispatch(&config.tool, first_text(), &config.args)
                    .await?;
                Ok(NodeOutput::text(out.text)
                    .with_generated_code(out.generated_code)
                    .with_data(out.data.unwrap_or_default()))
            }
            NodeKind::Condition(config) => {
                let input = first_text();
                Ok(NodeOutput::condition(input, config.predicate.evaluate(input)))
            }
            NodeKind::Merge(config) => {
                let separator = config.separator.as_deref().unwrap_or(&self.merge_separator);
                Ok(NodeOutput::text(merge_texts(
                    inputs.iter().copied(),
                    separator,
                )))
            }
            NodeKind::Output(config) => {
                let separator = config.separator.as_deref().unwrap_or(&self.merge_separator);
                Ok(
                    NodeOutput::text(merge_texts(inputs.iter().copied(), separator))
                        .with_generated_code(first_generated_code(inputs.iter().copied())),
                )
            }
        }
    }

    fn check_cancelled(&self) -> Result<(), DomainError> {
        if let Some(token) = &self.cancellation_token
            && token.is_cancelled()
        {
            return Err(DomainError::Cancelled);
        }
        Ok(())
    }
}

fn llm_request(config: &LlmConfig, inputs: &[&NodeOutput]) -> Request {
    let mut request = Request::new(llm_input(&config.prompt, inputs.iter().copied()));
    if let Some(system) = &config.system_prompt {
        request = request.with_system_prompt(system.clone());
    }
    if let Some(temperature) = config.temperature {
        request = request.with_temperature(temperature);
    }
    if let Some(max_tokens) = config.max_tokens {
        request = request.with_max_tokens(max_tokens);
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::provider_gateway::ProviderReply;
    use crate::ports::tool_handler::{ToolError, ToolHandler, ToolOutput};
    use crate::use_cases::test_support::{StubGateway, catalog};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;
    use switchboard_domain::graph::{EdgeDescription, MergeConfig, NodeDescription, Predicate};
    use switchboard_domain::{NodeType, Usage};

    struct Fence;

    #[async_trait]
    impl ToolHandler for Fence {
        fn name(&self) -> &str {
            "fence"
        }

        async fn run(&self, input: &str, _args: &serde_json::Value) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::text(format!("```\n{}\n```", input))
                .with_generated_code(input.to_string())
                .with_data(json!({"lines": input.lines().count()})))
        }
    }

    fn summarizer() -> StubGateway {
        StubGateway::new().respond_with("a1", |request| {
            Ok(ProviderReply::new(
                format!("summary-of-{}", request.prompt),
                Usage::new(10, 5),
            ))
        })
    }

    fn executor(gateway: Arc<StubGateway>) -> ChainExecutor<StubGateway> {
        let router = SingleCallRouter::new(gateway, Arc::new(catalog()));
        ChainExecutor::new(router, Arc::new(ToolRegistry::new().register(Fence)))
    }

    #[tokio::test]
    async fn prompt_llm_output_end_to_end() {
        let description = GraphDescription::from_json(
            r#"{
                "nodes": [
                    {"id": "P1", "type": "prompt", "data": {"text": "X"}},
                    {"id": "L1", "type": "llm", "data": {"model": "a1"}},
                    {"id": "O1", "type": "output"}
                ],
                "edges": [
                    {"source": "P1", "target": "L1"},
                    {"source": "L1", "target": "O1"}
                ]
            }"#,
        )
        .unwrap();
        let gateway = Arc::new(summarizer());
        let executor = executor(Arc::clone(&gateway));

        let result = executor.execute_description(&description).await.unwrap();

        assert_eq!(result.output, "summary-of-X");
        assert_eq!(result.nodes_executed, 3);
        assert!(result.total_cost > 0.0);
        assert_eq!(gateway.calls(), vec![("a1".to_string(), "X".to_string())]);
        assert_eq!(result.node("L1").unwrap().model_id.as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn shared_predecessor_runs_once() {
        let mut graph = ChainGraph::new();
        graph.add_node("p", NodeKind::prompt("doc")).unwrap();
        graph.add_node("l", NodeKind::llm("a1")).unwrap();
        graph.add_node("o1", NodeKind::output()).unwrap();
        graph.add_node("o2", NodeKind::output()).unwrap();
        graph.add_edge("p", "l").unwrap();
        graph.add_edge("l", "o1").unwrap();
        graph.add_edge("l", "o2").unwrap();

        let gateway = Arc::new(summarizer());
        let result = executor(Arc::clone(&gateway)).execute(&graph).await.unwrap();

        assert_eq!(gateway.call_count("a1"), 1);
        assert_eq!(result.nodes_executed, 4);
        assert_eq!(result.output, "summary-of-doc\n\nsummary-of-doc");
    }

    #[tokio::test]
    async fn cycle_is_rejected_before_any_evaluation() {
        let mut graph = ChainGraph::new();
        graph.add_node("p", NodeKind::prompt("x")).unwrap();
        graph.add_node("a", NodeKind::llm("a1")).unwrap();
        graph.add_node("b", NodeKind::llm("a1")).unwrap();
        graph.add_edge("p", "a").unwrap();
        graph.add_edge("a", "b").unwrap();
        graph.add_edge("b", "a").unwrap();

        let gateway = Arc::new(summarizer());
        let err = executor(Arc::clone(&gateway))
            .execute(&graph)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::CyclicGraph { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn merge_joins_in_edge_order() {
        let mut graph = ChainGraph::new();
        graph.add_node("b", NodeKind::prompt("B")).unwrap();
        graph.add_node("a", NodeKind::prompt("A")).unwrap();
        graph.add_node("m", NodeKind::merge()).unwrap();
        graph.add_edge("a", "m").unwrap();
        graph.add_edge("b", "m").unwrap();

        let result = executor(Arc::new(StubGateway::new()))
            .execute(&graph)
            .await
            .unwrap();
        assert_eq!(result.output, "A\n\n---\n\nB");
    }

    #[tokio::test]
    async fn merge_separator_overrides() {
        let mut graph = ChainGraph::new();
        graph.add_node("a", NodeKind::prompt("A")).unwrap();
        graph.add_node("b", NodeKind::prompt("B")).unwrap();
        graph
            .add_node(
                "m",
                NodeKind::Merge(MergeConfig {
                    separator: Some(" + ".to_string()),
                }),
            )
            .unwrap();
        graph.add_node("n", NodeKind::merge()).unwrap();
        graph.add_edge("a", "m").unwrap();
        graph.add_edge("b", "m").unwrap();
        graph.add_edge("a", "n").unwrap();
        graph.add_edge("b", "n").unwrap();

        let result = executor(Arc::new(StubGateway::new()))
            .with_merge_separator(" | ")
            .execute(&graph)
            .await
            .unwrap();
        assert_eq!(result.node("m").unwrap().text, "A + B");
        assert_eq!(result.node("n").unwrap().text, "A | B");
    }

    #[tokio::test]
    async fn condition_does_not_prune() {
        let mut graph = ChainGraph::new();
        graph.add_node("p", NodeKind::prompt("hello world")).unwrap();
        graph
            .add_node(
                "c",
                NodeKind::condition(Predicate::Contains {
                    value: "goodbye".to_string(),
                    case_sensitive: false,
                }),
            )
            .unwrap();
        graph.add_node("l", NodeKind::llm("a1")).unwrap();
        graph.add_edge("p", "c").unwrap();
        graph.add_edge("c", "l").unwrap();

        let gateway = Arc::new(summarizer());
        let result = executor(Arc::clone(&gateway)).execute(&graph).await.unwrap();

        let condition = result.node("c").unwrap();
        assert_eq!(condition.condition_met, Some(false));
        assert_eq!(condition.text, "hello world");
        assert_eq!(result.output, "summary-of-hello world");
        assert_eq!(result.nodes_executed, 3);
    }

    #[tokio::test]
    async fn tool_output_surfaces_generated_code() {
        let description = GraphDescription {
            nodes: vec![
                NodeDescription {
                    id: "src".to_string(),
                    node_type: NodeType::Prompt,
                    data: json!({"text": "fn main() {}"}),
                },
                NodeDescription {
                    id: "wrap".to_string(),
                    node_type: NodeType::Tool,
                    data: json!({"tool": "fence"}),
                },
                NodeDescription {
                    id: "out".to_string(),
                    node_type: NodeType::Output,
                    data: serde_json::Value::Null,
                },
            ],
            edges: vec![
                EdgeDescription::new("src", "wrap"),
                EdgeDescription::new("wrap", "out"),
            ],
        };

        let result = executor(Arc::new(StubGateway::new()))
            .execute_description(&description)
            .await
            .unwrap();

        assert_eq!(result.generated_code.as_deref(), Some("fn main() {}"));
        assert_eq!(result.output, "```\nfn main() {}\n```");
        assert_eq!(result.node("wrap").unwrap().data, Some(json!({"lines": 1})));
    }

    #[tokio::test]
    async fn node_failure_is_fatal() {
        let mut graph = ChainGraph::new();
        graph.add_node("p", NodeKind::prompt("x")).unwrap();
        graph.add_node("l", NodeKind::llm("b1")).unwrap();
        graph.add_node("o", NodeKind::output()).unwrap();
        graph.add_edge("p", "l").unwrap();
        graph.add_edge("l", "o").unwrap();

        let err = executor(Arc::new(StubGateway::new().fail("b1", 500)))
            .execute(&graph)
            .await
            .unwrap_err();

        match err {
            DomainError::NodeFailed { node, source } => {
                assert_eq!(node, "l");
                assert!(matches!(*source, DomainError::ProviderError { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_tool_fails_the_node() {
        let mut graph = ChainGraph::new();
        graph.add_node("p", NodeKind::prompt("x")).unwrap();
        graph.add_node("t", NodeKind::tool("missing")).unwrap();
        graph.add_edge("p", "t").unwrap();

        let err = executor(Arc::new(StubGateway::new()))
            .execute(&graph)
            .await
            .unwrap_err();
        assert!(
            matches!(err, DomainError::NodeFailed { ref node, ref source } if node == "t" && matches!(**source, DomainError::UnknownTool(_)))
        );
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let mut graph = ChainGraph::new();
        graph.add_node("p", NodeKind::prompt("x")).unwrap();
        graph.add_node("l", NodeKind::llm("a1")).unwrap();
        graph.add_edge("p", "l").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let gateway = Arc::new(summarizer());
        let err = executor(Arc::clone(&gateway))
            .with_cancellation(token)
            .execute(&graph)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn progress_follows_execution_order() {
        #[derive(Default)]
        struct Recorder(Mutex<Vec<String>>);

        impl ProgressNotifier for Recorder {
            fn on_node_complete(&self, node_id: &str, _output: &NodeOutput, _elapsed: Duration) {
                self.0.lock().unwrap().push(node_id.to_string());
            }
        }

        // declared out of dependency order
        let mut graph = ChainGraph::new();
        graph.add_node("out", NodeKind::output()).unwrap();
        graph.add_node("second", NodeKind::prompt("2")).unwrap();
        graph.add_node("first", NodeKind::prompt("1")).unwrap();
        graph.add_edge("first", "out").unwrap();
        graph.add_edge("second", "out").unwrap();

        let recorder = Recorder::default();
        let result = executor(Arc::new(StubGateway::new()))
            .execute_with_progress(&graph, &recorder)
            .await
            .unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["second".to_string(), "first".to_string(), "out".to_string()]
        );
        assert_eq!(result.output, "1\n\n---\n\n2");
    }

    #[test]
    fn llm_request_carries_sampling() {
        let config = LlmConfig {
            model: "a1".to_string(),
            prompt: "Translate:".to_string(),
            system_prompt: Some("be brief".to_string()),
            temperature: Some(0.2),
            max_tokens: Some(64),
        };
        let upstream = NodeOutput::text("bonjour");
        let request = llm_request(&config, &[&upstream]);

        assert_eq!(request.prompt, "Translate:\n\nbonjour");
        assert_eq!(request.system_prompt.as_deref(), Some("be brief"));
        assert_eq!(request.params.temperature, Some(0.2));
        assert_eq!(request.params.max_tokens, Some(64));
    }
}
