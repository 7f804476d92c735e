//! Chain graph arena: nodes addressed by index, adjacency kept per node.

use super::description::{EdgeDescription, GraphDescription, NodeDescription};
use super::node::{NodeKind, NodeType};
use crate::core::error::DomainError;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Position of a node in the arena (declaration order).
pub type NodeIndex = usize;

/// A processing node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
}

/// Directed graph of processing nodes.
///
/// Node ids are unique and every edge references existing nodes; both are
/// enforced on insertion. Acyclicity is checked by [`execution_order`]
/// before anything runs.
///
/// [`execution_order`]: ChainGraph::execution_order
///
/// # Example
///
/// ```
/// use switchboard_domain::graph::{ChainGraph, NodeKind};
///
/// let mut graph = ChainGraph::new();
/// graph.add_node("p", NodeKind::prompt("hello")).unwrap();
/// graph.add_node("o", NodeKind::output()).unwrap();
/// graph.add_edge("p", "o").unwrap();
///
/// let order = graph.execution_order().unwrap();
/// assert_eq!(order, vec![0, 1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ChainGraph {
    nodes: Vec<Node>,
    index: HashMap<String, NodeIndex>,
    /// Predecessors per node, in edge-declaration order
    incoming: Vec<Vec<NodeIndex>>,
    /// Successors per node, in edge-declaration order
    outgoing: Vec<Vec<NodeIndex>>,
    edge_count: usize,
}

impl ChainGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and validate a graph from its wire description.
    pub fn from_description(description: &GraphDescription) -> Result<Self, DomainError> {
        let mut graph = Self::new();
        for node in &description.nodes {
            let kind = NodeKind::from_parts(node.node_type, node.data.clone()).map_err(|e| {
                DomainError::InvalidGraph(format!(
                    "node '{}' ({}) has invalid data: {}",
                    node.id, node.node_type, e
                ))
            })?;
            graph.add_node(node.id.clone(), kind)?;
        }
        for edge in &description.edges {
            graph.add_edge(&edge.source, &edge.target)?;
        }
        Ok(graph)
    }

    /// Encode back into the wire description.
    pub fn to_description(&self) -> GraphDescription {
        let nodes = self
            .nodes
            .iter()
            .map(|node| {
                let (node_type, data) = node.kind.to_parts();
                NodeDescription {
                    id: node.id.clone(),
                    node_type,
                    data,
                }
            })
            .collect();
        let mut edges = Vec::with_capacity(self.edge_count);
        for (source, targets) in self.outgoing.iter().enumerate() {
            for &target in targets {
                edges.push(EdgeDescription::new(
                    self.nodes[source].id.clone(),
                    self.nodes[target].id.clone(),
                ));
            }
        }
        GraphDescription { nodes, edges }
    }

    pub fn add_node(
        &mut self,
        id: impl Into<String>,
        kind: NodeKind,
    ) -> Result<NodeIndex, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::InvalidGraph("node id cannot be empty".to_string()));
        }
        if self.index.contains_key(&id) {
            return Err(DomainError::InvalidGraph(format!(
                "duplicate node id '{}'",
                id
            )));
        }
        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(Node { id, kind });
        self.incoming.push(Vec::new());
        self.outgoing.push(Vec::new());
        Ok(idx)
    }

    /// Add `source → target`. Repeating an existing edge is a no-op.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<(), DomainError> {
        let from = self.require(source, "source")?;
        let to = self.require(target, "target")?;
        if self.outgoing[from].contains(&to) {
            return Ok(());
        }
        self.outgoing[from].push(to);
        self.incoming[to].push(from);
        self.edge_count += 1;
        Ok(())
    }

    fn require(&self, id: &str, role: &str) -> Result<NodeIndex, DomainError> {
        self.index.get(id).copied().ok_or_else(|| {
            DomainError::InvalidGraph(format!("edge {} '{}' is not a node", role, id))
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn predecessors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.incoming[idx]
    }

    pub fn successors(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.outgoing[idx]
    }

    /// Nodes with no incoming edge
    pub fn sources(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .filter(|&i| self.incoming[i].is_empty())
            .collect()
    }

    /// Nodes with no outgoing edge
    pub fn sinks(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .filter(|&i| self.outgoing[i].is_empty())
            .collect()
    }

    /// Nodes whose text forms the final result: sinks and `output` nodes,
    /// in declaration order.
    pub fn collection_points(&self) -> Vec<NodeIndex> {
        (0..self.nodes.len())
            .filter(|&i| {
                self.outgoing[i].is_empty() || self.nodes[i].kind.node_type() == NodeType::Output
            })
            .collect()
    }

    /// A node lying on a cycle, if any.
    ///
    /// Iterative depth-first search with three-colour marking; a back edge
    /// to a node still on the stack closes a cycle.
    pub fn find_cycle(&self) -> Option<NodeIndex> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        let mut marks = vec![Mark::New; self.nodes.len()];
        for root in 0..self.nodes.len() {
            if marks[root] != Mark::New {
                continue;
            }
            marks[root] = Mark::Active;
            let mut stack: Vec<(NodeIndex, usize)> = vec![(root, 0)];

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                if let Some(&next) = self.outgoing[node].get(top.1) {
                    top.1 += 1;
                    match marks[next] {
                        Mark::Active => return Some(next),
                        Mark::New => {
                            marks[next] = Mark::Active;
                            stack.push((next, 0));
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
        None
    }

    /// Topological order of every node (Kahn's algorithm).
    ///
    /// Ties are broken by declaration order, so the order is deterministic.
    /// Fails with `CyclicGraph` naming a node on the cycle.
    pub fn execution_order(&self) -> Result<Vec<NodeIndex>, DomainError> {
        if let Some(node) = self.find_cycle() {
            return Err(DomainError::CyclicGraph {
                node: self.nodes[node].id.clone(),
            });
        }

        let mut in_degree: Vec<usize> = self.incoming.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<NodeIndex>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &next in &self.outgoing[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        debug_assert_eq!(order.len(), self.nodes.len());
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> ChainGraph {
        let mut g = ChainGraph::new();
        for id in nodes {
            g.add_node(*id, NodeKind::merge()).unwrap();
        }
        for (s, t) in edges {
            g.add_edge(s, t).unwrap();
        }
        g
    }

    fn ids(g: &ChainGraph, order: &[NodeIndex]) -> Vec<String> {
        order.iter().map(|&i| g.node(i).id.clone()).collect()
    }

    #[test]
    fn duplicate_node_id_rejected() {
        let mut g = ChainGraph::new();
        g.add_node("a", NodeKind::merge()).unwrap();
        let err = g.add_node("a", NodeKind::merge()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidGraph(_)));
    }

    #[test]
    fn dangling_edge_rejected() {
        let mut g = graph(&["a"], &[]);
        let err = g.add_edge("a", "ghost").unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn two_node_cycle_detected() {
        let g = graph(&["a", "b"], &[("a", "b"), ("b", "a")]);
        assert!(g.find_cycle().is_some());
        assert!(matches!(
            g.execution_order(),
            Err(DomainError::CyclicGraph { .. })
        ));
    }

    #[test]
    fn self_loop_detected() {
        let g = graph(&["a"], &[("a", "a")]);
        assert_eq!(g.find_cycle(), Some(0));
    }

    #[test]
    fn cycle_behind_a_source_is_named() {
        let g = graph(&["s", "x", "y"], &[("s", "x"), ("x", "y"), ("y", "x")]);
        let err = g.execution_order().unwrap_err();
        let DomainError::CyclicGraph { node } = err else {
            panic!("expected cycle");
        };
        assert!(node == "x" || node == "y");
    }

    #[test]
    fn diamond_orders_predecessors_first() {
        let g = graph(
            &["d", "b", "a", "c"],
            &[("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")],
        );
        let order = g.execution_order().unwrap();
        assert_eq!(ids(&g, &order), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn independent_nodes_follow_declaration_order() {
        let g = graph(&["z", "y", "x"], &[]);
        let order = g.execution_order().unwrap();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn sources_sinks_and_collection_points() {
        let mut g = graph(&["p", "m"], &[("p", "m")]);
        g.add_node("o", NodeKind::output()).unwrap();
        g.add_edge("m", "o").unwrap();
        g.add_node("tail", NodeKind::merge()).unwrap();
        g.add_edge("o", "tail").unwrap();

        assert_eq!(ids(&g, &g.sources()), vec!["p"]);
        assert_eq!(ids(&g, &g.sinks()), vec!["tail"]);
        assert_eq!(ids(&g, &g.collection_points()), vec!["o", "tail"]);
    }

    #[test]
    fn predecessors_keep_edge_declaration_order() {
        let g = graph(&["a", "b", "m"], &[("b", "m"), ("a", "m")]);
        let m = g.find("m").unwrap();
        assert_eq!(ids(&g, g.predecessors(m)), vec!["b", "a"]);
    }

    #[test]
    fn repeated_edge_is_ignored() {
        let g = graph(&["a", "b"], &[("a", "b"), ("a", "b")]);
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.predecessors(1).len(), 1);
    }

    #[test]
    fn from_description_decodes_nodes() {
        let description: GraphDescription = serde_json::from_value(json!({
            "nodes": [
                {"id": "p1", "type": "prompt", "data": {"text": "summarize X"}},
                {"id": "l1", "type": "llm", "data": {"model": "stub"}},
                {"id": "o1", "type": "output"}
            ],
            "edges": [
                {"source": "p1", "target": "l1"},
                {"source": "l1", "target": "o1"}
            ]
        }))
        .unwrap();

        let g = ChainGraph::from_description(&description).unwrap();
        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.node(0).kind, NodeKind::prompt("summarize X"));

        let back = g.to_description();
        assert_eq!(back.edges, description.edges);
    }

    #[test]
    fn from_description_rejects_bad_node_data() {
        let description: GraphDescription = serde_json::from_value(json!({
            "nodes": [{"id": "l1", "type": "llm", "data": {"temperature": 0.5}}]
        }))
        .unwrap();
        let err = ChainGraph::from_description(&description).unwrap_err();
        assert!(matches!(err, DomainError::InvalidGraph(ref msg) if msg.contains("l1")));
    }
}
