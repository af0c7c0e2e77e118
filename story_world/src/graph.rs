//! Story graphs - independent state machines tracking narrative progress.

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::ordered::OrderedMap;

/// Descriptive node category. Carried for tooling, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Scene,
    #[default]
    State,
    Choice,
    Condition,
}

/// A state within a story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub kind: NodeKind,
}

impl Node {
    /// Create a state node labelled with its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            kind: NodeKind::State,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A documented path between two nodes.
///
/// Edges without a condition describe manual transitions only. Edges with a
/// variable condition are also taken automatically when the condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: None,
        }
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// The edge's condition if it is a variable threshold.
    pub fn var_condition(&self) -> Option<&Condition> {
        self.condition.as_ref().filter(|c| c.is_var())
    }
}

/// Authored description of one graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    #[serde(default)]
    pub start_node: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphConfig {
    pub fn new(start_node: impl Into<String>) -> Self {
        Self {
            start_node: start_node.into(),
            ..Default::default()
        }
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }
}

/// Inconsistencies found while building a graph. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphIssue {
    #[error("start node '{start}' is not declared, starting at '{fallback}'")]
    UnknownStartNode { start: String, fallback: String },

    #[error("no nodes declared, graph has no current node")]
    NoNodes,

    #[error("edge '{from}' -> '{to}' references an undeclared node")]
    DanglingEdge { from: String, to: String },
}

/// A live story graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Always a declared node id, or `None` when the graph has no nodes.
    pub current_node: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Build a graph positioned at its start node, reporting anything odd.
    pub fn from_config(config: &GraphConfig) -> (Self, Vec<GraphIssue>) {
        let mut issues = Vec::new();
        let mut graph = Self {
            current_node: None,
            nodes: config.nodes.clone(),
            edges: config.edges.clone(),
        };

        if graph.has_node(&config.start_node) {
            graph.current_node = Some(config.start_node.clone());
        } else if let Some(first) = graph.nodes.first() {
            issues.push(GraphIssue::UnknownStartNode {
                start: config.start_node.clone(),
                fallback: first.id.clone(),
            });
            graph.current_node = Some(first.id.clone());
        } else {
            issues.push(GraphIssue::NoNodes);
        }

        for edge in &graph.edges {
            if !graph.has_node(&edge.from) || !graph.has_node(&edge.to) {
                issues.push(GraphIssue::DanglingEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
        }

        (graph, issues)
    }

    /// Get a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// The node the graph currently sits on.
    pub fn current(&self) -> Option<&Node> {
        self.current_node.as_deref().and_then(|id| self.node(id))
    }

    /// Edges leaving a node, in declaration order.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from == node_id)
    }

    /// Move to a declared node. Returns false, leaving the graph untouched, for unknown ids.
    pub fn set_current(&mut self, node_id: &str) -> bool {
        if !self.has_node(node_id) {
            return false;
        }
        self.current_node = Some(node_id.to_string());
        true
    }
}

/// All graphs, keyed by graph id in declaration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphStore {
    graphs: OrderedMap<Graph>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, graph: Graph) {
        self.graphs.insert(id, graph);
    }

    pub fn get(&self, id: &str) -> Option<&Graph> {
        self.graphs.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Graph> {
        self.graphs.get_mut(id)
    }

    /// Current node id of a graph, if the graph exists and has one.
    pub fn current_node(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|g| g.current_node.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Graph)> {
        self.graphs.iter()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_act() -> GraphConfig {
        GraphConfig::new("intro")
            .with_node(Node::new("intro").with_kind(NodeKind::Scene))
            .with_node(Node::new("middle"))
            .with_node(Node::new("ending"))
            .with_edge(Edge::new("intro", "middle"))
            .with_edge(Edge::new("middle", "ending"))
    }

    #[test]
    fn test_starts_at_start_node() {
        let (graph, issues) = Graph::from_config(&three_act());
        assert!(issues.is_empty());
        assert_eq!(graph.current().map(|n| n.id.as_str()), Some("intro"));
    }

    #[test]
    fn test_unknown_start_falls_back_to_first_node() {
        let mut config = three_act();
        config.start_node = "prologue".to_string();

        let (graph, issues) = Graph::from_config(&config);
        assert_eq!(graph.current_node.as_deref(), Some("intro"));
        assert!(matches!(issues[0], GraphIssue::UnknownStartNode { .. }));
    }

    #[test]
    fn test_empty_graph_has_no_current_node() {
        let (graph, issues) = Graph::from_config(&GraphConfig::new("anything"));
        assert!(graph.current_node.is_none());
        assert_eq!(issues, vec![GraphIssue::NoNodes]);
    }

    #[test]
    fn test_dangling_edges_are_reported_and_kept() {
        let config = three_act().with_edge(Edge::new("ending", "epilogue"));
        let (graph, issues) = Graph::from_config(&config);

        assert_eq!(graph.edges.len(), 3);
        assert_eq!(
            issues,
            vec![GraphIssue::DanglingEdge {
                from: "ending".to_string(),
                to: "epilogue".to_string(),
            }]
        );
    }

    #[test]
    fn test_set_current_rejects_unknown_nodes() {
        let (mut graph, _) = Graph::from_config(&three_act());
        assert!(!graph.set_current("nowhere"));
        assert_eq!(graph.current_node.as_deref(), Some("intro"));
        assert!(graph.set_current("ending"));
        assert_eq!(graph.current_node.as_deref(), Some("ending"));
    }

    #[test]
    fn test_outgoing() {
        let (graph, _) = Graph::from_config(&three_act());
        let targets: Vec<_> = graph.outgoing("intro").map(|e| e.to.as_str()).collect();
        assert_eq!(targets, vec!["middle"]);
        assert_eq!(graph.outgoing("ending").count(), 0);
    }

    #[test]
    fn test_node_type_field_name() {
        let node: Node =
            serde_json::from_str(r#"{"id": "fork", "label": "Fork", "type": "choice"}"#).unwrap();
        assert_eq!(node.kind, NodeKind::Choice);
    }
}
