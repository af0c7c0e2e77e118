//! Conditions - the single predicate shape shared by edges, content, and scenes.

use serde::{Deserialize, Serialize};

use crate::graph::GraphStore;
use crate::value::{Value, VarOp, VariableStore};

/// One operator/threshold pair of a variable condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub op: VarOp,
    pub value: Value,
}

/// A condition over the current story state.
///
/// Authored data may use the tagged form (`{"kind": "var", "var": "gold",
/// "op": "gte", "value": 3}`) or the older untagged form where the variant is
/// inferred from the fields present (`{"var": "gold", "gte": 3, "lte": 9}`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    /// Always matches. Used for fallbacks and unconditional entries.
    #[default]
    Always,

    /// Matches while a graph sits on a node.
    Node { graph_id: String, node_id: String },

    /// Matches when a variable passes every threshold.
    Var {
        var: String,
        thresholds: Vec<Threshold>,
    },
}

impl Condition {
    /// Create a node condition.
    pub fn node(graph_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Condition::Node {
            graph_id: graph_id.into(),
            node_id: node_id.into(),
        }
    }

    /// Create a single-threshold variable condition.
    pub fn var(name: impl Into<String>, op: VarOp, value: impl Into<Value>) -> Self {
        Condition::Var {
            var: name.into(),
            thresholds: vec![Threshold {
                op,
                value: value.into(),
            }],
        }
    }

    /// Add another threshold to a variable condition. Other variants are returned unchanged.
    pub fn and_threshold(mut self, op: VarOp, value: impl Into<Value>) -> Self {
        if let Condition::Var { thresholds, .. } = &mut self {
            thresholds.push(Threshold {
                op,
                value: value.into(),
            });
        }
        self
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Condition::Var { .. })
    }

    /// Evaluate the condition against current state.
    ///
    /// A variable condition on a missing variable never matches, unless it
    /// carries no thresholds at all.
    pub fn matches(&self, variables: &VariableStore, graphs: &GraphStore) -> bool {
        match self {
            Condition::Always => true,
            Condition::Node { graph_id, node_id } => {
                graphs.current_node(graph_id) == Some(node_id.as_str())
            }
            Condition::Var { var, thresholds } => {
                let actual = variables.get(var);
                thresholds.iter().all(|t| match actual {
                    Some(actual) => t.op.holds(actual, &t.value),
                    None => false,
                })
            }
        }
    }
}

/// Wire shape of a condition. Every field is optional so partial data still loads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, alias = "graph", skip_serializing_if = "Option::is_none")]
    graph_id: Option<String>,
    #[serde(default, alias = "node", skip_serializing_if = "Option::is_none")]
    node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    var: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op: Option<VarOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    eq: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gte: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lte: Option<Value>,
}

impl RawCondition {
    fn into_node(self) -> Condition {
        Condition::Node {
            graph_id: self.graph_id.unwrap_or_default(),
            node_id: self.node_id.unwrap_or_default(),
        }
    }

    fn into_var(self) -> Condition {
        let mut thresholds = Vec::new();
        if let (Some(op), Some(value)) = (self.op, self.value) {
            thresholds.push(Threshold { op, value });
        }
        for (op, value) in [
            (VarOp::Eq, self.eq),
            (VarOp::Gte, self.gte),
            (VarOp::Lte, self.lte),
        ] {
            if let Some(value) = value {
                thresholds.push(Threshold { op, value });
            }
        }
        Condition::Var {
            var: self.var.unwrap_or_default(),
            thresholds,
        }
    }
}

impl From<RawCondition> for Condition {
    fn from(raw: RawCondition) -> Self {
        match raw.kind.as_deref() {
            Some("none") | Some("always") => Condition::Always,
            Some("node") => raw.into_node(),
            Some("var") => raw.into_var(),
            _ if raw.graph_id.is_some() && raw.node_id.is_some() => raw.into_node(),
            _ if raw.var.is_some() => raw.into_var(),
            _ => Condition::Always,
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Always => RawCondition {
                kind: Some("none".to_string()),
                ..Default::default()
            },
            Condition::Node { graph_id, node_id } => RawCondition {
                kind: Some("node".to_string()),
                graph_id: Some(graph_id),
                node_id: Some(node_id),
                ..Default::default()
            },
            Condition::Var { var, thresholds } => {
                let mut raw = RawCondition {
                    kind: Some("var".to_string()),
                    var: Some(var),
                    ..Default::default()
                };
                if let [single] = thresholds.as_slice() {
                    raw.op = Some(single.op);
                    raw.value = Some(single.value.clone());
                } else {
                    for t in thresholds {
                        let slot = match t.op {
                            VarOp::Eq => &mut raw.eq,
                            VarOp::Gte => &mut raw.gte,
                            VarOp::Lte => &mut raw.lte,
                        };
                        *slot = Some(t.value);
                    }
                }
                raw
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, GraphConfig, Node};

    fn store_at(graph_id: &str, node: &str) -> GraphStore {
        let config = GraphConfig::new(node).with_node(Node::new(node)).with_node(Node::new("other"));
        let (graph, _) = Graph::from_config(&config);
        let mut store = GraphStore::new();
        store.insert(graph_id, graph);
        store
    }

    #[test]
    fn test_always_matches() {
        assert!(Condition::Always.matches(&VariableStore::new(), &GraphStore::new()));
    }

    #[test]
    fn test_node_condition() {
        let graphs = store_at("main", "intro");
        let vars = VariableStore::new();

        assert!(Condition::node("main", "intro").matches(&vars, &graphs));
        assert!(!Condition::node("main", "other").matches(&vars, &graphs));
        assert!(!Condition::node("side", "intro").matches(&vars, &graphs));
    }

    #[test]
    fn test_var_condition_requires_all_thresholds() {
        let graphs = GraphStore::new();
        let vars: VariableStore = [("gold", Value::from(5))].into_iter().collect();

        let range = Condition::var("gold", VarOp::Gte, 3).and_threshold(VarOp::Lte, 9);
        assert!(range.matches(&vars, &graphs));

        let too_narrow = Condition::var("gold", VarOp::Gte, 3).and_threshold(VarOp::Lte, 4);
        assert!(!too_narrow.matches(&vars, &graphs));
    }

    #[test]
    fn test_missing_variable_never_matches() {
        let condition = Condition::var("missing", VarOp::Lte, 100);
        assert!(!condition.matches(&VariableStore::new(), &GraphStore::new()));
    }

    #[test]
    fn test_tagged_deserialization() {
        let c: Condition =
            serde_json::from_str(r#"{"kind": "var", "var": "gold", "op": "gte", "value": 3}"#)
                .unwrap();
        assert_eq!(c, Condition::var("gold", VarOp::Gte, 3));

        let c: Condition =
            serde_json::from_str(r#"{"kind": "node", "graphId": "main", "nodeId": "end"}"#)
                .unwrap();
        assert_eq!(c, Condition::node("main", "end"));

        let c: Condition = serde_json::from_str(r#"{"kind": "none"}"#).unwrap();
        assert_eq!(c, Condition::Always);
    }

    #[test]
    fn test_untagged_deserialization_infers_variant() {
        let c: Condition = serde_json::from_str(r#"{"var": "gold", "gte": 3, "lte": 9}"#).unwrap();
        assert_eq!(
            c,
            Condition::var("gold", VarOp::Gte, 3).and_threshold(VarOp::Lte, 9)
        );

        let c: Condition = serde_json::from_str(r#"{"graph": "main", "node": "end"}"#).unwrap();
        assert_eq!(c, Condition::node("main", "end"));

        let c: Condition = serde_json::from_str("{}").unwrap();
        assert_eq!(c, Condition::Always);
    }

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(Condition::var("gold", VarOp::Eq, 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "var", "var": "gold", "op": "eq", "value": 1.0})
        );
    }
}
