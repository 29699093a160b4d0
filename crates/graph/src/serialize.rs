//! Stable `to_map`/`from_map` serialisation. Every field survives a round
//! trip; `from_map` fills defaults for any field
//! missing from an older or hand-built map.

use std::collections::HashMap;

use cogmem_config::GraphConfig;
use cogmem_core::AgentId;
use cogmem_tokens::BudgetSpec;
use serde_json::{json, Map, Value};

use crate::edge::Edge;
use crate::graph::KnowledgeGraph;
use crate::node::{Node, NodeType};
use crate::pending::PendingCandidate;

pub const CURRENT_VERSION: u32 = 1;

impl KnowledgeGraph {
    pub fn to_map(&self) -> Value {
        let nodes: Vec<Value> = self.nodes.values().map(|n| serde_json::to_value(n).unwrap()).collect();
        let edges: Vec<Value> = self
            .edges
            .values()
            .flat_map(|v| v.iter())
            .map(|e| serde_json::to_value(e).unwrap())
            .collect();
        let active_set: Vec<String> = self.active_set.iter().map(|id| id.as_str().to_string()).collect();
        let type_quotas: Map<String, Value> = self
            .type_quotas
            .iter()
            .map(|(t, f)| (t.as_str().to_string(), json!(f)))
            .collect();
        json!({
            "version": CURRENT_VERSION,
            "agent_id": self.agent_id.as_str(),
            "nodes": nodes,
            "edges": edges,
            "active_set": active_set,
            "config": self.config,
            "max_tokens": self.max_tokens,
            "type_quotas": Value::Object(type_quotas),
            "last_decay_at": self.last_decay_at,
            "pending_facts": self.pending_facts,
            "pending_learnings": self.pending_learnings,
        })
    }

    /// Accepts maps produced by an older schema: any field absent is filled
    /// with its current default rather than failing deserialisation.
    pub fn from_map(value: &Value) -> Self {
        let agent_id = value
            .get("agent_id")
            .and_then(|v| v.as_str())
            .map(AgentId::from)
            .unwrap_or_else(|| AgentId::from("unknown"));
        let config: GraphConfig = value
            .get("config")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let mut graph = KnowledgeGraph::new(agent_id, config);

        if let Some(nodes) = value.get("nodes").and_then(|v| v.as_array()) {
            for raw in nodes {
                if let Ok(node) = serde_json::from_value::<Node>(raw.clone()) {
                    graph.nodes.insert(node.id.clone(), node);
                }
            }
        }
        if let Some(edges) = value.get("edges").and_then(|v| v.as_array()) {
            for raw in edges {
                if let Ok(edge) = serde_json::from_value::<Edge>(raw.clone()) {
                    graph.edges.entry(edge.source.clone()).or_default().push(edge);
                }
            }
        }
        if let Some(active_set) = value.get("active_set").and_then(|v| v.as_array()) {
            graph.active_set = active_set
                .iter()
                .filter_map(|v| v.as_str())
                .map(cogmem_core::NodeId::from_raw)
                .collect();
        }
        if let Some(max_tokens) = value.get("max_tokens") {
            graph.max_tokens = serde_json::from_value::<Option<BudgetSpec>>(max_tokens.clone()).unwrap_or(None);
        }
        if let Some(quotas) = value.get("type_quotas").and_then(|v| v.as_object()) {
            let mut map = HashMap::new();
            for (k, v) in quotas {
                if let (Some(t), Some(f)) = (NodeType::parse(k), v.as_f64()) {
                    map.insert(t, f);
                }
            }
            graph.type_quotas = map;
        }
        if let Some(last_decay) = value.get("last_decay_at") {
            graph.last_decay_at = serde_json::from_value(last_decay.clone()).unwrap_or(None);
        }
        if let Some(facts) = value.get("pending_facts").and_then(|v| v.as_array()) {
            graph.pending_facts = facts
                .iter()
                .filter_map(|v| serde_json::from_value::<PendingCandidate>(v.clone()).ok())
                .collect();
        }
        if let Some(learnings) = value.get("pending_learnings").and_then(|v| v.as_array()) {
            graph.pending_learnings = learnings
                .iter()
                .filter_map(|v| serde_json::from_value::<PendingCandidate>(v.clone()).ok())
                .collect();
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;

    #[test]
    fn round_trips_through_to_map_and_from_map() {
        let mut g = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        let a = g.add_node(NodeSpec::new("fact", "Alice likes tea")).unwrap();
        let b = g.add_node(NodeSpec::new("fact", "Tea is hot")).unwrap();
        g.add_edge(&a, &b, "implies", crate::edge::AddEdgeOpts::default()).unwrap();
        g.add_pending_fact("pending content", 0.5);

        let map = g.to_map();
        let restored = KnowledgeGraph::from_map(&map);

        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.get_node(&a).unwrap().content, "Alice likes tea");
        assert_eq!(restored.edges_from(&a).len(), 1);
        assert_eq!(restored.get_pending_facts().len(), 1);
        assert_eq!(restored.agent_id.as_str(), "a1");
    }

    #[test]
    fn from_map_fills_defaults_for_legacy_maps_missing_fields() {
        let legacy = json!({
            "agent_id": "legacy-agent",
            "nodes": [],
        });
        let restored = KnowledgeGraph::from_map(&legacy);
        assert_eq!(restored.agent_id.as_str(), "legacy-agent");
        assert_eq!(restored.config.max_active, 50);
        assert!(restored.get_pending_facts().is_empty());
    }
}
