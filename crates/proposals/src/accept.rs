//! `accept` and `accept_all`: routes an accepted proposal into the
//! knowledge graph by type.

use cogmem_core::error::{GraphError, ProposalError};
use cogmem_core::{NodeId, ProposalId};
use cogmem_graph::{KnowledgeGraph, NodeSpec, NodeType};
use serde_json::json;

use crate::proposal::{Proposal, ProposalType};
use crate::queue::ProposalQueue;

const IDENTITY_MAX_CHARS: usize = 200;

fn truncate_with_ellipsis(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// `(node_type, truncate, domain_store)` for each proposal type.
/// `thought`/`concern`/`curiosity`/`cognitive_mode`/`preconscious` all
/// route to `observation`.
fn routing_for(proposal_type: ProposalType) -> (NodeType, bool, Option<&'static str>) {
    match proposal_type {
        ProposalType::Fact => (NodeType::Fact, false, None),
        ProposalType::Insight => (NodeType::Insight, false, None),
        ProposalType::Learning => (NodeType::Skill, false, None),
        ProposalType::Pattern => (NodeType::Experience, false, None),
        ProposalType::Thought
        | ProposalType::Concern
        | ProposalType::Curiosity
        | ProposalType::CognitiveMode
        | ProposalType::Preconscious => (NodeType::Observation, false, None),
        ProposalType::Identity => (NodeType::Trait, true, Some("self_knowledge")),
        ProposalType::Goal | ProposalType::GoalUpdate => (NodeType::Goal, true, Some("goals")),
        ProposalType::Intent => (NodeType::Intention, true, Some("intents")),
    }
}

impl ProposalQueue {
    /// Accepts a pending proposal, materialising it into `graph` per the
    /// routing table, and marks it `accepted`. Confidence boost: the new
    /// node's relevance is `min(1.0, confidence + 0.2)`.
    pub fn accept(&mut self, id: &ProposalId, graph: &mut KnowledgeGraph) -> Result<NodeId, ProposalError> {
        self.check_acceptable(id)?;
        let proposal = self.get(id).expect("checked acceptable above").clone();
        let node_id = materialise(&proposal, graph).map_err(|_| ProposalError::InvalidStatus {
            current: "pending".to_string(),
            expected: "graph acceptance failed".to_string(),
        })?;
        self.mark_accepted(id)?;
        tracing::info!(agent_id = %self.agent_id, proposal_id = %id, node_id = %node_id, "proposal accepted");
        Ok(node_id)
    }

    /// Accepts every currently pending proposal, in list order, returning
    /// the materialised node ids that succeeded. A single failure does not
    /// abort the remainder.
    pub fn accept_all(&mut self, graph: &mut KnowledgeGraph) -> Vec<NodeId> {
        let pending_ids: Vec<ProposalId> = self
            .all()
            .iter()
            .filter(|p| p.status == crate::proposal::ProposalStatus::Pending)
            .map(|p| p.id.clone())
            .collect();

        let mut accepted = Vec::new();
        for id in pending_ids {
            if let Ok(node_id) = self.accept(&id, graph) {
                accepted.push(node_id);
            }
        }
        accepted
    }
}

fn materialise(proposal: &Proposal, graph: &mut KnowledgeGraph) -> Result<NodeId, GraphError> {
    let (node_type, truncate, domain_store) = routing_for(proposal.proposal_type);
    let content = if truncate {
        truncate_with_ellipsis(&proposal.content, IDENTITY_MAX_CHARS)
    } else {
        proposal.content.clone()
    };
    let relevance = (proposal.confidence + 0.2).min(1.0);

    let mut spec = NodeSpec::new(node_type.as_str(), content).with_relevance(relevance).with_confidence(proposal.confidence);
    if let Some(store) = domain_store {
        spec = spec
            .with_metadata("reference_only", json!(true))
            .with_metadata("domain_store", json!(store))
            .with_metadata("domain_key", json!(proposal.id.as_str()));
    }
    graph.add_node(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::ProposalAttrs;
    use cogmem_config::GraphConfig;
    use cogmem_core::AgentId;

    fn setup() -> (ProposalQueue, KnowledgeGraph) {
        (ProposalQueue::new(AgentId::from("a1")), KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default()))
    }

    #[test]
    fn fact_routes_untruncated_with_no_domain_store() {
        let (mut q, mut g) = setup();
        let id = q.create("fact", "water boils at 100C", ProposalAttrs::default()).unwrap();
        let node_id = q.accept(&id, &mut g).unwrap();
        let node = g.get_node(&node_id).unwrap();
        assert_eq!(node.node_type, NodeType::Fact);
        assert_eq!(node.content, "water boils at 100C");
        assert!(!node.metadata.contains_key("reference_only"));
    }

    #[test]
    fn identity_truncates_and_sets_domain_store() {
        let (mut q, mut g) = setup();
        let long = "x".repeat(250);
        let id = q.create("identity", long.clone(), ProposalAttrs::default()).unwrap();
        let node_id = q.accept(&id, &mut g).unwrap();
        let node = g.get_node(&node_id).unwrap();
        assert_eq!(node.node_type, NodeType::Trait);
        assert!(node.content.ends_with("..."));
        assert!(node.content.len() < long.len());
        assert_eq!(node.metadata.get("domain_store").unwrap(), "self_knowledge");
    }

    #[test]
    fn confidence_boost_is_capped_at_one() {
        let (mut q, mut g) = setup();
        let id = q.create("fact", "x", ProposalAttrs { confidence: Some(0.95), ..Default::default() }).unwrap();
        let node_id = q.accept(&id, &mut g).unwrap();
        assert_eq!(g.get_node(&node_id).unwrap().relevance, 1.0);
    }

    #[test]
    fn accept_all_processes_every_pending_proposal() {
        let (mut q, mut g) = setup();
        q.create("fact", "a", ProposalAttrs::default()).unwrap();
        q.create("insight", "b", ProposalAttrs::default()).unwrap();
        let accepted = q.accept_all(&mut g);
        assert_eq!(accepted.len(), 2);
        assert_eq!(q.count_pending(), 0);
    }

    #[test]
    fn accepting_non_pending_proposal_fails() {
        let (mut q, mut g) = setup();
        let id = q.create("fact", "x", ProposalAttrs::default()).unwrap();
        q.reject(&id).unwrap();
        assert!(q.accept(&id, &mut g).is_err());
    }
}
