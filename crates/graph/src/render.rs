//! Markdown rendering of the (budget-narrowed) active set for prompt
//! assembly via `to_prompt_text`.

use crate::graph::{KnowledgeGraph, PromptOpts};

impl KnowledgeGraph {
    /// Renders the active set as a markdown block, narrowed to `max_tokens`/
    /// `type_quotas` via [`KnowledgeGraph::budgeted_active_set`] when a
    /// budget is configured. Returns the empty string for an empty graph.
    pub fn to_prompt_text(&self, opts: PromptOpts) -> String {
        let nodes = self.budgeted_active_set(&opts);
        if nodes.is_empty() {
            return String::new();
        }
        let mut out = String::from("## Knowledge\n\n");
        for node in &nodes {
            out.push_str(&format!("- [{}] {}\n", node.node_type.as_str(), node.content));
            if opts.include_relationships {
                for edge in self.edges_from(&node.id) {
                    if let Some(target) = self.get_node(&edge.target) {
                        out.push_str(&format!("  → {}: {}\n", edge.relationship, target.content));
                    }
                }
                for edge in self.edges_to(&node.id) {
                    if let Some(source) = self.get_node(&edge.source) {
                        out.push_str(&format!("  ← {}: {}\n", edge.relationship, source.content));
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeSpec;
    use cogmem_config::GraphConfig;
    use cogmem_core::AgentId;

    #[test]
    fn empty_graph_renders_empty_string() {
        let g = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        assert_eq!(g.to_prompt_text(PromptOpts::default()), "");
    }

    #[test]
    fn renders_relationships_when_requested() {
        let mut g = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        let a = g.add_node(NodeSpec::new("fact", "Alice likes tea")).unwrap();
        let b = g.add_node(NodeSpec::new("fact", "Tea is hot")).unwrap();
        g.add_edge(&a, &b, "implies", crate::edge::AddEdgeOpts::default()).unwrap();
        let text = g.to_prompt_text(PromptOpts { include_relationships: true, limit: None });
        assert!(text.contains("Alice likes tea"));
        assert!(text.contains("→ implies: Tea is hot"));
        assert!(text.contains("← implies: Alice likes tea"));
    }

    #[test]
    fn to_prompt_text_is_narrowed_by_a_configured_token_budget() {
        let mut g = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        g.add_node(NodeSpec::new("fact", "a".repeat(400)).with_relevance(0.9)).unwrap();
        g.add_node(NodeSpec::new("fact", "b".repeat(400)).with_relevance(0.8)).unwrap();
        g.add_node(NodeSpec::new("fact", "c".repeat(400)).with_relevance(0.7)).unwrap();

        let unbudgeted = g.to_prompt_text(PromptOpts::default());
        assert!(unbudgeted.contains('a') && unbudgeted.contains('b') && unbudgeted.contains('c'));

        g.max_tokens = Some(cogmem_tokens::BudgetSpec::fixed(100));
        let budgeted = g.to_prompt_text(PromptOpts::default());
        assert!(budgeted.len() < unbudgeted.len());
    }

    #[test]
    fn to_prompt_text_excludes_a_zero_quota_type_under_a_budget() {
        let mut g = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        g.add_node(NodeSpec::new("fact", "excluded by quota")).unwrap();
        g.add_node(NodeSpec::new("skill", "kept under quota").with_relevance(0.9)).unwrap();
        g.max_tokens = Some(cogmem_tokens::BudgetSpec::fixed(1_000));
        g.type_quotas.insert(crate::node::NodeType::Fact, 0.0);

        let text = g.to_prompt_text(PromptOpts::default());
        assert!(!text.contains("excluded by quota"));
        assert!(text.contains("kept under quota"));
    }
}
