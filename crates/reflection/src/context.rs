//! Deep-context assembly for `deep_reflect`: goals with priority emoji
//! and a progress bar, self-knowledge, the rendered
//! knowledge graph and working memory, recent thinking, and recent
//! activity.

use cogmem_graph::{KnowledgeGraph, NodeType, PromptOpts};
use cogmem_working_memory::WorkingMemory;

fn priority_emoji(priority: &str) -> &'static str {
    match priority {
        "critical" => "🔴",
        "high" => "🟠",
        "medium" => "🟡",
        "low" => "🟢",
        _ => "⚪",
    }
}

fn progress_bar(progress: u8) -> String {
    let filled = (progress as usize * 10 / 100).min(10);
    let bar: String = "█".repeat(filled) + &"░".repeat(10 - filled);
    format!("[{bar}] {progress}%")
}

/// Inputs a caller assembles to build the deep context: goals,
/// self-knowledge, the graph, working memory, recent thinking, and recent
/// activity.
#[derive(Debug, Clone, Default)]
pub struct DeepContextInputs<'a> {
    pub recent_thinking: Vec<&'a str>,
    pub recent_activity: Vec<&'a str>,
}

pub fn build_deep_context(graph: &KnowledgeGraph, working_memory: &WorkingMemory, inputs: DeepContextInputs) -> String {
    let mut sections = Vec::new();

    if !working_memory.active_goals().is_empty() {
        let mut block = String::from("## Active Goals (evaluate first)\n");
        for goal in working_memory.active_goals() {
            block.push_str(&format!(
                "{} {} — {}\n",
                priority_emoji(&goal.priority),
                goal.description,
                progress_bar(goal.progress)
            ));
        }
        sections.push(block);
    }

    let traits = graph.find_by_type(NodeType::Trait, None);
    if !traits.is_empty() {
        let mut block = String::from("## Self-Knowledge\n");
        for t in traits {
            block.push_str(&format!("- {}\n", t.content));
        }
        sections.push(block);
    }

    let graph_text = graph.to_prompt_text(PromptOpts { include_relationships: true, limit: None });
    if !graph_text.is_empty() {
        sections.push(format!("## Knowledge Graph\n{graph_text}\n"));
    }

    let wm_text = working_memory.to_prompt_text(Default::default());
    if !wm_text.is_empty() {
        sections.push(format!("## Working Memory\n{wm_text}\n"));
    }

    if !inputs.recent_thinking.is_empty() {
        let mut block = String::from("## Recent Thinking\n");
        for t in &inputs.recent_thinking {
            block.push_str(&format!("- {t}\n"));
        }
        sections.push(block);
    }

    if !inputs.recent_activity.is_empty() {
        let mut block = String::from("## Recent Activity\n");
        for a in &inputs.recent_activity {
            block.push_str(&format!("- {a}\n"));
        }
        sections.push(block);
    }

    sections.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_config::GraphConfig;
    use cogmem_core::AgentId;
    use cogmem_graph::NodeSpec;
    use cogmem_working_memory::GoalInput;

    #[test]
    fn goals_render_with_emoji_and_progress_bar() {
        let mut wm = WorkingMemory::new(AgentId::from("a1"), Default::default());
        wm.add_goal(GoalInput {
            description: "ship it".to_string(),
            priority: Some("critical".to_string()),
            progress: Some(40),
            ..Default::default()
        });
        let graph = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        let text = build_deep_context(&graph, &wm, DeepContextInputs::default());
        assert!(text.contains("🔴"));
        assert!(text.contains("40%"));
    }

    #[test]
    fn self_knowledge_lists_trait_nodes() {
        let wm = WorkingMemory::new(AgentId::from("a1"), Default::default());
        let mut graph = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        graph.add_node(NodeSpec::new("trait", "curious by nature")).unwrap();
        let text = build_deep_context(&graph, &wm, DeepContextInputs::default());
        assert!(text.contains("## Self-Knowledge"));
        assert!(text.contains("curious by nature"));
    }

    #[test]
    fn empty_inputs_render_empty_string() {
        let wm = WorkingMemory::new(AgentId::from("a1"), Default::default());
        let graph = KnowledgeGraph::new(AgentId::from("a1"), GraphConfig::default());
        assert_eq!(build_deep_context(&graph, &wm, DeepContextInputs::default()), "");
    }
}
