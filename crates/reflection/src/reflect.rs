//! `deep_reflect`, `maybe_reflect`, and `periodic_reflection`: prompt
//! assembly, the LLM round-trip, response parsing, and
//! applying the parsed sections back into the knowledge graph and working
//! memory.

use chrono::Utc;
use cogmem_config::ReflectionConfig;
use cogmem_core::error::ExternalError;
use cogmem_core::external::{GenerateTextOpts, LlmProvider, RelationshipStore};
use cogmem_core::AgentId;
use cogmem_graph::{AddEdgeOpts, KnowledgeGraph, NodeSpec};
use cogmem_working_memory::{GoalInput, WorkingMemory};

use crate::context::{build_deep_context, DeepContextInputs};
use crate::gate::{should_reflect, ShouldReflectOpts};
use crate::history::{ReflectionHistory, ReflectionRecord, UpdateCounts};
use crate::response::{parse_response, ReflectionResponse};
use crate::thinking::mentions_identity_shift;

/// An insight below this importance is noted but not written into working
/// memory; a learning below this confidence is dropped entirely. Neither
/// threshold has a mandated value, so both are picked conservatively and
/// recorded as a design decision.
const INSIGHT_IMPORTANCE_THRESHOLD: f64 = 0.5;
const LEARNING_CONFIDENCE_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeepReflectOpts {
    pub force: bool,
}

/// Caller-supplied slices `deep_reflect` cannot derive on its own: recent
/// free-text thinking and a rendering of recent signal activity.
#[derive(Debug, Clone, Default)]
pub struct DeepReflectInputs<'a> {
    pub recent_thinking: Vec<&'a str>,
    pub recent_activity: Vec<&'a str>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReflectOutcome {
    /// The gate declined to run this pass.
    Skipped,
    Ok { counts: UpdateCounts },
    Error { reason: String },
}

fn build_prompt(deep_context: &str) -> String {
    format!(
        "You are reflecting on your own recent activity, goals, and knowledge. \
         Evaluating and updating your active goals is the top priority of this pass.\n\n\
         {deep_context}\n\n\
         Respond with a single JSON object (no prose outside it) with these keys:\n\
         - goal_updates: [{{id?, description?, progress?, status?, note?, blockers?}}]\n\
         - new_goals: [{{description, priority?, goal_type?}}]\n\
         - insights: [{{content, importance?}}]\n\
         - learnings: [{{content, confidence?, category?}}]\n\
         - knowledge_nodes: [{{node_type, content, relevance?}}]\n\
         - knowledge_edges: [{{source, target, relationship}}]\n\
         - relationships: [{{name, data}}]\n\
         - self_insight_suggestions: [string]\n\
         - thinking: string\n\
         Omit a key or use an empty array/null when you have nothing to report for it."
    )
}

fn priority_rank(priority: &str) -> u8 {
    match priority {
        "critical" => 90,
        "high" => 70,
        "medium" => 50,
        "low" => 30,
        _ => 50,
    }
}

fn apply_goal_updates(working_memory: &mut WorkingMemory, response: &ReflectionResponse) -> usize {
    let mut applied = 0;
    for update in &response.goal_updates {
        let goal_id = match &update.id {
            Some(raw) => Some(cogmem_core::GoalId::from_raw(raw.clone())),
            None => update
                .description
                .as_deref()
                .and_then(|desc| working_memory.active_goals().iter().find(|g| g.description == desc))
                .map(|g| g.id.clone()),
        };
        let Some(goal_id) = goal_id else {
            tracing::debug!(?update, "goal_update named no resolvable goal, skipping");
            continue;
        };
        if !working_memory.active_goals().iter().any(|g| g.id == goal_id) {
            tracing::debug!(goal_id = %goal_id, "goal_update targets an unknown goal, skipping");
            continue;
        }

        if let Some(progress) = update.progress {
            let _ = working_memory.update_goal_progress(&goal_id, progress);
        }

        match update.status.as_deref() {
            Some("achieved") => {
                let _ = working_memory.complete_goal(&goal_id);
            }
            Some("abandoned") | Some("failed") => {
                let _ = working_memory.abandon_goal(&goal_id);
            }
            Some("blocked") => {
                let desc = update.description.clone().unwrap_or_else(|| goal_id.as_str().to_string());
                let blockers = update.blockers.join(", ");
                working_memory.add_thought(format!("Goal blocked: {desc} — {blockers}"));
            }
            _ => {}
        }

        if let Some(note) = &update.note {
            working_memory.add_thought(format!("Goal note: {note}"));
        }
        if update.status.as_deref() != Some("blocked") && !update.blockers.is_empty() {
            let desc = update.description.clone().unwrap_or_else(|| goal_id.as_str().to_string());
            working_memory.add_thought(format!("Blockers for '{desc}': {}", update.blockers.join(", ")));
        }

        applied += 1;
    }
    applied
}

fn apply_new_goals(working_memory: &mut WorkingMemory, response: &ReflectionResponse) -> usize {
    let mut ordered: Vec<_> = response.new_goals.iter().collect();
    ordered.sort_by_key(|g| std::cmp::Reverse(priority_rank(g.priority.as_deref().unwrap_or("medium"))));
    for goal in &ordered {
        working_memory.add_goal(GoalInput {
            id: None,
            description: goal.description.clone(),
            goal_type: Some(goal.goal_type.clone().unwrap_or_else(|| "achieve".to_string())),
            priority: Some(goal.priority.clone().unwrap_or_else(|| "medium".to_string())),
            progress: None,
        });
    }
    ordered.len()
}

fn apply_insights(working_memory: &mut WorkingMemory, response: &ReflectionResponse) -> usize {
    let mut applied = 0;
    for insight in &response.insights {
        if insight.importance.unwrap_or(INSIGHT_IMPORTANCE_THRESHOLD) < INSIGHT_IMPORTANCE_THRESHOLD {
            continue;
        }
        working_memory.add_thought(format!("[Insight] {}", insight.content));
        applied += 1;
    }
    applied
}

fn apply_learnings(graph: &mut KnowledgeGraph, working_memory: &mut WorkingMemory, response: &ReflectionResponse) -> usize {
    let mut applied = 0;
    for learning in &response.learnings {
        if learning.confidence.unwrap_or(LEARNING_CONFIDENCE_THRESHOLD) < LEARNING_CONFIDENCE_THRESHOLD {
            continue;
        }
        match learning.category.as_deref() {
            Some("technical") => {
                if graph.find_by_name(&learning.content).is_none() {
                    let _ = graph.add_node(NodeSpec::new("skill", learning.content.clone()));
                }
            }
            Some("self") => {
                working_memory.add_thought(format!("[Self-Growth] {}", learning.content));
            }
            _ => {
                working_memory.add_thought(format!("[Learning] {}", learning.content));
            }
        }
        applied += 1;
    }
    applied
}

fn apply_knowledge_nodes(graph: &mut KnowledgeGraph, response: &ReflectionResponse) -> usize {
    let mut applied = 0;
    for spec in &response.knowledge_nodes {
        if graph.find_by_name(&spec.content).is_some() {
            continue;
        }
        let mut node_spec = NodeSpec::new(spec.node_type.clone(), spec.content.clone());
        if let Some(relevance) = spec.relevance {
            node_spec = node_spec.with_relevance(relevance);
        }
        match graph.add_node(node_spec) {
            Ok(_) => applied += 1,
            Err(err) => tracing::debug!(error = %err, "reflection knowledge_node rejected"),
        }
    }
    applied
}

fn apply_knowledge_edges(graph: &mut KnowledgeGraph, response: &ReflectionResponse) -> usize {
    let mut applied = 0;
    for spec in &response.knowledge_edges {
        let source = graph.find_by_name(&spec.source).map(|n| n.id.clone());
        let target = graph.find_by_name(&spec.target).map(|n| n.id.clone());
        let (Some(source), Some(target)) = (source, target) else {
            tracing::debug!(source = %spec.source, target = %spec.target, "knowledge_edge endpoint not materialised, skipping");
            continue;
        };
        if graph.add_edge(&source, &target, spec.relationship.clone(), AddEdgeOpts::default()).is_ok() {
            applied += 1;
        }
    }
    applied
}

async fn apply_relationships(
    relationships: Option<&dyn RelationshipStore>,
    agent_id: &AgentId,
    response: &ReflectionResponse,
) -> usize {
    let Some(store) = relationships else {
        if !response.relationships.is_empty() {
            tracing::warn!(count = response.relationships.len(), "no relationship store wired, dropping relationship updates");
        }
        return 0;
    };
    let mut applied = 0;
    for update in &response.relationships {
        match store.put_by_name(agent_id, &update.name, update.data.clone()).await {
            Ok(()) => applied += 1,
            Err(err) => tracing::warn!(error = %err, name = %update.name, "relationship upsert failed"),
        }
    }
    applied
}

fn apply_self_insight_suggestions(working_memory: &mut WorkingMemory, response: &ReflectionResponse, cap: usize) -> usize {
    const PREFIX: &str = "[Insight Suggestion] ";
    let mut existing: usize = working_memory.recent_thoughts().iter().filter(|t| t.content.starts_with(PREFIX)).count();
    let mut applied = 0;
    for suggestion in &response.self_insight_suggestions {
        if existing >= cap {
            break;
        }
        let content = format!("{PREFIX}{suggestion}");
        if working_memory.recent_thoughts().iter().any(|t| t.content == content) {
            continue;
        }
        working_memory.add_thought(content);
        existing += 1;
        applied += 1;
    }
    applied
}

fn apply_thinking(working_memory: &mut WorkingMemory, response: &ReflectionResponse) {
    let Some(thinking) = &response.thinking else { return };
    if thinking.is_empty() {
        return;
    }
    if mentions_identity_shift(thinking) {
        working_memory.add_thought(format!("[Identity Shift] {thinking}"));
    } else {
        working_memory.add_thought(format!("[Reflection] {thinking}"));
    }
}

/// Runs a reflection pass unconditionally (bypassing `should_reflect?`) and
/// applies every section of the LLM's response. On an LLM failure, nothing
/// is mutated and the error is returned instead.
#[allow(clippy::too_many_arguments)]
pub async fn deep_reflect(
    agent_id: &AgentId,
    graph: &mut KnowledgeGraph,
    working_memory: &mut WorkingMemory,
    history: &mut ReflectionHistory,
    cfg: &ReflectionConfig,
    llm: &dyn LlmProvider,
    relationships: Option<&dyn RelationshipStore>,
    inputs: DeepReflectInputs<'_>,
) -> ReflectOutcome {
    let started_at = Utc::now();

    let deep_context = build_deep_context(
        graph,
        working_memory,
        DeepContextInputs { recent_thinking: inputs.recent_thinking, recent_activity: inputs.recent_activity },
    );
    let prompt = build_prompt(&deep_context);

    let raw = match llm.generate_text(&prompt, GenerateTextOpts::default()).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(agent_id = %agent_id, error = %err, "reflection LLM call failed, skipping this pass");
            return ReflectOutcome::Error { reason: reflection_reason(err) };
        }
    };

    let response = parse_response(&raw);

    let counts = UpdateCounts {
        goal_updates: apply_goal_updates(working_memory, &response),
        new_goals: apply_new_goals(working_memory, &response),
        insights: apply_insights(working_memory, &response),
        learnings: apply_learnings(graph, working_memory, &response),
        knowledge_nodes: apply_knowledge_nodes(graph, &response),
        knowledge_edges: apply_knowledge_edges(graph, &response),
        relationships: apply_relationships(relationships, agent_id, &response).await,
        self_insight_suggestions: apply_self_insight_suggestions(working_memory, &response, cfg.self_insight_cap),
    };
    apply_thinking(working_memory, &response);

    let duration_ms = (Utc::now() - started_at).num_milliseconds().max(0) as u64;
    tracing::info!(agent_id = %agent_id, duration_ms, ?counts, "reflection pass applied");
    history.push(ReflectionRecord { at: started_at, duration_ms, counts: counts.clone() });

    ReflectOutcome::Ok { counts }
}

fn reflection_reason(err: ExternalError) -> String {
    err.to_string()
}

/// Runs `deep_reflect` only if `should_reflect?` (or `opts.force`) says to.
#[allow(clippy::too_many_arguments)]
pub async fn maybe_reflect(
    agent_id: &AgentId,
    graph: &mut KnowledgeGraph,
    working_memory: &mut WorkingMemory,
    history: &mut ReflectionHistory,
    cfg: &ReflectionConfig,
    llm: &dyn LlmProvider,
    relationships: Option<&dyn RelationshipStore>,
    inputs: DeepReflectInputs<'_>,
    opts: DeepReflectOpts,
) -> ReflectOutcome {
    if !should_reflect(history, cfg, ShouldReflectOpts { force: opts.force }) {
        return ReflectOutcome::Skipped;
    }
    deep_reflect(agent_id, graph, working_memory, history, cfg, llm, relationships, inputs).await
}

/// The un-forced periodic entry point: `maybe_reflect` with the gate live.
pub async fn periodic_reflection(
    agent_id: &AgentId,
    graph: &mut KnowledgeGraph,
    working_memory: &mut WorkingMemory,
    history: &mut ReflectionHistory,
    cfg: &ReflectionConfig,
    llm: &dyn LlmProvider,
    relationships: Option<&dyn RelationshipStore>,
    inputs: DeepReflectInputs<'_>,
) -> ReflectOutcome {
    maybe_reflect(agent_id, graph, working_memory, history, cfg, llm, relationships, inputs, DeepReflectOpts::default()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_config::GraphConfig;
    use cogmem_core::external::{InMemoryRelationshipStore, MockLlmProvider};
    use cogmem_working_memory::GoalInput as GI;
    use serde_json::json;

    fn agent() -> AgentId {
        AgentId::from("a1")
    }

    struct FailingLlm;
    #[async_trait::async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate_text(&self, _prompt: &str, _opts: GenerateTextOpts) -> Result<String, ExternalError> {
            Err(ExternalError::LlmUnavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn applies_goal_updates_new_goals_and_insights() {
        let mut graph = KnowledgeGraph::new(agent(), GraphConfig::default());
        let mut wm = WorkingMemory::new(agent(), Default::default());
        let goal_id = wm.add_goal(GI { description: "ship the release".to_string(), ..Default::default() });
        let mut history = ReflectionHistory::new();
        let cfg = ReflectionConfig::default();

        let body = json!({
            "goal_updates": [{"id": goal_id.as_str(), "progress": 80, "status": "active", "note": "on track"}],
            "new_goals": [{"description": "write docs", "priority": "high"}],
            "insights": [{"content": "users prefer terse replies", "importance": 0.9}],
        })
        .to_string();
        let llm = MockLlmProvider::canned(body);

        let outcome = deep_reflect(&agent(), &mut graph, &mut wm, &mut history, &cfg, &llm, None, DeepReflectInputs::default()).await;
        let ReflectOutcome::Ok { counts } = outcome else { panic!("expected Ok") };
        assert_eq!(counts.goal_updates, 1);
        assert_eq!(counts.new_goals, 1);
        assert_eq!(counts.insights, 1);
        assert_eq!(wm.active_goals().iter().find(|g| g.id == goal_id).unwrap().progress, 80);
        assert!(wm.active_goals().iter().any(|g| g.description == "write docs"));
        assert!(wm.recent_thoughts().iter().any(|t| t.content.contains("users prefer terse replies")));
        assert_eq!(history.records().len(), 1);
    }

    #[tokio::test]
    async fn achieved_status_completes_the_goal() {
        let mut graph = KnowledgeGraph::new(agent(), GraphConfig::default());
        let mut wm = WorkingMemory::new(agent(), Default::default());
        let goal_id = wm.add_goal(GI { description: "finish onboarding".to_string(), ..Default::default() });
        let mut history = ReflectionHistory::new();
        let cfg = ReflectionConfig::default();

        let body = json!({"goal_updates": [{"id": goal_id.as_str(), "status": "achieved"}]}).to_string();
        let llm = MockLlmProvider::canned(body);
        let _ = deep_reflect(&agent(), &mut graph, &mut wm, &mut history, &cfg, &llm, None, DeepReflectInputs::default()).await;
        assert!(wm.active_goals().is_empty());
        assert!(wm.recent_thoughts().iter().any(|t| t.content.contains("Completed goal")));
    }

    #[tokio::test]
    async fn knowledge_nodes_dedup_by_name_and_edges_skip_unmaterialised_endpoints() {
        let mut graph = KnowledgeGraph::new(agent(), GraphConfig::default());
        let mut wm = WorkingMemory::new(agent(), Default::default());
        let mut history = ReflectionHistory::new();
        let cfg = ReflectionConfig::default();

        let body = json!({
            "knowledge_nodes": [
                {"node_type": "fact", "content": "rust has no GC"},
                {"node_type": "fact", "content": "rust has no GC"}
            ],
            "knowledge_edges": [
                {"source": "rust has no GC", "target": "nonexistent node", "relationship": "relates_to"}
            ]
        })
        .to_string();
        let llm = MockLlmProvider::canned(body);
        let outcome = deep_reflect(&agent(), &mut graph, &mut wm, &mut history, &cfg, &llm, None, DeepReflectInputs::default()).await;
        let ReflectOutcome::Ok { counts } = outcome else { panic!("expected Ok") };
        assert_eq!(counts.knowledge_nodes, 1);
        assert_eq!(counts.knowledge_edges, 0);
        assert_eq!(graph.node_count(), 1);
    }

    #[tokio::test]
    async fn relationships_route_through_the_store() {
        let mut graph = KnowledgeGraph::new(agent(), GraphConfig::default());
        let mut wm = WorkingMemory::new(agent(), Default::default());
        let mut history = ReflectionHistory::new();
        let cfg = ReflectionConfig::default();
        let store = InMemoryRelationshipStore::new();

        let body = json!({"relationships": [{"name": "Alice", "data": {"trust": 0.8}}]}).to_string();
        let llm = MockLlmProvider::canned(body);
        let outcome =
            deep_reflect(&agent(), &mut graph, &mut wm, &mut history, &cfg, &llm, Some(&store), DeepReflectInputs::default()).await;
        let ReflectOutcome::Ok { counts } = outcome else { panic!("expected Ok") };
        assert_eq!(counts.relationships, 1);
        assert!(store.get_by_name(&agent(), "Alice").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn llm_failure_mutates_nothing_and_surfaces_as_error() {
        let mut graph = KnowledgeGraph::new(agent(), GraphConfig::default());
        let mut wm = WorkingMemory::new(agent(), Default::default());
        wm.add_goal(GI { description: "untouched".to_string(), ..Default::default() });
        let mut history = ReflectionHistory::new();
        let cfg = ReflectionConfig::default();

        let outcome = deep_reflect(&agent(), &mut graph, &mut wm, &mut history, &cfg, &FailingLlm, None, DeepReflectInputs::default()).await;
        assert!(matches!(outcome, ReflectOutcome::Error { .. }));
        assert_eq!(wm.active_goals().len(), 1);
        assert!(history.records().is_empty());
    }

    #[tokio::test]
    async fn maybe_reflect_respects_the_gate_unless_forced() {
        let mut graph = KnowledgeGraph::new(agent(), GraphConfig::default());
        let mut wm = WorkingMemory::new(agent(), Default::default());
        let mut history = ReflectionHistory::new();
        history.push(ReflectionRecord { at: Utc::now(), duration_ms: 1, counts: UpdateCounts::default() });
        let cfg = ReflectionConfig::default();
        let llm = MockLlmProvider::canned("{}");

        let outcome =
            maybe_reflect(&agent(), &mut graph, &mut wm, &mut history, &cfg, &llm, None, DeepReflectInputs::default(), DeepReflectOpts::default())
                .await;
        assert_eq!(outcome, ReflectOutcome::Skipped);

        let outcome = maybe_reflect(
            &agent(),
            &mut graph,
            &mut wm,
            &mut history,
            &cfg,
            &llm,
            None,
            DeepReflectInputs::default(),
            DeepReflectOpts { force: true },
        )
        .await;
        assert!(matches!(outcome, ReflectOutcome::Ok { .. }));
    }
}
