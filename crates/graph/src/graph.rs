//! The knowledge graph: nodes, edges, decay, dedup, active set, and the
//! token-budgeted selection algorithm.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use cogmem_config::GraphConfig;
use cogmem_core::error::GraphError;
use cogmem_core::{AgentId, NodeId};
use cogmem_tokens::{estimate_tokens, BudgetSpec};

use crate::edge::{AddEdgeOpts, Edge};
use crate::node::{Node, NodeSpec, NodeType, DEFAULT_CONFIDENCE, DEFAULT_RELEVANCE};
use crate::pending::{PendingCandidate, PendingKind};

/// Options for [`KnowledgeGraph::apply_decay`].
#[derive(Debug, Clone, Default)]
pub struct DecayOpts {
    pub pinned_ids: Vec<NodeId>,
}

/// Options for [`KnowledgeGraph::decay_and_archive`].
#[derive(Debug, Clone, Default)]
pub struct DecayArchiveOpts {
    pub force: bool,
    pub pinned_ids: Vec<NodeId>,
}

/// Filters shared by `recall` / `search_by_name` / `semantic_search`.
#[derive(Debug, Clone, Default)]
pub struct RecallOpts {
    pub node_type: Option<NodeType>,
    pub types: Vec<NodeType>,
    pub min_relevance: Option<f64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct CascadeOpts {
    pub max_depth: usize,
    pub decay_factor: f64,
    pub min_boost: f64,
}

#[derive(Debug, Clone, Default)]
pub struct FindRelatedOpts {
    pub max_depth: Option<usize>,
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ActiveSetOpts {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PromptOpts {
    pub include_relationships: bool,
    pub limit: Option<usize>,
    /// Overrides the model context size `max_tokens` (when it's a
    /// percentage/min-max spec) resolves against. Defaults to
    /// [`cogmem_tokens::DEFAULT_MODEL_CONTEXT`].
    pub model_context: Option<u64>,
}

/// The per-agent knowledge graph. Owned exclusively by one agent; no
/// operation here ever reads or writes another agent's state.
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    pub agent_id: AgentId,
    pub(crate) nodes: HashMap<NodeId, Node>,
    /// Edges keyed by source id: a dense node table plus a secondary edge
    /// index, rather than edges embedded inline on each node.
    pub(crate) edges: HashMap<NodeId, Vec<Edge>>,
    pub(crate) active_set: Vec<NodeId>,
    pub config: GraphConfig,
    pub max_tokens: Option<BudgetSpec>,
    pub type_quotas: HashMap<NodeType, f64>,
    pub(crate) last_decay_at: Option<DateTime<Utc>>,
    pub(crate) pending_facts: Vec<PendingCandidate>,
    pub(crate) pending_learnings: Vec<PendingCandidate>,
}

impl KnowledgeGraph {
    pub fn new(agent_id: AgentId, config: GraphConfig) -> Self {
        Self {
            agent_id,
            nodes: HashMap::new(),
            edges: HashMap::new(),
            active_set: Vec::new(),
            config,
            max_tokens: None,
            type_quotas: HashMap::new(),
            last_decay_at: None,
            pending_facts: Vec::new(),
            pending_learnings: Vec::new(),
        }
    }

    pub fn last_decay_at(&self) -> Option<DateTime<Utc>> {
        self.last_decay_at
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn count_of_type(&self, t: NodeType) -> usize {
        self.nodes.values().filter(|n| n.node_type == t).count()
    }

    // ── Node CRUD ────────────────────────────────────────────────────────

    pub fn add_node(&mut self, spec: NodeSpec) -> Result<NodeId, GraphError> {
        let type_str = spec.node_type.as_deref().ok_or(GraphError::MissingType)?;
        let node_type = NodeType::parse(type_str).ok_or_else(|| GraphError::InvalidType(type_str.to_string()))?;
        let content = spec.content.clone().ok_or(GraphError::MissingContent)?;
        if content.is_empty() {
            return Err(GraphError::MissingContent);
        }

        if !spec.skip_dedup {
            if let Some(existing_id) = self.find_dedup_match(node_type, &content) {
                let node = self.nodes.get_mut(&existing_id).expect("dedup match must exist");
                node.boost_relevance(0.1);
                return Ok(existing_id);
            }
        }

        if self.count_of_type(node_type) >= self.config.max_nodes_per_type {
            return Err(GraphError::QuotaExceeded(node_type.as_str().to_string()));
        }

        let id = NodeId::generate();
        let relevance = spec.relevance.unwrap_or(DEFAULT_RELEVANCE).clamp(0.01, 1.0);
        let confidence = spec.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0);
        let cached_tokens = estimate_tokens(&content);
        let node = Node {
            id: id.clone(),
            node_type,
            content,
            relevance,
            confidence,
            access_count: 0,
            last_accessed: Utc::now(),
            pinned: spec.pinned,
            metadata: spec.metadata,
            embedding: spec.embedding,
            cached_tokens,
        };
        self.nodes.insert(id.clone(), node);
        self.enter_active_set(id.clone());
        tracing::debug!(agent_id = %self.agent_id, node_id = %id, node_type = node_type.as_str(), "node added");
        Ok(id)
    }

    fn find_dedup_match(&self, node_type: NodeType, content: &str) -> Option<NodeId> {
        let lower = content.to_lowercase();
        self.nodes
            .values()
            .find(|n| n.node_type == node_type && n.content.to_lowercase() == lower)
            .map(|n| n.id.clone())
    }

    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship: impl Into<String>,
        opts: AddEdgeOpts,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains_key(source) {
            return Err(GraphError::EdgeEndpointNotFound(source.clone()));
        }
        if !self.nodes.contains_key(target) {
            return Err(GraphError::EdgeEndpointNotFound(target.clone()));
        }
        let relationship = relationship.into();
        let edges = self.edges.entry(source.clone()).or_default();
        if let Some(existing) = edges
            .iter_mut()
            .find(|e| &e.target == target && e.relationship == relationship)
        {
            existing.merge();
            return Ok(());
        }
        edges.push(Edge::new(
            source.clone(),
            target.clone(),
            relationship,
            opts.strength.unwrap_or(1.0),
        ));
        Ok(())
    }

    pub fn edges_from(&self, id: &NodeId) -> &[Edge] {
        self.edges.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn edges_to(&self, id: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .flat_map(|v| v.iter())
            .filter(|e| &e.target == id)
            .collect()
    }

    pub fn reinforce(&mut self, id: &NodeId) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        node.access_count += 1;
        node.boost_relevance(0.1);
        node.last_accessed = Utc::now();
        self.enter_active_set(id.clone());
        Ok(())
    }

    pub fn boost_node(&mut self, id: &NodeId, delta: f64) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(id).ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        node.boost_relevance(delta);
        Ok(())
    }

    // ── Active set ───────────────────────────────────────────────────────

    fn enter_active_set(&mut self, id: NodeId) {
        self.active_set.retain(|x| x != &id);
        self.active_set.push(id);
        self.refresh_active_set();
    }

    /// Trims the active set to `max_active`, evicting the lowest-relevance
    /// member (ties broken by oldest `last_accessed`) and dropping any id
    /// whose node no longer exists.
    fn refresh_active_set(&mut self) {
        self.active_set.retain(|id| self.nodes.contains_key(id));
        while self.active_set.len() > self.config.max_active {
            let evict = self
                .active_set
                .iter()
                .min_by(|a, b| {
                    let na = &self.nodes[*a];
                    let nb = &self.nodes[*b];
                    na.relevance
                        .partial_cmp(&nb.relevance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(na.last_accessed.cmp(&nb.last_accessed))
                })
                .cloned();
            match evict {
                Some(id) => self.active_set.retain(|x| x != &id),
                None => break,
            }
        }
    }

    pub fn active_set(&self, opts: ActiveSetOpts) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.active_set.iter().filter_map(|id| self.nodes.get(id)).collect();
        nodes.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(limit) = opts.limit {
            nodes.truncate(limit);
        }
        nodes
    }

    pub fn total_tokens(&self) -> usize {
        self.nodes.values().map(|n| n.cached_tokens).sum()
    }

    pub fn active_set_tokens(&self) -> usize {
        self.active_set
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|n| n.cached_tokens)
            .sum()
    }

    /// The active set, narrowed by `self.max_tokens`/`self.type_quotas` via
    /// [`Self::select_by_token_budget`] when a budget is configured. This is
    /// what rendering callers (`to_prompt_text`) walk instead of the raw,
    /// unbounded active set — the budgeted selection is the path every
    /// prompt-facing render goes through.
    pub fn budgeted_active_set(&self, opts: &PromptOpts) -> Vec<&Node> {
        let active = self.active_set(ActiveSetOpts { limit: opts.limit });
        let Some(spec) = self.max_tokens else {
            return active;
        };
        let model_context = opts.model_context.unwrap_or(cogmem_tokens::DEFAULT_MODEL_CONTEXT as u64);
        let budget = cogmem_tokens::resolve_budget(spec, model_context);
        Self::select_by_token_budget(&active, budget, &self.type_quotas)
    }

    /// The token-budgeted selection algorithm: a stable, relevance-ordered
    /// prefix pass that respects per-type quotas.
    pub fn select_by_token_budget<'a>(
        nodes: &[&'a Node],
        budget: u64,
        quotas: &HashMap<NodeType, f64>,
    ) -> Vec<&'a Node> {
        let mut per_type_used: HashMap<NodeType, u64> = HashMap::new();
        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for &node in nodes {
            let cap = quotas
                .get(&node.node_type)
                .map(|frac| (frac * budget as f64) as u64)
                .unwrap_or(u64::MAX);
            let used = *per_type_used.get(&node.node_type).unwrap_or(&0);
            let cost = node.cached_tokens as u64;
            if used + cost > cap {
                continue;
            }
            if total + cost > budget {
                continue;
            }
            selected.push(node);
            *per_type_used.entry(node.node_type).or_insert(0) += cost;
            total += cost;
        }
        selected
    }

    // ── Decay / prune ────────────────────────────────────────────────────

    pub fn apply_decay(&mut self, opts: DecayOpts) {
        let now = Utc::now();
        let protected: HashSet<NodeId> = opts.pinned_ids.into_iter().collect();
        for node in self.nodes.values_mut() {
            if node.pinned || protected.contains(&node.id) {
                continue;
            }
            let days = (now - node.last_accessed).num_seconds() as f64 / 86_400.0;
            let decayed = node.relevance * (-self.config.decay_rate * days.max(0.0)).exp();
            node.relevance = decayed.max(0.01);
        }
        self.last_decay_at = Some(now);
        self.refresh_active_set();
        tracing::debug!(agent_id = %self.agent_id, nodes = self.nodes.len(), "decay applied");
    }

    pub fn prune_and_archive(&mut self, threshold: Option<f64>) -> usize {
        let threshold = threshold.unwrap_or(self.config.prune_threshold);
        let doomed: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| !n.pinned && n.relevance < threshold)
            .map(|n| n.id.clone())
            .collect();
        for id in &doomed {
            self.nodes.remove(id);
            self.edges.remove(id);
        }
        for edges in self.edges.values_mut() {
            edges.retain(|e| !doomed.contains(&e.target));
        }
        self.active_set.retain(|id| !doomed.contains(id));
        tracing::debug!(agent_id = %self.agent_id, pruned = doomed.len(), threshold, "prune complete");
        doomed.len()
    }

    fn is_over_capacity(&self) -> bool {
        NodeType::ALL
            .iter()
            .any(|t| self.count_of_type(*t) >= self.config.max_nodes_per_type)
            || self.active_set.len() > self.config.max_active
    }

    pub fn decay_and_archive(&mut self, opts: DecayArchiveOpts) -> Option<usize> {
        if !opts.force && !self.is_over_capacity() {
            return None;
        }
        self.apply_decay(DecayOpts { pinned_ids: opts.pinned_ids });
        Some(self.prune_and_archive(None))
    }

    // ── Recall ───────────────────────────────────────────────────────────

    fn matches_filters(node: &Node, opts: &RecallOpts) -> bool {
        if let Some(t) = opts.node_type {
            if node.node_type != t {
                return false;
            }
        }
        if !opts.types.is_empty() && !opts.types.contains(&node.node_type) {
            return false;
        }
        if let Some(min) = opts.min_relevance {
            if node.relevance < min {
                return false;
            }
        }
        true
    }

    fn sorted_matches(&self, mut matches: Vec<&Node>, limit: Option<usize>) -> Vec<&Node> {
        matches.sort_by(|a, b| b.relevance.partial_cmp(&a.relevance).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(limit) = limit {
            matches.truncate(limit);
        }
        matches
    }

    pub fn recall(&self, query: &str, opts: RecallOpts) -> Vec<&Node> {
        let q = query.to_lowercase();
        let limit = opts.limit;
        let matches: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.content.to_lowercase().contains(&q) && Self::matches_filters(n, &opts))
            .collect();
        self.sorted_matches(matches, limit)
    }

    pub fn search_by_name(&self, query: &str) -> Vec<&Node> {
        self.recall(query, RecallOpts::default())
    }

    /// Content-match search. An embedding-backed implementation could
    /// override scoring here while preserving these same filters; this
    /// reference implementation keeps substring matching.
    pub fn semantic_search(&self, query: &str, opts: RecallOpts) -> Vec<&Node> {
        self.recall(query, opts)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        let lower = name.to_lowercase();
        self.nodes.values().find(|n| n.content.to_lowercase() == lower)
    }

    pub fn find_by_type(&self, node_type: NodeType, limit: Option<usize>) -> Vec<&Node> {
        let matches: Vec<&Node> = self.nodes.values().filter(|n| n.node_type == node_type).collect();
        self.sorted_matches(matches, limit)
    }

    pub fn find_by_type_and_criteria(
        &self,
        node_type: NodeType,
        min_relevance: f64,
        limit: Option<usize>,
    ) -> Vec<&Node> {
        let matches: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.node_type == node_type && n.relevance >= min_relevance)
            .collect();
        self.sorted_matches(matches, limit)
    }

    pub fn recent_nodes(&self, limit: usize) -> Vec<&Node> {
        let mut nodes: Vec<&Node> = self.nodes.values().collect();
        nodes.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        nodes.truncate(limit);
        nodes
    }

    pub fn get_tool_learnings(&self, tool_name: &str, limit: usize) -> Vec<&Node> {
        let matches: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| {
                n.node_type == NodeType::Skill
                    && n.metadata.get("tool_name").and_then(|v| v.as_str()) == Some(tool_name)
            })
            .collect();
        self.sorted_matches(matches, Some(limit))
    }

    // ── Graph traversal ──────────────────────────────────────────────────

    pub fn cascade_recall(
        &mut self,
        start_id: &NodeId,
        boost: f64,
        opts: CascadeOpts,
    ) -> Result<Vec<NodeId>, GraphError> {
        if !self.nodes.contains_key(start_id) {
            return Err(GraphError::NodeNotFound(start_id.clone()));
        }
        let mut affected = Vec::new();
        self.boost_node(start_id, boost)?;
        affected.push(start_id.clone());

        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(start_id.clone());
        let mut frontier: Vec<NodeId> = vec![start_id.clone()];

        for depth in 1..=opts.max_depth {
            let amount = boost * opts.decay_factor.powi(depth as i32 - 1);
            if amount < opts.min_boost {
                break;
            }
            let mut next_frontier = Vec::new();
            for node_id in &frontier {
                for edge in self.edges_from(node_id).to_vec() {
                    if visited.contains(&edge.target) {
                        continue;
                    }
                    visited.insert(edge.target.clone());
                    next_frontier.push(edge.target.clone());
                }
            }
            for id in &next_frontier {
                self.boost_node(id, amount)?;
                affected.push(id.clone());
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        Ok(affected)
    }

    pub fn find_related(&self, id: &NodeId, opts: FindRelatedOpts) -> Result<Vec<&Node>, GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::NodeNotFound(id.clone()));
        }
        let max_depth = opts.max_depth.unwrap_or(self.config.cascade_max_depth);
        let mut visited: HashSet<NodeId> = HashSet::new();
        visited.insert(id.clone());
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((id.clone(), 0));
        let mut found: Vec<&Node> = Vec::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for edge in self.edges_from(&current) {
                if let Some(rel) = &opts.relationship {
                    if &edge.relationship != rel {
                        continue;
                    }
                }
                if visited.contains(&edge.target) {
                    continue;
                }
                visited.insert(edge.target.clone());
                if let Some(node) = self.nodes.get(&edge.target) {
                    found.push(node);
                }
                queue.push_back((edge.target.clone(), depth + 1));
            }
        }
        Ok(self.sorted_matches(found, None))
    }

    // ── Pending queues ───────────────────────────────────────────────────

    pub fn add_pending_fact(&mut self, content: impl Into<String>, confidence: f64) -> String {
        let id = format!("pend_{}", uuid::Uuid::new_v4().simple());
        self.pending_facts.push(PendingCandidate::new(id.clone(), content, confidence));
        id
    }

    pub fn add_pending_learning(&mut self, content: impl Into<String>, confidence: f64) -> String {
        let id = format!("pend_{}", uuid::Uuid::new_v4().simple());
        self.pending_learnings
            .push(PendingCandidate::new(id.clone(), content, confidence));
        id
    }

    pub fn get_pending_facts(&self) -> &[PendingCandidate] {
        &self.pending_facts
    }

    pub fn get_pending_learnings(&self) -> &[PendingCandidate] {
        &self.pending_learnings
    }

    fn queue_mut(&mut self, kind: PendingKind) -> &mut Vec<PendingCandidate> {
        match kind {
            PendingKind::Fact => &mut self.pending_facts,
            PendingKind::Learning => &mut self.pending_learnings,
        }
    }

    pub fn approve_pending(&mut self, kind: PendingKind, id: &str) -> Result<NodeId, GraphError> {
        let queue = self.queue_mut(kind);
        let pos = queue
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| GraphError::NodeNotFound(NodeId::from_raw(id)))?;
        let candidate = queue.remove(pos);
        let node_type = match kind {
            PendingKind::Fact => "fact",
            PendingKind::Learning => "skill",
        };
        let mut spec = NodeSpec::new(node_type, candidate.content).with_confidence(candidate.confidence);
        spec.metadata = candidate.metadata;
        self.add_node(spec)
    }

    pub fn reject_pending(&mut self, kind: PendingKind, id: &str) -> Result<(), GraphError> {
        let queue = self.queue_mut(kind);
        let before = queue.len();
        queue.retain(|c| c.id != id);
        if queue.len() == before {
            return Err(GraphError::NodeNotFound(NodeId::from_raw(id)));
        }
        Ok(())
    }

    pub fn approve_all_facts(&mut self) -> Vec<NodeId> {
        let ids: Vec<String> = self.pending_facts.iter().map(|c| c.id.clone()).collect();
        ids.into_iter()
            .filter_map(|id| self.approve_pending(PendingKind::Fact, &id).ok())
            .collect()
    }

    pub fn approve_all_learnings(&mut self) -> Vec<NodeId> {
        let ids: Vec<String> = self.pending_learnings.iter().map(|c| c.id.clone()).collect();
        ids.into_iter()
            .filter_map(|id| self.approve_pending(PendingKind::Learning, &id).ok())
            .collect()
    }
}

impl NodeType {
    pub const ALL: [NodeType; 9] = [
        NodeType::Fact,
        NodeType::Experience,
        NodeType::Skill,
        NodeType::Insight,
        NodeType::Relationship,
        NodeType::Observation,
        NodeType::Trait,
        NodeType::Goal,
        NodeType::Intention,
    ];
}

impl Default for CascadeOpts {
    fn default() -> Self {
        Self {
            max_depth: 3,
            decay_factor: 0.5,
            min_boost: 0.01,
        }
    }
}
