//! The working memory itself: thoughts, goals, concerns, curiosity, and
//! engagement level.

use chrono::{DateTime, Utc};
use cogmem_config::WorkingMemoryConfig;
use cogmem_core::error::WorkingMemoryError;
use cogmem_core::{AgentId, GoalId};
use cogmem_tokens::{estimate_tokens, resolve_budget, BudgetSpec, DEFAULT_MODEL_CONTEXT};

use crate::goal::{Goal, GoalInput};
use crate::thought::{Thought, ThoughtInput};

pub const CURRENT_SCHEMA_VERSION: u32 = 3;

#[derive(Debug, Clone, Default)]
pub struct WorkingMemoryOpts {
    pub name: Option<String>,
    pub max_thoughts: Option<usize>,
    pub max_tokens: Option<BudgetSpec>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WorkingMemory {
    pub agent_id: AgentId,
    pub version: u32,
    pub name: Option<String>,
    pub current_human: Option<String>,
    pub current_conversation: Option<String>,
    pub relationship_context: Option<String>,
    pub(crate) recent_thoughts: Vec<Thought>,
    pub(crate) active_goals: Vec<Goal>,
    pub(crate) concerns: Vec<String>,
    pub(crate) curiosity: Vec<String>,
    pub engagement_level: f64,
    pub thought_count: u64,
    pub started_at: DateTime<Utc>,
    pub last_consolidated_at: Option<DateTime<Utc>>,
    pub max_thoughts: usize,
    pub max_tokens: Option<BudgetSpec>,
    pub model: Option<String>,
}

impl WorkingMemory {
    pub fn new(agent_id: AgentId, opts: WorkingMemoryOpts) -> Self {
        Self {
            agent_id,
            version: CURRENT_SCHEMA_VERSION,
            name: opts.name,
            current_human: None,
            current_conversation: None,
            relationship_context: None,
            recent_thoughts: Vec::new(),
            active_goals: Vec::new(),
            concerns: Vec::new(),
            curiosity: Vec::new(),
            engagement_level: 0.5,
            thought_count: 0,
            started_at: Utc::now(),
            last_consolidated_at: None,
            max_thoughts: opts.max_thoughts.unwrap_or_else(default_max_thoughts),
            max_tokens: opts.max_tokens,
            model: opts.model,
        }
    }

    pub fn from_config(agent_id: AgentId, cfg: &WorkingMemoryConfig) -> Self {
        Self::new(
            agent_id,
            WorkingMemoryOpts {
                max_thoughts: Some(cfg.max_thoughts),
                max_tokens: cfg.max_tokens.map(BudgetSpec::fixed),
                ..Default::default()
            },
        )
    }

    pub fn recent_thoughts(&self) -> &[Thought] {
        &self.recent_thoughts
    }

    pub fn active_goals(&self) -> &[Goal] {
        &self.active_goals
    }

    pub fn concerns(&self) -> &[String] {
        &self.concerns
    }

    pub fn curiosity(&self) -> &[String] {
        &self.curiosity
    }

    // ── Thoughts ─────────────────────────────────────────────────────────

    pub fn add_thought(&mut self, input: impl Into<ThoughtInput>) {
        let thought: Thought = input.into().into();
        self.recent_thoughts.insert(0, thought);
        self.thought_count += 1;
        self.enforce_thought_bounds();
    }

    fn thought_tokens(&self) -> usize {
        self.recent_thoughts.iter().map(|t| t.cached_tokens).sum()
    }

    fn enforce_thought_bounds(&mut self) {
        while self.recent_thoughts.len() > self.max_thoughts {
            self.recent_thoughts.pop();
        }
        if let Some(spec) = self.max_tokens {
            let budget = resolve_budget(spec, DEFAULT_MODEL_CONTEXT as u64) as usize;
            while self.thought_tokens() > budget && !self.recent_thoughts.is_empty() {
                self.recent_thoughts.pop();
            }
        }
    }

    pub fn trim_to_budget(&mut self, budget: BudgetSpec, model_context: u64) {
        let limit = resolve_budget(budget, model_context) as usize;
        while self.thought_tokens() > limit && !self.recent_thoughts.is_empty() {
            self.recent_thoughts.pop();
        }
    }

    // ── Goals ────────────────────────────────────────────────────────────

    pub fn set_goals(&mut self, goals: impl IntoIterator<Item = GoalInput>) {
        self.active_goals = goals.into_iter().map(Goal::from).collect();
    }

    pub fn add_goal(&mut self, input: impl Into<GoalInput>) -> GoalId {
        let input = input.into();
        let existing_id = input.id.clone();
        let goal: Goal = input.into();
        let id = goal.id.clone();
        if let Some(wanted) = existing_id {
            if let Some(slot) = self.active_goals.iter_mut().find(|g| g.id == wanted) {
                *slot = goal;
                return wanted;
            }
        }
        self.active_goals.push(goal);
        id
    }

    pub fn remove_goal(&mut self, id: &GoalId) -> Result<(), WorkingMemoryError> {
        let before = self.active_goals.len();
        self.active_goals.retain(|g| &g.id != id);
        if self.active_goals.len() == before {
            return Err(WorkingMemoryError::GoalNotFound(id.as_str().to_string()));
        }
        Ok(())
    }

    pub fn complete_goal(&mut self, id: &GoalId) -> Result<(), WorkingMemoryError> {
        let pos = self
            .active_goals
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| WorkingMemoryError::GoalNotFound(id.as_str().to_string()))?;
        let goal = self.active_goals.remove(pos);
        self.add_thought(format!("Completed goal: {}", goal.description));
        Ok(())
    }

    pub fn abandon_goal(&mut self, id: &GoalId) -> Result<(), WorkingMemoryError> {
        let pos = self
            .active_goals
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| WorkingMemoryError::GoalNotFound(id.as_str().to_string()))?;
        let goal = self.active_goals.remove(pos);
        self.add_thought(format!("Abandoned goal: {}", goal.description));
        Ok(())
    }

    pub fn update_goal_progress(&mut self, id: &GoalId, progress: i32) -> Result<(), WorkingMemoryError> {
        let goal = self
            .active_goals
            .iter_mut()
            .find(|g| &g.id == id)
            .ok_or_else(|| WorkingMemoryError::GoalNotFound(id.as_str().to_string()))?;
        goal.progress = progress.clamp(0, 100) as u8;
        Ok(())
    }

    // ── Identity / relationship setters ─────────────────────────────────

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_current_human(&mut self, human: Option<String>) {
        self.current_human = human;
    }

    pub fn set_relationship_context(&mut self, context: Option<String>) {
        self.relationship_context = context;
    }

    pub fn set_relationship(&mut self, human: Option<String>, context: Option<String>) {
        self.current_human = human;
        self.relationship_context = context;
    }

    pub fn set_conversation(&mut self, conversation: Option<String>) {
        self.current_conversation = conversation;
    }

    // ── Concerns / curiosity ─────────────────────────────────────────────

    pub fn add_concern(&mut self, concern: impl Into<String>) {
        let concern = concern.into();
        if !self.concerns.contains(&concern) {
            self.concerns.push(concern);
        }
    }

    pub fn resolve_concern(&mut self, concern: &str) {
        self.concerns.retain(|c| c != concern);
    }

    pub fn add_curiosity(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        if !self.curiosity.contains(&topic) {
            self.curiosity.push(topic);
        }
    }

    pub fn satisfy_curiosity(&mut self, topic: &str) {
        self.curiosity.retain(|c| c != topic);
    }

    // ── Engagement ───────────────────────────────────────────────────────

    pub fn set_engagement_level(&mut self, level: f64) {
        self.engagement_level = level.clamp(0.0, 1.0);
    }

    pub fn adjust_engagement(&mut self, delta: f64) {
        self.engagement_level = (self.engagement_level + delta).clamp(0.0, 1.0);
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub fn mark_consolidated(&mut self) {
        self.last_consolidated_at = Some(Utc::now());
    }

    pub fn uptime(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds().max(0)
    }

    pub fn stats(&self) -> WorkingMemoryStats {
        WorkingMemoryStats {
            thought_count: self.thought_count,
            recent_thought_count: self.recent_thoughts.len(),
            active_goal_count: self.active_goals.len(),
            concern_count: self.concerns.len(),
            curiosity_count: self.curiosity.len(),
            estimated_tokens: self.thought_tokens(),
            engagement_level: self.engagement_level,
            uptime_seconds: self.uptime(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkingMemoryStats {
    pub thought_count: u64,
    pub recent_thought_count: usize,
    pub active_goal_count: usize,
    pub concern_count: usize,
    pub curiosity_count: usize,
    pub estimated_tokens: usize,
    pub engagement_level: f64,
    pub uptime_seconds: i64,
}

fn default_max_thoughts() -> usize {
    200
}

/// Cheap text-length estimate used by `stats`/trimming paths that don't
/// already have a [`Thought`]'s cached token count on hand.
pub fn estimate(text: &str) -> usize {
    estimate_tokens(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wm() -> WorkingMemory {
        WorkingMemory::new(AgentId::from("a1"), WorkingMemoryOpts::default())
    }

    #[test]
    fn new_working_memory_has_spec_defaults() {
        let w = wm();
        assert_eq!(w.engagement_level, 0.5);
        assert_eq!(w.thought_count, 0);
        assert!(w.recent_thoughts.is_empty());
        assert_eq!(w.version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn add_thought_prepends_newest_first() {
        let mut w = wm();
        w.add_thought("first");
        w.add_thought("second");
        assert_eq!(w.recent_thoughts[0].content, "second");
        assert_eq!(w.recent_thoughts[1].content, "first");
        assert_eq!(w.thought_count, 2);
    }

    #[test]
    fn add_thought_bounds_by_max_thoughts() {
        let mut w = WorkingMemory::new(
            AgentId::from("a1"),
            WorkingMemoryOpts { max_thoughts: Some(2), ..Default::default() },
        );
        w.add_thought("a");
        w.add_thought("b");
        w.add_thought("c");
        assert_eq!(w.recent_thoughts.len(), 2);
        assert_eq!(w.recent_thoughts[0].content, "c");
        assert_eq!(w.thought_count, 3);
    }

    #[test]
    fn goal_wrapping_and_progress_clamp() {
        let mut w = wm();
        let id = w.add_goal("Learn Rust");
        w.update_goal_progress(&id, 150).unwrap();
        assert_eq!(w.active_goals[0].progress, 100);
        w.update_goal_progress(&id, -10).unwrap();
        assert_eq!(w.active_goals[0].progress, 0);
    }

    #[test]
    fn complete_goal_records_audit_thought() {
        let mut w = wm();
        let id = w.add_goal("Ship the release");
        w.complete_goal(&id).unwrap();
        assert!(w.active_goals.is_empty());
        assert_eq!(w.recent_thoughts[0].content, "Completed goal: Ship the release");
    }

    #[test]
    fn abandon_goal_records_audit_thought() {
        let mut w = wm();
        let id = w.add_goal("Rewrite in another language");
        w.abandon_goal(&id).unwrap();
        assert_eq!(w.recent_thoughts[0].content, "Abandoned goal: Rewrite in another language");
    }

    #[test]
    fn concerns_and_curiosity_are_deduped() {
        let mut w = wm();
        w.add_concern("disk space");
        w.add_concern("disk space");
        assert_eq!(w.concerns.len(), 1);
        w.resolve_concern("disk space");
        assert!(w.concerns.is_empty());

        w.add_curiosity("rust async");
        w.add_curiosity("rust async");
        assert_eq!(w.curiosity.len(), 1);
        w.satisfy_curiosity("rust async");
        assert!(w.curiosity.is_empty());
    }

    #[test]
    fn engagement_level_clamps() {
        let mut w = wm();
        w.set_engagement_level(5.0);
        assert_eq!(w.engagement_level, 1.0);
        w.set_engagement_level(-5.0);
        assert_eq!(w.engagement_level, 0.0);
        w.adjust_engagement(0.3);
        assert_eq!(w.engagement_level, 0.3);
    }

    #[test]
    fn mark_consolidated_sets_timestamp() {
        let mut w = wm();
        assert!(w.last_consolidated_at.is_none());
        w.mark_consolidated();
        assert!(w.last_consolidated_at.is_some());
    }

    #[test]
    fn uptime_is_non_negative() {
        let w = wm();
        assert!(w.uptime() >= 0);
    }
}
