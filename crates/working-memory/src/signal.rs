//! Applies bus signals to working memory via `apply_memory_event` and
//! `rebuild_from_long_term`. Working memory's behaviour is driven by the
//! signals it consumes, not by its mutator API — this module is the
//! canonical translation from signal to mutation.

use cogmem_core::{Signal, SignalBus, SignalType};

use crate::memory::WorkingMemory;

impl WorkingMemory {
    /// Mutates `self` per the signal taxonomy. Unknown event types
    /// (`SignalType::Other`) leave state unchanged.
    pub fn apply_memory_event(&mut self, signal: &Signal) {
        match signal.kind() {
            SignalType::IdentityChange => {
                if let Some(name) = signal.data.get("name").and_then(|v| v.as_str()) {
                    self.set_name(Some(name.to_string()));
                }
            }
            SignalType::ThoughtRecorded => {
                let content = signal
                    .data
                    .get("thought_preview")
                    .or_else(|| signal.data.get("content"))
                    .and_then(|v| v.as_str());
                if let Some(content) = content {
                    self.add_thought(content);
                }
            }
            SignalType::Goal => {
                let event_type = signal.data.get("event_type").and_then(|v| v.as_str());
                let description = signal.data.get("description").and_then(|v| v.as_str());
                match (event_type, description) {
                    (Some("added"), Some(desc)) => {
                        self.add_goal(desc);
                    }
                    (Some("achieved"), Some(desc)) => {
                        if let Some(id) = self.find_goal_id_by_description(desc) {
                            let _ = self.complete_goal(&id);
                        }
                    }
                    (Some("abandoned"), Some(desc)) => {
                        if let Some(id) = self.find_goal_id_by_description(desc) {
                            let _ = self.abandon_goal(&id);
                        }
                    }
                    _ => {}
                }
            }
            SignalType::RelationshipChanged => {
                let human = signal.data.get("human_name").and_then(|v| v.as_str()).map(String::from);
                let context = signal.data.get("context").and_then(|v| v.as_str()).map(String::from);
                self.set_relationship(human, context);
            }
            SignalType::EngagementChanged => {
                if let Some(level) = signal.data.get("level").and_then(|v| v.as_f64()) {
                    self.set_engagement_level(level);
                }
            }
            SignalType::ConcernAdded => {
                if let Some(c) = signal.data.get("content").and_then(|v| v.as_str()) {
                    self.add_concern(c);
                }
            }
            SignalType::ConcernResolved => {
                if let Some(c) = signal.data.get("content").and_then(|v| v.as_str()) {
                    self.resolve_concern(c);
                }
            }
            SignalType::CuriosityAdded => {
                if let Some(c) = signal.data.get("content").and_then(|v| v.as_str()) {
                    self.add_curiosity(c);
                }
            }
            SignalType::CuriositySatisfied => {
                if let Some(c) = signal.data.get("content").and_then(|v| v.as_str()) {
                    self.satisfy_curiosity(c);
                }
            }
            SignalType::ConversationChanged => {
                let conv = signal.data.get("conversation").and_then(|v| v.as_str()).map(String::from);
                self.set_conversation(conv);
            }
            SignalType::Other => {}
        }
    }

    fn find_goal_id_by_description(&self, desc: &str) -> Option<cogmem_core::GoalId> {
        self.active_goals().iter().find(|g| g.description == desc).map(|g| g.id.clone())
    }

    /// Replays every persisted signal for this agent from `bus`, in order.
    /// When the bus has nothing recorded, `self` is returned unchanged.
    pub async fn rebuild_from_long_term(mut self, bus: &dyn SignalBus) -> Self {
        let signals = bus.replay(&self.agent_id).await;
        for signal in &signals {
            self.apply_memory_event(signal);
        }
        self
    }
}
