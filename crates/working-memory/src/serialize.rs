//! Versioned `serialize`/`deserialize`. v1 stored `recent_thoughts` and
//! `active_goals` as plain strings; v2 introduced structured thought
//! records; v3 (current) adds `referenced_date` and goal `progress`/`type`/
//! `priority`. `deserialize` accepts any of the three and migrates forward.

use cogmem_core::{AgentId, GoalId};
use serde_json::{json, Value};

use crate::goal::Goal;
use crate::memory::{WorkingMemory, WorkingMemoryOpts, CURRENT_SCHEMA_VERSION};
use crate::thought::Thought;

impl WorkingMemory {
    pub fn serialize(&self) -> Value {
        json!({
            "version": CURRENT_SCHEMA_VERSION,
            "agent_id": self.agent_id.as_str(),
            "name": self.name,
            "current_human": self.current_human,
            "current_conversation": self.current_conversation,
            "relationship_context": self.relationship_context,
            "recent_thoughts": self.recent_thoughts,
            "active_goals": self.active_goals,
            "concerns": self.concerns,
            "curiosity": self.curiosity,
            "engagement_level": self.engagement_level,
            "thought_count": self.thought_count,
            "started_at": self.started_at,
            "last_consolidated_at": self.last_consolidated_at,
            "max_thoughts": self.max_thoughts,
            "model": self.model,
        })
    }

    pub fn deserialize(value: &Value) -> Self {
        let version = value.get("version").and_then(|v| v.as_u64()).unwrap_or(1) as u32;
        let agent_id = value
            .get("agent_id")
            .and_then(|v| v.as_str())
            .map(AgentId::from)
            .unwrap_or_else(|| AgentId::from("unknown"));

        let mut wm = WorkingMemory::new(agent_id, WorkingMemoryOpts::default());
        wm.version = CURRENT_SCHEMA_VERSION;
        wm.name = value.get("name").and_then(|v| v.as_str()).map(String::from);
        wm.current_human = value.get("current_human").and_then(|v| v.as_str()).map(String::from);
        wm.current_conversation = value.get("current_conversation").and_then(|v| v.as_str()).map(String::from);
        wm.relationship_context = value.get("relationship_context").and_then(|v| v.as_str()).map(String::from);
        wm.engagement_level = value.get("engagement_level").and_then(|v| v.as_f64()).unwrap_or(0.5);
        wm.thought_count = value.get("thought_count").and_then(|v| v.as_u64()).unwrap_or(0);
        wm.max_thoughts = value.get("max_thoughts").and_then(|v| v.as_u64()).map(|v| v as usize).unwrap_or(wm.max_thoughts);
        wm.model = value.get("model").and_then(|v| v.as_str()).map(String::from);
        if let Some(ts) = value.get("started_at").and_then(|v| serde_json::from_value(v.clone()).ok()) {
            wm.started_at = ts;
        }
        wm.last_consolidated_at = value
            .get("last_consolidated_at")
            .and_then(|v| serde_json::from_value(v.clone()).ok());

        wm.concerns = value
            .get("concerns")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();
        wm.curiosity = value
            .get("curiosity")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        wm.recent_thoughts = match version {
            1 => value
                .get("recent_thoughts")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str()).map(Thought::new).collect())
                .unwrap_or_default(),
            _ => value
                .get("recent_thoughts")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| serde_json::from_value::<Thought>(v.clone()).ok()).collect())
                .unwrap_or_default(),
        };

        wm.active_goals = match version {
            1 => value
                .get("active_goals")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str())
                        .map(|desc| Goal {
                            id: GoalId::generate(),
                            description: desc.to_string(),
                            goal_type: "general".to_string(),
                            priority: "normal".to_string(),
                            progress: 0,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            _ => value
                .get("active_goals")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| serde_json::from_value::<Goal>(v.clone()).ok()).collect())
                .unwrap_or_default(),
        };

        wm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::WorkingMemoryOpts;

    #[test]
    fn current_version_round_trips() {
        let mut w = WorkingMemory::new(AgentId::from("a1"), WorkingMemoryOpts::default());
        w.add_thought("remember this");
        w.add_goal("finish the report");
        w.add_concern("deadline");
        w.set_engagement_level(0.9);

        let value = w.serialize();
        let restored = WorkingMemory::deserialize(&value);

        assert_eq!(restored.agent_id.as_str(), "a1");
        assert_eq!(restored.recent_thoughts().len(), 1);
        assert_eq!(restored.active_goals().len(), 1);
        assert_eq!(restored.concerns().len(), 1);
        assert_eq!(restored.engagement_level, 0.9);
    }

    #[test]
    fn v1_plain_string_thoughts_and_goals_migrate() {
        let legacy = json!({
            "version": 1,
            "agent_id": "legacy-agent",
            "recent_thoughts": ["an old plain thought"],
            "active_goals": ["an old plain goal"],
        });
        let restored = WorkingMemory::deserialize(&legacy);
        assert_eq!(restored.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(restored.recent_thoughts()[0].content, "an old plain thought");
        assert_eq!(restored.active_goals()[0].description, "an old plain goal");
        assert_eq!(restored.active_goals()[0].progress, 0);
    }

    #[test]
    fn missing_fields_fill_defaults() {
        let bare = json!({"agent_id": "a1"});
        let restored = WorkingMemory::deserialize(&bare);
        assert_eq!(restored.engagement_level, 0.5);
        assert!(restored.recent_thoughts().is_empty());
    }
}
