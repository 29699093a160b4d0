//! Active goals tracked by working memory. Goals are identified by `id`,
//! never by list position.

use cogmem_core::GoalId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub description: String,
    #[serde(default = "default_goal_type")]
    pub goal_type: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default)]
    pub progress: u8,
}

fn default_goal_type() -> String {
    "general".to_string()
}

fn default_priority() -> String {
    "normal".to_string()
}

impl Goal {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: GoalId::generate(),
            description: description.into(),
            goal_type: default_goal_type(),
            priority: default_priority(),
            progress: 0,
        }
    }
}

/// Input to `add_goal`/`set_goals`: bare text wraps into a default-shaped
/// goal; a full [`GoalInput`] lets a caller (e.g. reflection) set every
/// field explicitly.
#[derive(Debug, Clone, Default)]
pub struct GoalInput {
    pub id: Option<GoalId>,
    pub description: String,
    pub goal_type: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<u8>,
}

impl From<&str> for GoalInput {
    fn from(s: &str) -> Self {
        Self {
            description: s.to_string(),
            ..Default::default()
        }
    }
}

impl From<String> for GoalInput {
    fn from(s: String) -> Self {
        Self {
            description: s,
            ..Default::default()
        }
    }
}

impl From<GoalInput> for Goal {
    fn from(input: GoalInput) -> Self {
        Self {
            id: input.id.unwrap_or_else(GoalId::generate),
            description: input.description,
            goal_type: input.goal_type.unwrap_or_else(default_goal_type),
            priority: input.priority.unwrap_or_else(default_priority),
            progress: input.progress.unwrap_or(0).min(100),
        }
    }
}
