//! Newtype identifiers used across the engine's bounded contexts.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies the owning agent. Agents are the unit of isolation: no core
/// operation ever compares or mixes state across two different `AgentId`s.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A knowledge graph node id, always rendered with a `node_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Mints a fresh, randomly generated node id.
    pub fn generate() -> Self {
        Self(format!("node_{}", Uuid::new_v4().simple()))
    }

    /// Wraps an existing string without validating the `node_` prefix; used
    /// when round-tripping ids from `from_map` on possibly-legacy data.
    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A proposal queue entry id, always rendered with a `prop_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(String);

impl ProposalId {
    pub fn generate() -> Self {
        Self(format!("prop_{}", Uuid::new_v4().simple()))
    }

    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A goal id inside `WorkingMemory::active_goals`. Goals are identified by
/// this id, never by list position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GoalId(String);

impl GoalId {
    pub fn generate() -> Self {
        Self(format!("goal_{}", Uuid::new_v4().simple()))
    }

    pub fn from_raw(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `(source_id, target_id, relationship)` triple that keys an edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: String,
}

impl EdgeKey {
    pub fn new(source: NodeId, target: NodeId, relationship: impl Into<String>) -> Self {
        Self {
            source,
            target,
            relationship: relationship.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_has_expected_prefix() {
        let id = NodeId::generate();
        assert!(id.as_str().starts_with("node_"));
    }

    #[test]
    fn proposal_id_has_expected_prefix() {
        let id = ProposalId::generate();
        assert!(id.as_str().starts_with("prop_"));
    }

    #[test]
    fn agent_id_roundtrips_through_str() {
        let id = AgentId::from("agent-7");
        assert_eq!(id.as_str(), "agent-7");
        assert_eq!(id.to_string(), "agent-7");
    }
}
