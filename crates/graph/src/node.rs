//! Node types and the mutable input spec accepted by `add_node`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cogmem_core::NodeId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The nine node kinds recognised by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Fact,
    Experience,
    Skill,
    Insight,
    Relationship,
    Observation,
    Trait,
    Goal,
    Intention,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Fact => "fact",
            NodeType::Experience => "experience",
            NodeType::Skill => "skill",
            NodeType::Insight => "insight",
            NodeType::Relationship => "relationship",
            NodeType::Observation => "observation",
            NodeType::Trait => "trait",
            NodeType::Goal => "goal",
            NodeType::Intention => "intention",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fact" => Some(NodeType::Fact),
            "experience" => Some(NodeType::Experience),
            "skill" => Some(NodeType::Skill),
            "insight" => Some(NodeType::Insight),
            "relationship" => Some(NodeType::Relationship),
            "observation" => Some(NodeType::Observation),
            "trait" => Some(NodeType::Trait),
            "goal" => Some(NodeType::Goal),
            "intention" => Some(NodeType::Intention),
            _ => None,
        }
    }
}

/// A knowledge graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub content: String,
    pub relevance: f64,
    pub confidence: f64,
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
    pub pinned: bool,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    pub cached_tokens: usize,
}

impl Node {
    /// Clamps and boosts relevance by `delta`, keeping it within `[0.01, 1.0]`.
    pub fn boost_relevance(&mut self, delta: f64) {
        self.relevance = (self.relevance + delta).clamp(0.01, 1.0);
    }
}

/// The input to `add_node`. Fields arrive as loosely-typed strings/options
/// because callers (proposal acceptance, reflection) build these from
/// external JSON; validation happens inside `add_node`.
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    pub node_type: Option<String>,
    pub content: Option<String>,
    pub relevance: Option<f64>,
    pub confidence: Option<f64>,
    pub pinned: bool,
    pub metadata: HashMap<String, Value>,
    pub embedding: Option<Vec<f32>>,
    pub skip_dedup: bool,
}

impl NodeSpec {
    pub fn new(node_type: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance = Some(relevance);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn skipping_dedup(mut self) -> Self {
        self.skip_dedup = true;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

pub const DEFAULT_RELEVANCE: f64 = 0.5;
pub const DEFAULT_CONFIDENCE: f64 = 0.5;
