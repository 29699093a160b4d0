//! The `Proposal` record and its typed fields.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use cogmem_core::ProposalId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The eleven proposal kinds the queue recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    Fact,
    Insight,
    Learning,
    Pattern,
    Goal,
    GoalUpdate,
    Thought,
    Concern,
    Curiosity,
    Identity,
    Intent,
    CognitiveMode,
    Preconscious,
}

impl ProposalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalType::Fact => "fact",
            ProposalType::Insight => "insight",
            ProposalType::Learning => "learning",
            ProposalType::Pattern => "pattern",
            ProposalType::Goal => "goal",
            ProposalType::GoalUpdate => "goal_update",
            ProposalType::Thought => "thought",
            ProposalType::Concern => "concern",
            ProposalType::Curiosity => "curiosity",
            ProposalType::Identity => "identity",
            ProposalType::Intent => "intent",
            ProposalType::CognitiveMode => "cognitive_mode",
            ProposalType::Preconscious => "preconscious",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fact" => Some(ProposalType::Fact),
            "insight" => Some(ProposalType::Insight),
            "learning" => Some(ProposalType::Learning),
            "pattern" => Some(ProposalType::Pattern),
            "goal" => Some(ProposalType::Goal),
            "goal_update" => Some(ProposalType::GoalUpdate),
            "thought" => Some(ProposalType::Thought),
            "concern" => Some(ProposalType::Concern),
            "curiosity" => Some(ProposalType::Curiosity),
            "identity" => Some(ProposalType::Identity),
            "intent" => Some(ProposalType::Intent),
            "cognitive_mode" => Some(ProposalType::CognitiveMode),
            "preconscious" => Some(ProposalType::Preconscious),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
    Deferred,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Deferred => "deferred",
        }
    }
}

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub agent_id: String,
    pub proposal_type: ProposalType,
    pub content: String,
    pub confidence: f64,
    pub status: ProposalStatus,
    pub source: Option<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted by [`crate::ProposalQueue::create`].
#[derive(Debug, Clone, Default)]
pub struct ProposalAttrs {
    pub confidence: Option<f64>,
    pub source: Option<String>,
    pub evidence: Vec<String>,
    pub metadata: HashMap<String, Value>,
}
