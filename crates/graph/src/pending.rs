//! The pending-fact and pending-learning queues: candidates a background
//! analyser has proposed that await explicit approval before becoming nodes.
//!
//! This is distinct from `cogmem-proposals`' general proposal queue — these
//! two lists live on the graph itself because they're the only proposal
//! shapes the graph needs to gate directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCandidate {
    pub id: String,
    pub content: String,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl PendingCandidate {
    pub fn new(id: impl Into<String>, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            confidence: confidence.clamp(0.0, 1.0),
            metadata: HashMap::new(),
            created_at: Utc::now(),
        }
    }
}

/// Which pending queue an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Fact,
    Learning,
}
