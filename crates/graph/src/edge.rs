//! Typed directed edges between nodes, keyed by `(source, target, relationship)`.

use chrono::{DateTime, Utc};
use cogmem_core::NodeId;
use serde::{Deserialize, Serialize};

pub const MAX_EDGE_STRENGTH: f64 = 10.0;
pub const EDGE_MERGE_INCREMENT: f64 = 0.5;

/// A directed, typed edge. Re-inserting the same `(source, target,
/// relationship)` triple merges into this edge by adding
/// [`EDGE_MERGE_INCREMENT`] to `strength`, capped at [`MAX_EDGE_STRENGTH`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: String,
    pub strength: f64,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, relationship: impl Into<String>, strength: f64) -> Self {
        Self {
            source,
            target,
            relationship: relationship.into(),
            strength: strength.clamp(0.0, MAX_EDGE_STRENGTH),
            created_at: Utc::now(),
        }
    }

    pub fn merge(&mut self) {
        self.strength = (self.strength + EDGE_MERGE_INCREMENT).min(MAX_EDGE_STRENGTH);
    }
}

#[derive(Debug, Clone, Default)]
pub struct AddEdgeOpts {
    pub strength: Option<f64>,
}
