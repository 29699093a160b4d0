//! The decayed, token-budgeted knowledge graph: nodes, edges, dedup,
//! active-set eviction, cascade recall, and
//! token-budgeted context selection.

pub mod edge;
mod graph;
pub mod node;
pub mod pending;
mod render;
mod serialize;

pub use edge::{AddEdgeOpts, Edge};
pub use graph::{
    ActiveSetOpts, CascadeOpts, DecayArchiveOpts, DecayOpts, FindRelatedOpts, KnowledgeGraph,
    PromptOpts, RecallOpts,
};
pub use node::{Node, NodeSpec, NodeType};
pub use pending::{PendingCandidate, PendingKind};
