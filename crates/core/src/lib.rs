//! Shared domain types, error kinds, and external-collaborator traits for
//! the cognitive memory engine. Every other crate in this workspace depends
//! inward on this one; it depends on nothing else in the workspace.

pub mod error;
pub mod external;
pub mod ids;
pub mod signal;

pub use error::{Error, Result};
pub use ids::{AgentId, EdgeKey, GoalId, NodeId, ProposalId};
pub use signal::{Signal, SignalBus, SignalType};
