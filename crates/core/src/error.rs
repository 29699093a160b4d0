//! Typed error surface for the cognitive memory engine.
//!
//! Every public operation returns `Result<T, Error>`. Capacity and budget
//! pressure are never errors — they degrade via eviction, truncation, or
//! graceful fallback — so none of the variants below model "ran out of
//! room"; they model caller misuse, lookup failure, or an external
//! collaborator being unavailable.

use thiserror::Error as ThisError;

use crate::ids::{AgentId, NodeId, ProposalId};

/// Errors raised by [`crate`]`::graph` (the `B` component in the design).
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("node spec is missing a type")]
    MissingType,
    #[error("node spec is missing content")]
    MissingContent,
    #[error("invalid node type: {0}")]
    InvalidType(String),
    #[error("type quota exceeded for: {0}")]
    QuotaExceeded(String),
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("edge endpoint not found: {0}")]
    EdgeEndpointNotFound(NodeId),
}

/// Errors raised by `working-memory`.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum WorkingMemoryError {
    #[error("goal not found: {0}")]
    GoalNotFound(String),
    #[error("working memory schema version {found} is newer than the supported version {max}")]
    UnsupportedSchemaVersion { found: u32, max: u32 },
}

/// Errors raised by `context` (the multi-layer context window).
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("context window is in legacy mode; multi-layer operation is unavailable")]
    LegacyModeOnly,
    #[error("context window is in multi-layer mode; legacy operation is unavailable")]
    MultiLayerModeOnly,
    #[error("layer ratios must sum to at most 1.0, got {0}")]
    RatiosExceedUnity(f64),
}

/// Errors raised by `proposals`.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ProposalError {
    #[error("proposal not found: {0}")]
    NotFound(ProposalId),
    #[error("unknown proposal type: {0}")]
    UnknownType(String),
    #[error("proposal content must not be empty")]
    EmptyContent,
    #[error("invalid status transition: current={current}, expected one of={expected}")]
    InvalidStatus { current: String, expected: String },
}

/// Errors raised by `reflection`.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    #[error("reflection LLM call failed: {0}")]
    LlmFailed(String),
    #[error("reflection response could not be parsed: {0}")]
    UnparseableResponse(String),
}

/// Failure of an out-of-process collaborator the core treats as optional:
/// the signal bus, the embedding store, the relationship store, or an LLM
/// provider. Never fatal on its own — callers decide whether to surface it
/// (user-initiated reflection) or fall back gracefully (background passes,
/// summarisation).
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum ExternalError {
    #[error("signal bus unavailable: {0}")]
    SignalBusUnavailable(String),
    #[error("embedding store unavailable: {0}")]
    EmbeddingStoreUnavailable(String),
    #[error("relationship store unavailable: {0}")]
    RelationshipStoreUnavailable(String),
    #[error("llm provider unavailable: {0}")]
    LlmUnavailable(String),
    #[error("external call timed out after {0}ms")]
    Timeout(u64),
}

/// Programmer-error class: an agent id used before `init_for_agent`, or a
/// lookup against a storage table that was never populated. Always a core
/// bug or caller misuse, never a process crash.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum FacadeError {
    #[error("agent not initialised: {0}")]
    UnknownAgent(AgentId),
    #[error("agent already initialised: {0}")]
    AgentAlreadyInitialised(AgentId),
}

/// The top-level error type returned by every public operation in the
/// engine. Each bounded context composes into this enum via `#[from]`; no
/// internal error type is ever unwrapped or panics across a component
/// boundary.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    WorkingMemory(#[from] WorkingMemoryError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Proposal(#[from] ProposalError),
    #[error(transparent)]
    Reflection(#[from] ReflectionError),
    #[error(transparent)]
    External(#[from] ExternalError),
    #[error(transparent)]
    Facade(#[from] FacadeError),
}

pub type Result<T> = std::result::Result<T, Error>;
