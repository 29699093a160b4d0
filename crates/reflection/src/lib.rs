//! The gated, LLM-driven reflection pass: `should_reflect?` and
//! `deep_reflect`, plus the context assembly,
//! response parsing, and bounded history they're built from.

pub mod context;
mod gate;
mod history;
mod reflect;
mod response;
pub mod thinking;

pub use context::{build_deep_context, DeepContextInputs};
pub use gate::{should_reflect, ShouldReflectOpts};
pub use history::{ReflectionHistory, ReflectionRecord, UpdateCounts};
pub use reflect::{deep_reflect, maybe_reflect, periodic_reflection, DeepReflectInputs, DeepReflectOpts, ReflectOutcome};
pub use response::{
    parse_response, GoalUpdate, Insight, KnowledgeEdgeSpec, KnowledgeNodeSpec, Learning, NewGoal, ReflectionResponse,
    RelationshipUpdate,
};
