//! The bounded, versioned rolling working memory: thoughts, goals,
//! concerns, curiosity, engagement, and signal replay.

pub mod goal;
mod memory;
mod render;
mod serialize;
mod signal;
pub mod thought;

pub use goal::{Goal, GoalInput};
pub use memory::{WorkingMemory, WorkingMemoryOpts, WorkingMemoryStats, CURRENT_SCHEMA_VERSION};
pub use render::PromptTextOpts;
pub use thought::{Thought, ThoughtInput};
