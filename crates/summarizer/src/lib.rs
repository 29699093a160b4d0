//! The summariser: complexity assessment, model recommendation, and an
//! LLM call that degrades to deterministic
//! truncation rather than ever failing.

mod complexity;
mod model;
mod summarizer;

pub use complexity::{assess_complexity, Complexity};
pub use model::recommend_model;
pub use summarizer::{estimate_summary_length, summarize, SummarizeOpts, SummaryOutcome};
