//! The proposal queue: a content+type-deduped pending/accepted/rejected/
//! deferred state machine whose `accept`
//! materialises entries into the knowledge graph by type.

mod accept;
mod proposal;
mod queue;

pub use proposal::{Proposal, ProposalAttrs, ProposalStatus, ProposalType, DEFAULT_CONFIDENCE};
pub use queue::{ListOpts, ProposalQueue, ProposalStats, SortBy};
