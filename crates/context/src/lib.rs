//! The layered context window: a legacy
//! single-list mode and a four-tier multi-layer mode with a compression
//! pipeline driven by ratio-based token budgets.

mod compress;
mod legacy;
mod message;
mod ops;
mod render;
mod serialize;
mod window;

pub use compress::CompressionOutcome;
pub use legacy::{EntryKind, LegacyEntry};
pub use message::{MessageEntry, RetrievedItem};
pub use ops::BuiltContext;
pub use window::{ContextWindow, LayerRatios, Mode, MultiLayerOpts, Preset};
