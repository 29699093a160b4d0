//! A single recorded thought: content plus the bookkeeping the temporal
//! renderer and token-budget trimming need.

use chrono::{DateTime, Utc};
use cogmem_tokens::estimate_tokens;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub cached_tokens: usize,
    /// An earlier date this thought refers back to ("I remember last
    /// Tuesday..."), annotated in the temporal renderer as "refers to …".
    #[serde(default)]
    pub referenced_date: Option<DateTime<Utc>>,
}

impl Thought {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let cached_tokens = estimate_tokens(&content);
        Self {
            content,
            timestamp: Utc::now(),
            cached_tokens,
            referenced_date: None,
        }
    }
}

/// Loosely-typed input to `add_thought`: either bare text or a partial
/// record (e.g. rebuilt from a signal) with explicit fields.
#[derive(Debug, Clone, Default)]
pub struct ThoughtInput {
    pub content: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub referenced_date: Option<DateTime<Utc>>,
}

impl From<&str> for ThoughtInput {
    fn from(s: &str) -> Self {
        Self {
            content: s.to_string(),
            ..Default::default()
        }
    }
}

impl From<String> for ThoughtInput {
    fn from(s: String) -> Self {
        Self {
            content: s,
            ..Default::default()
        }
    }
}

impl From<ThoughtInput> for Thought {
    fn from(input: ThoughtInput) -> Self {
        let cached_tokens = estimate_tokens(&input.content);
        Self {
            content: input.content,
            timestamp: input.timestamp.unwrap_or_else(Utc::now),
            cached_tokens,
            referenced_date: input.referenced_date,
        }
    }
}
