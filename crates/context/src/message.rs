//! `full_detail` message entries and `retrieved_context` fragments for
//! multi-layer mode.

use chrono::{DateTime, Utc};
use cogmem_tokens::estimate_message_tokens;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single turn stored in `full_detail`, newest-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntry {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cached_tokens: usize,
}

impl MessageEntry {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        let content = content.into();
        let cached_tokens = estimate_message_tokens(&content);
        Self { role: role.into(), content, timestamp: Utc::now(), cached_tokens }
    }

    /// Encodes a structured tool result as JSON-like text.
    pub fn from_tool_result(value: &Value) -> Self {
        let content = serde_json::to_string(value).unwrap_or_default();
        Self::new("tool", content)
    }
}

/// A retrieved fragment added via `add_retrieved`, deduped by exact content
/// match; embedding-based semantic dedup is left to a future retrieval
/// backend rather than built in here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedItem {
    pub content: String,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default)]
    pub cached_tokens: usize,
    #[serde(default)]
    pub source: Option<String>,
}

impl RetrievedItem {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let cached_tokens = estimate_message_tokens(&content);
        Self { content, retrieved_at: Utc::now(), cached_tokens, source: None }
    }
}
