//! Legacy single-list context window mode: a flat,
//! newest-first list of message/summary entries compressed by replacing an
//! older prefix with one summary once a threshold is crossed.

use chrono::{DateTime, Utc};
use cogmem_core::error::ContextError;
use cogmem_tokens::estimate_message_tokens;
use serde::{Deserialize, Serialize};

use crate::window::{ContextWindow, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Message,
    Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub cached_tokens: usize,
}

impl LegacyEntry {
    pub fn new(kind: EntryKind, content: impl Into<String>) -> Self {
        let content = content.into();
        let cached_tokens = estimate_message_tokens(&content);
        Self { kind, content, timestamp: Utc::now(), cached_tokens }
    }
}

impl ContextWindow {
    fn require_legacy(&self) -> Result<(), ContextError> {
        if self.mode != Mode::Legacy {
            return Err(ContextError::MultiLayerModeOnly);
        }
        Ok(())
    }

    /// Prepends a new entry. Legacy operations are inert cross-mode; in
    /// multi-layer mode this surfaces as `Err(MultiLayerModeOnly)` rather
    /// than silently mutating the wrong layer set.
    pub fn add_entry(&mut self, kind: EntryKind, content: impl Into<String>) -> Result<(), ContextError> {
        self.require_legacy()?;
        self.entries.insert(0, LegacyEntry::new(kind, content));
        Ok(())
    }

    fn legacy_tokens(&self) -> usize {
        self.entries.iter().map(|e| e.cached_tokens).sum()
    }

    pub fn should_summarize(&self) -> Result<bool, ContextError> {
        self.require_legacy()?;
        let usage = self.legacy_tokens() as f64;
        Ok(usage >= self.summary_threshold * self.legacy_max_tokens as f64)
    }

    /// Replaces the older prefix (everything past the first `keep_recent`
    /// entries) with a single summary entry, when there is anything to
    /// replace.
    pub fn apply_summary(&mut self, summary: impl Into<String>, keep_recent: usize) -> Result<(), ContextError> {
        self.require_legacy()?;
        if self.entries.len() <= keep_recent {
            return Ok(());
        }
        let recent: Vec<LegacyEntry> = self.entries.drain(..keep_recent).collect();
        let summary_entry = LegacyEntry::new(EntryKind::Summary, summary);
        self.entries = recent;
        self.entries.push(summary_entry);
        Ok(())
    }
}
