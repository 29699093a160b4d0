//! Multi-layer mutators: `add_message` and friends, `add_retrieved`, and
//! `build_context`.

use cogmem_core::error::ContextError;
use serde_json::Value;

use crate::message::{MessageEntry, RetrievedItem};
use crate::window::{ContextWindow, Mode};

/// The non-empty sections of a window, in render order.
#[derive(Debug, Clone, Default)]
pub struct BuiltContext {
    pub distant_summary: Option<String>,
    pub recent_summary: Option<String>,
    pub clarity_boundary: chrono::DateTime<chrono::Utc>,
    pub full_detail: Vec<MessageEntry>,
    pub retrieved: Vec<RetrievedItem>,
}

impl ContextWindow {
    fn require_multi_layer(&self) -> Result<(), ContextError> {
        if self.mode != Mode::MultiLayer {
            return Err(ContextError::LegacyModeOnly);
        }
        Ok(())
    }

    pub fn add_message(&mut self, role: impl Into<String>, content: impl Into<String>) -> Result<(), ContextError> {
        self.require_multi_layer()?;
        let entry = MessageEntry::new(role, content);
        self.detail_tokens += entry.cached_tokens;
        self.full_detail.insert(0, entry);
        if !self.summarization_enabled {
            self.trim_detail_inline();
        }
        Ok(())
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) -> Result<(), ContextError> {
        self.add_message("user", content)
    }

    pub fn add_assistant_response(&mut self, content: impl Into<String>) -> Result<(), ContextError> {
        self.add_message("assistant", content)
    }

    /// A no-op for an empty list.
    pub fn add_tool_results(&mut self, results: Vec<Value>) -> Result<(), ContextError> {
        self.require_multi_layer()?;
        if results.is_empty() {
            return Ok(());
        }
        for result in results {
            let entry = MessageEntry::from_tool_result(&result);
            self.detail_tokens += entry.cached_tokens;
            self.full_detail.insert(0, entry);
        }
        if !self.summarization_enabled {
            self.trim_detail_inline();
        }
        Ok(())
    }

    /// Adds a retrieved fragment, deduping against the current
    /// `retrieved_context` by exact content match.
    pub fn add_retrieved(&mut self, content: impl Into<String>) -> Result<(), ContextError> {
        self.require_multi_layer()?;
        let content = content.into();
        if self.retrieved_context.iter().any(|item| item.content == content) {
            return Ok(());
        }
        let item = RetrievedItem::new(content);
        self.retrieved_tokens += item.cached_tokens;
        self.retrieved_context.push(item);
        Ok(())
    }

    pub fn build_context(&self) -> Result<BuiltContext, ContextError> {
        self.require_multi_layer()?;
        Ok(BuiltContext {
            distant_summary: (!self.distant_summary.is_empty()).then(|| self.distant_summary.clone()),
            recent_summary: (!self.recent_summary.is_empty()).then(|| self.recent_summary.clone()),
            clarity_boundary: self.clarity_boundary.unwrap_or_else(chrono::Utc::now),
            full_detail: self.full_detail.clone(),
            retrieved: self.retrieved_context.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_core::AgentId;

    fn window() -> ContextWindow {
        ContextWindow::new_multi_layer(AgentId::from("a1"), Default::default()).unwrap()
    }

    #[test]
    fn add_message_prepends_and_tracks_tokens() {
        let mut w = window();
        w.add_user_message("hello").unwrap();
        w.add_assistant_response("hi there").unwrap();
        assert_eq!(w.full_detail()[0].role, "assistant");
        assert!(w.detail_tokens() > 0);
    }

    #[test]
    fn empty_tool_results_is_noop() {
        let mut w = window();
        w.add_tool_results(vec![]).unwrap();
        assert!(w.full_detail().is_empty());
    }

    #[test]
    fn add_retrieved_dedups_by_exact_content() {
        let mut w = window();
        w.add_retrieved("fact one").unwrap();
        w.add_retrieved("fact one").unwrap();
        assert_eq!(w.retrieved_context().len(), 1);
    }

    #[test]
    fn build_context_omits_empty_sections() {
        let mut w = window();
        w.add_user_message("hi").unwrap();
        let built = w.build_context().unwrap();
        assert!(built.distant_summary.is_none());
        assert!(built.recent_summary.is_none());
        assert_eq!(built.full_detail.len(), 1);
    }
}
