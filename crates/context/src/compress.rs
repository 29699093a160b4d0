//! The compression pipeline: partition the detail tail, summarise the
//! demoted prefix into
//! `recent_summary`, flow overflow into `distant_summary`, and optionally
//! extract facts from what was demoted.
//!
//! Summarisation and model selection both go through `cogmem-summarizer`:
//! the window decides *when* to compress and *how much* fits where,
//! `cogmem_summarizer::summarize` decides *which model* and produces the
//! text, falling back to deterministic truncation on its own if the call
//! fails.

use chrono::Utc;
use cogmem_core::error::ContextError;
use cogmem_core::external::{GenerateTextOpts, LlmProvider};
use cogmem_summarizer::{summarize, SummarizeOpts};
use cogmem_tokens::estimate_tokens;

use crate::message::MessageEntry;
use crate::window::{ContextWindow, Mode};

/// What a completed compression pass did, for the caller's bookkeeping
/// (e.g. routing `extracted_facts` into the graph's pending-fact queue).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompressionOutcome {
    pub demoted_messages: usize,
    pub extracted_facts: Vec<String>,
}

fn truncate_to_chars(text: &str, max_chars: usize) -> String {
    if text.len() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars).collect();
    truncated.push_str("...");
    truncated
}

impl ContextWindow {
    fn full_detail_budget(&self) -> usize {
        (self.ratios.full_detail * self.max_tokens as f64) as usize
    }

    fn recent_summary_budget(&self) -> usize {
        (self.ratios.recent_summary * self.max_tokens as f64) as usize
    }

    pub fn needs_compression(&self) -> Result<bool, ContextError> {
        if self.mode != Mode::MultiLayer {
            return Err(ContextError::LegacyModeOnly);
        }
        Ok(self.detail_tokens > self.full_detail_budget())
    }

    /// Evicts the oldest messages from `full_detail` until `detail_tokens`
    /// fits the full-detail budget, without involving summarisation. Used
    /// inline by `add_message` when `summarization_enabled` is false —
    /// compression then happens inline per add instead of as a batch pass.
    pub(crate) fn trim_detail_inline(&mut self) {
        while self.detail_tokens > self.full_detail_budget() && self.full_detail.len() > 1 {
            if let Some(evicted) = self.full_detail.pop() {
                self.detail_tokens = self.detail_tokens.saturating_sub(evicted.cached_tokens);
            }
        }
    }

    /// Runs [`Self::compress`] only when [`Self::needs_compression`] is true
    /// and `summarization_enabled` is set; otherwise a no-op. Idempotent:
    /// calling this twice without new messages leaves state unchanged,
    /// since the first pass always brings `detail_tokens` back under
    /// budget.
    pub async fn compress_if_needed(&mut self, llm: &dyn LlmProvider) -> Result<Option<CompressionOutcome>, ContextError> {
        if !self.needs_compression()? || !self.summarization_enabled {
            return Ok(None);
        }
        self.compress(llm).await.map(Some)
    }

    /// Unconditionally runs one compression pass.
    pub async fn compress(&mut self, llm: &dyn LlmProvider) -> Result<CompressionOutcome, ContextError> {
        if self.mode != Mode::MultiLayer {
            return Err(ContextError::LegacyModeOnly);
        }

        let budget = self.full_detail_budget();
        let (keep, demote) = self.partition_detail(budget);
        let demoted_messages = demote.len();

        let demoted_text: String = demote
            .iter()
            .rev()
            .map(|m| format!("[{}] {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        let extracted_facts = if self.fact_extraction_enabled && !demoted_text.is_empty() {
            self.extract_facts(llm, &demoted_text).await
        } else {
            Vec::new()
        };

        let new_recent_summary = self.summarize_into_recent(llm, &demoted_text).await;
        let recent_budget = self.recent_summary_budget();
        let recent_tokens = estimate_tokens(&new_recent_summary);

        let (final_recent, overflow) = if recent_tokens > recent_budget {
            self.split_overflow(&new_recent_summary, recent_budget)
        } else {
            (new_recent_summary, String::new())
        };

        if !overflow.is_empty() {
            self.distant_summary = self.summarize_into_distant(llm, &overflow).await;
            self.distant_summary_tokens = estimate_tokens(&self.distant_summary);
        }

        self.full_detail = keep;
        self.detail_tokens = self.full_detail.iter().map(|m| m.cached_tokens).sum();
        self.recent_summary_tokens = estimate_tokens(&final_recent);
        self.recent_summary = final_recent;
        self.compression_count += 1;
        self.last_compression_at = Some(Utc::now());
        self.clarity_boundary = Some(Utc::now());

        tracing::debug!(
            agent_id = %self.agent_id,
            demoted = demoted_messages,
            compression_count = self.compression_count,
            "context window compressed"
        );

        Ok(CompressionOutcome { demoted_messages, extracted_facts })
    }

    /// Splits `full_detail` (newest-first) into a recent-enough-to-keep
    /// prefix and an older-prefix-to-demote suffix.
    fn partition_detail(&self, budget: usize) -> (Vec<MessageEntry>, Vec<MessageEntry>) {
        let mut keep = Vec::new();
        let mut demote = Vec::new();
        let mut running = 0usize;
        for entry in &self.full_detail {
            if running + entry.cached_tokens <= budget {
                running += entry.cached_tokens;
                keep.push(entry.clone());
            } else {
                demote.push(entry.clone());
            }
        }
        (keep, demote)
    }

    fn summarize_opts(&self) -> SummarizeOpts {
        SummarizeOpts { model_override: self.summarization_model.clone(), ..Default::default() }
    }

    async fn summarize_into_recent(&self, llm: &dyn LlmProvider, demoted_text: &str) -> String {
        if demoted_text.is_empty() {
            return self.recent_summary.clone();
        }
        let combined_source = if self.recent_summary.is_empty() {
            demoted_text.to_string()
        } else {
            format!("{}\n{}", self.recent_summary, demoted_text)
        };
        if !self.summarization_enabled {
            return truncate_to_chars(&combined_source, self.recent_summary_budget() * 4);
        }
        let outcome = summarize(&combined_source, llm, &self.summarizer, self.summarize_opts()).await;
        tracing::debug!(agent_id = %self.agent_id, model = %outcome.model_used, complexity = ?outcome.complexity, "recent-summary produced");
        outcome.summary
    }

    async fn summarize_into_distant(&self, llm: &dyn LlmProvider, overflow: &str) -> String {
        let combined_source = if self.distant_summary.is_empty() {
            overflow.to_string()
        } else {
            format!("{}\n{}", self.distant_summary, overflow)
        };
        if !self.summarization_enabled {
            let budget = (self.ratios.distant_summary * self.max_tokens as f64) as usize;
            return truncate_to_chars(&combined_source, budget * 4);
        }
        let outcome = summarize(&combined_source, llm, &self.summarizer, self.summarize_opts()).await;
        tracing::debug!(agent_id = %self.agent_id, model = %outcome.model_used, complexity = ?outcome.complexity, "distant-summary produced");
        outcome.summary
    }

    async fn extract_facts(&self, llm: &dyn LlmProvider, demoted_text: &str) -> Vec<String> {
        let prompt = format!(
            "Extract standalone factual statements from the following text, one per line, with no commentary:\n\n{demoted_text}"
        );
        match llm
            .generate_text(&prompt, GenerateTextOpts { model: self.fact_extraction_model.clone(), ..Default::default() })
            .await
        {
            Ok(text) => text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect(),
            Err(err) => {
                tracing::warn!(agent_id = %self.agent_id, error = %err, "fact extraction failed, skipping");
                Vec::new()
            }
        }
    }

    /// Keeps the most recent `budget`-worth of `text` (by char-approximated
    /// tokens) and returns `(kept, overflow)` where `overflow` is the older,
    /// demoted remainder.
    fn split_overflow(&self, text: &str, budget: usize) -> (String, String) {
        let max_chars = budget * 4;
        if text.len() <= max_chars {
            return (text.to_string(), String::new());
        }
        let split_at = text.len() - max_chars;
        let boundary = text[..split_at].rfind('\n').map(|i| i + 1).unwrap_or(split_at);
        let overflow = text[..boundary].to_string();
        let kept = text[boundary..].to_string();
        (kept, overflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_core::external::MockLlmProvider;
    use cogmem_core::AgentId;
    use crate::window::MultiLayerOpts;
    use cogmem_tokens::BudgetSpec;

    fn window() -> ContextWindow {
        ContextWindow::new_multi_layer(
            AgentId::from("a1"),
            MultiLayerOpts {
                max_tokens: Some(BudgetSpec::fixed(100)),
                summarization_enabled: Some(true),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn compression_demotes_prefix_and_bounds_detail_tokens() {
        let mut w = window();
        for i in 0..10 {
            w.add_message("user", "x".repeat(50 * 4) + &i.to_string()).unwrap();
        }
        assert!(w.needs_compression().unwrap());
        let llm = MockLlmProvider::canned("a concise summary");
        let outcome = w.compress_if_needed(&llm).await.unwrap();
        assert!(outcome.is_some());
        assert!(w.detail_tokens() <= 50);
        assert!(!w.recent_summary().is_empty());
        assert_eq!(w.compression_count(), 1);
    }

    #[tokio::test]
    async fn compress_if_needed_is_idempotent_without_new_messages() {
        let mut w = window();
        for i in 0..10 {
            w.add_message("user", "x".repeat(50 * 4) + &i.to_string()).unwrap();
        }
        let llm = MockLlmProvider::canned("summary");
        w.compress_if_needed(&llm).await.unwrap();
        let snapshot_detail = w.detail_tokens();
        let snapshot_count = w.compression_count();
        let second = w.compress_if_needed(&llm).await.unwrap();
        assert!(second.is_none());
        assert_eq!(w.detail_tokens(), snapshot_detail);
        assert_eq!(w.compression_count(), snapshot_count);
    }

    #[tokio::test]
    async fn disabled_summarization_falls_back_to_truncation() {
        let mut w = ContextWindow::new_multi_layer(
            AgentId::from("a1"),
            MultiLayerOpts {
                max_tokens: Some(BudgetSpec::fixed(100)),
                summarization_enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
        for i in 0..10 {
            w.add_message("user", "y".repeat(200) + &i.to_string()).unwrap();
        }
        // Inline trimming should already have kept detail under budget
        // without ever calling compress.
        assert!(w.detail_tokens() <= 50);
        assert_eq!(w.compression_count(), 0);
    }

    struct FailingLlm;
    #[async_trait::async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate_text(&self, _prompt: &str, _opts: GenerateTextOpts) -> Result<String, cogmem_core::error::ExternalError> {
            Err(cogmem_core::error::ExternalError::LlmUnavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn llm_failure_during_compression_falls_back_to_deterministic_truncation() {
        let mut w = window();
        for i in 0..10 {
            w.add_message("user", "x".repeat(50 * 4) + &i.to_string()).unwrap();
        }
        let outcome = w.compress_if_needed(&FailingLlm).await.unwrap();
        assert!(outcome.is_some());
        assert!(w.recent_summary().ends_with("..."));
    }
}
