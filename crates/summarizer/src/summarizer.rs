//! `summarize` and `estimate_summary_length`.

use cogmem_config::{ProviderPreference, SummarizerConfig};
use cogmem_core::external::{GenerateTextOpts, LlmProvider};
use cogmem_tokens::estimate_tokens;

use crate::complexity::{assess_complexity, Complexity};
use crate::model::recommend_model;

const MIN_SUMMARY_TOKENS: usize = 10;

/// Caller overrides for a single `summarize` call; unset fields fall back
/// to `SummarizerConfig`.
#[derive(Debug, Clone, Default)]
pub struct SummarizeOpts {
    pub preference: Option<ProviderPreference>,
    pub cost_sensitive: Option<bool>,
    pub model_override: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub summary: String,
    pub complexity: Complexity,
    pub model_used: String,
}

/// At least [`MIN_SUMMARY_TOKENS`], at most roughly 40% of the input's
/// token count for complex text.
pub fn estimate_summary_length(text: &str) -> usize {
    let input_tokens = estimate_tokens(text);
    if input_tokens == 0 {
        return MIN_SUMMARY_TOKENS;
    }
    let target = ((input_tokens as f64) * 0.25).round() as usize;
    let ceiling = (((input_tokens as f64) * 0.4).round() as usize).max(MIN_SUMMARY_TOKENS);
    target.clamp(MIN_SUMMARY_TOKENS, ceiling)
}

fn truncate_to_tokens(text: &str, target_tokens: usize) -> String {
    let max_chars = target_tokens * 4;
    if text.len() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{truncated}...")
}

/// Summarises `text`, never failing: an LLM error degrades to a
/// deterministic truncation instead of an error.
pub async fn summarize(
    text: &str,
    llm: &dyn LlmProvider,
    cfg: &SummarizerConfig,
    opts: SummarizeOpts,
) -> SummaryOutcome {
    let complexity = assess_complexity(text);
    let preference = opts.preference.unwrap_or(cfg.preference);
    let cost_sensitive = opts.cost_sensitive.unwrap_or(cfg.cost_sensitive);
    let model = opts
        .model_override
        .unwrap_or_else(|| recommend_model(complexity, preference, cost_sensitive));
    let target_tokens = estimate_summary_length(text);

    let prompt = format!(
        "Summarise the following text in roughly {target_tokens} tokens, preserving key facts:\n\n{text}"
    );
    let generate_opts = GenerateTextOpts { model: Some(model.clone()), ..Default::default() };

    match llm.generate_text(&prompt, generate_opts).await {
        Ok(summary) => SummaryOutcome { summary, complexity, model_used: model },
        Err(err) => {
            tracing::warn!(error = %err, model = %model, "summarization call failed, falling back to truncation");
            SummaryOutcome { summary: truncate_to_tokens(text, target_tokens), complexity, model_used: model }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_core::external::MockLlmProvider;

    #[test]
    fn estimate_summary_length_has_a_floor() {
        assert_eq!(estimate_summary_length(""), MIN_SUMMARY_TOKENS);
        assert_eq!(estimate_summary_length("a b c"), MIN_SUMMARY_TOKENS);
    }

    #[test]
    fn estimate_summary_length_is_bounded_by_forty_percent_of_input() {
        let text = "word ".repeat(2000);
        let input_tokens = estimate_tokens(&text);
        let target = estimate_summary_length(&text);
        assert!(target as f64 <= input_tokens as f64 * 0.4 + 1.0);
    }

    #[tokio::test]
    async fn summarize_returns_llm_output_on_success() {
        let llm = MockLlmProvider::canned("a tidy summary");
        let cfg = SummarizerConfig::default();
        let outcome = summarize("some long text to summarise", &llm, &cfg, SummarizeOpts::default()).await;
        assert_eq!(outcome.summary, "a tidy summary");
        assert_eq!(outcome.complexity, Complexity::Simple);
    }

    struct FailingLlm;
    #[async_trait::async_trait]
    impl LlmProvider for FailingLlm {
        async fn generate_text(&self, _prompt: &str, _opts: GenerateTextOpts) -> Result<String, cogmem_core::error::ExternalError> {
            Err(cogmem_core::error::ExternalError::LlmUnavailable("down".to_string()))
        }
    }

    #[tokio::test]
    async fn summarize_falls_back_to_truncation_on_llm_failure() {
        let llm = FailingLlm;
        let cfg = SummarizerConfig::default();
        let text = "x".repeat(1000);
        let outcome = summarize(&text, &llm, &cfg, SummarizeOpts::default()).await;
        assert!(outcome.summary.ends_with("..."));
        assert!(outcome.summary.len() < text.len());
    }
}
