//! Token estimation and budget-spec resolution (component A).
//!
//! Every estimate here is pure and deterministic: no I/O, no clock reads,
//! no randomness. `estimate_tokens`'s exact formula is not contractual —
//! only monotonicity and determinism are — so this picks the cheapest
//! heuristic that satisfies both: one token per four characters, rounded up.

use serde::{Deserialize, Serialize};

/// The per-message wire-format overhead (role name, delimiters, formatting
/// markers) added on top of a message's content-token estimate.
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// The fallback context size for an unrecognised model id.
pub const DEFAULT_MODEL_CONTEXT: usize = 100_000;

/// Estimates the token count of `text`. Monotonic in `text.len()`, cheap,
/// and identical across calls for the same input — that's the full
/// extent of what callers may rely on.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() + 3) / 4
}

/// Estimates the token cost of a single message including wire overhead.
pub fn estimate_message_tokens(content: &str) -> usize {
    MESSAGE_OVERHEAD_TOKENS + estimate_tokens(content)
}

/// A token budget specification, resolved against a model (or default)
/// context size by [`resolve_budget`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetSpec {
    Fixed { n: u64 },
    Percentage { p: f64 },
    MinMax { lo: u64, hi: u64, p: f64 },
}

impl BudgetSpec {
    pub fn fixed(n: u64) -> Self {
        Self::Fixed { n }
    }

    pub fn percentage(p: f64) -> Self {
        Self::Percentage { p }
    }

    pub fn min_max(lo: u64, hi: u64, p: f64) -> Self {
        Self::MinMax { lo, hi, p }
    }
}

/// Resolves a [`BudgetSpec`] against a model's context size into a concrete
/// token count.
///
/// - `Fixed { n }` → `n`
/// - `Percentage { p }` → `round(p * model_context)`
/// - `MinMax { lo, hi, p }` → `clamp(round(p * model_context), lo, hi)`
pub fn resolve_budget(spec: BudgetSpec, model_context: u64) -> u64 {
    match spec {
        BudgetSpec::Fixed { n } => n,
        BudgetSpec::Percentage { p } => (p * model_context as f64).round() as u64,
        BudgetSpec::MinMax { lo, hi, p } => {
            let raw = (p * model_context as f64).round() as u64;
            raw.clamp(lo, hi)
        }
    }
}

/// Returns the known context-window size for `model_id`, or
/// [`DEFAULT_MODEL_CONTEXT`] for anything unrecognised. Deliberately a
/// small static table rather than a network lookup: token-budget
/// resolution must stay pure and side-effect-free.
pub fn model_context_size(model_id: &str) -> u64 {
    match model_id {
        "claude-3-5-sonnet" | "claude-3-5-sonnet-latest" | "claude-3-opus" => 200_000,
        "claude-3-haiku" => 200_000,
        "gpt-4o" | "gpt-4o-mini" | "gpt-4-turbo" => 128_000,
        "gpt-4" => 8_192,
        "gpt-3.5-turbo" => 16_385,
        "gemini-1.5-pro" | "gemini-1.5-flash" => 1_000_000,
        _ => DEFAULT_MODEL_CONTEXT as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_is_zero_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn four_chars_is_one_token() {
        assert_eq!(estimate_tokens("test"), 1);
    }

    #[test]
    fn five_chars_rounds_up_to_two() {
        assert_eq!(estimate_tokens("hello"), 2);
    }

    #[test]
    fn estimate_is_monotonic_in_length() {
        let short = estimate_tokens("a");
        let long = estimate_tokens(&"a".repeat(1000));
        assert!(long > short);
    }

    #[test]
    fn estimate_is_deterministic() {
        let text = "the quick brown fox";
        assert_eq!(estimate_tokens(text), estimate_tokens(text));
    }

    #[test]
    fn message_tokens_include_overhead() {
        assert_eq!(estimate_message_tokens("test"), 4 + 1);
    }

    #[test]
    fn resolve_fixed_budget() {
        assert_eq!(resolve_budget(BudgetSpec::fixed(500), 200_000), 500);
    }

    #[test]
    fn resolve_percentage_budget() {
        assert_eq!(resolve_budget(BudgetSpec::percentage(0.1), 100_000), 10_000);
    }

    #[test]
    fn resolve_min_max_clamps_low() {
        assert_eq!(resolve_budget(BudgetSpec::min_max(1_000, 50_000, 0.01), 10_000), 1_000);
    }

    #[test]
    fn resolve_min_max_clamps_high() {
        assert_eq!(resolve_budget(BudgetSpec::min_max(1_000, 5_000, 0.9), 100_000), 5_000);
    }

    #[test]
    fn resolve_min_max_passes_through_in_range() {
        assert_eq!(resolve_budget(BudgetSpec::min_max(1_000, 50_000, 0.2), 100_000), 20_000);
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        assert_eq!(model_context_size("some-unreleased-model"), DEFAULT_MODEL_CONTEXT as u64);
    }

    #[test]
    fn known_model_returns_its_context_size() {
        assert_eq!(model_context_size("claude-3-5-sonnet"), 200_000);
    }
}
