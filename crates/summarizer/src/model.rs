//! Model recommendation: complexity + provider preference + cost
//! sensitivity → a concrete model id.

use cogmem_config::ProviderPreference;

use crate::complexity::Complexity;

/// Recommends a model id. The minimum guarantee is that `Simple` maps to
/// a lightweight model and `HighlyComplex` to a top-tier one; the concrete
/// id strings are implementation-defined.
pub fn recommend_model(complexity: Complexity, preference: ProviderPreference, cost_sensitive: bool) -> String {
    let tier = match (complexity, cost_sensitive) {
        (Complexity::Simple, _) => Tier::Lightweight,
        (Complexity::Moderate, true) => Tier::Lightweight,
        (Complexity::Moderate, false) => Tier::Mid,
        (Complexity::Complex, true) => Tier::Mid,
        (Complexity::Complex, false) => Tier::TopTier,
        (Complexity::HighlyComplex, _) => Tier::TopTier,
    };
    model_id(preference, tier).to_string()
}

enum Tier {
    Lightweight,
    Mid,
    TopTier,
}

fn model_id(preference: ProviderPreference, tier: Tier) -> &'static str {
    match (preference, tier) {
        (ProviderPreference::Anthropic, Tier::Lightweight) => "claude-haiku",
        (ProviderPreference::Anthropic, Tier::Mid) => "claude-sonnet",
        (ProviderPreference::Anthropic, Tier::TopTier) => "claude-opus",
        (ProviderPreference::Openai, Tier::Lightweight) => "gpt-4o-mini",
        (ProviderPreference::Openai, Tier::Mid) => "gpt-4o",
        (ProviderPreference::Openai, Tier::TopTier) => "gpt-4.1",
        (ProviderPreference::Google, Tier::Lightweight) => "gemini-flash",
        (ProviderPreference::Google, Tier::Mid) => "gemini-pro",
        (ProviderPreference::Google, Tier::TopTier) => "gemini-ultra",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_maps_to_lightweight() {
        let model = recommend_model(Complexity::Simple, ProviderPreference::Anthropic, false);
        assert_eq!(model, "claude-haiku");
    }

    #[test]
    fn highly_complex_maps_to_top_tier_regardless_of_cost_sensitivity() {
        let model = recommend_model(Complexity::HighlyComplex, ProviderPreference::Openai, true);
        assert_eq!(model, "gpt-4.1");
    }

    #[test]
    fn cost_sensitivity_downgrades_a_tier() {
        let frugal = recommend_model(Complexity::Complex, ProviderPreference::Google, true);
        let generous = recommend_model(Complexity::Complex, ProviderPreference::Google, false);
        assert_eq!(frugal, "gemini-pro");
        assert_eq!(generous, "gemini-ultra");
    }
}
