//! `serialize`/`deserialize` for [`ContextWindow`]: every persisted
//! component round-trips through a map form.

use cogmem_core::AgentId;
use serde_json::{json, Value};

use crate::legacy::LegacyEntry;
use crate::message::{MessageEntry, RetrievedItem};
use crate::window::{ContextWindow, LayerRatios, Mode};

pub const CURRENT_VERSION: u32 = 1;

fn mode_str(mode: Mode) -> &'static str {
    match mode {
        Mode::Legacy => "legacy",
        Mode::MultiLayer => "multi_layer",
    }
}

impl ContextWindow {
    pub fn to_map(&self) -> Value {
        json!({
            "version": CURRENT_VERSION,
            "agent_id": self.agent_id.as_str(),
            "mode": mode_str(self.mode),
            "entries": self.entries,
            "legacy_max_tokens": self.legacy_max_tokens,
            "summary_threshold": self.summary_threshold,
            "distant_summary": self.distant_summary,
            "recent_summary": self.recent_summary,
            "full_detail": self.full_detail,
            "retrieved_context": self.retrieved_context,
            "detail_tokens": self.detail_tokens,
            "recent_summary_tokens": self.recent_summary_tokens,
            "distant_summary_tokens": self.distant_summary_tokens,
            "retrieved_tokens": self.retrieved_tokens,
            "ratios": {
                "full_detail": self.ratios.full_detail,
                "recent_summary": self.ratios.recent_summary,
                "distant_summary": self.ratios.distant_summary,
                "retrieved": self.ratios.retrieved,
            },
            "clarity_boundary": self.clarity_boundary,
            "compression_count": self.compression_count,
            "last_compression_at": self.last_compression_at,
            "max_tokens": self.max_tokens,
            "summarization_enabled": self.summarization_enabled,
            "fact_extraction_enabled": self.fact_extraction_enabled,
            "summarization_model": self.summarization_model,
            "summarization_provider": self.summarization_provider,
            "fact_extraction_model": self.fact_extraction_model,
            "summarization_algorithm": self.summarization_algorithm,
        })
    }

    pub fn from_map(value: &Value) -> Self {
        let agent_id = value
            .get("agent_id")
            .and_then(|v| v.as_str())
            .map(AgentId::from)
            .unwrap_or_else(|| AgentId::from("unknown"));
        let mode = match value.get("mode").and_then(|v| v.as_str()) {
            Some("multi_layer") => Mode::MultiLayer,
            _ => Mode::Legacy,
        };

        let ratios = value
            .get("ratios")
            .map(|r| LayerRatios {
                full_detail: r.get("full_detail").and_then(|v| v.as_f64()).unwrap_or(0.5),
                recent_summary: r.get("recent_summary").and_then(|v| v.as_f64()).unwrap_or(0.25),
                distant_summary: r.get("distant_summary").and_then(|v| v.as_f64()).unwrap_or(0.15),
                retrieved: r.get("retrieved").and_then(|v| v.as_f64()).unwrap_or(0.1),
            })
            .unwrap_or_default();

        let entries: Vec<LegacyEntry> = value
            .get("entries")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| serde_json::from_value(v.clone()).ok()).collect())
            .unwrap_or_default();
        let full_detail: Vec<MessageEntry> = value
            .get("full_detail")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| serde_json::from_value(v.clone()).ok()).collect())
            .unwrap_or_default();
        let retrieved_context: Vec<RetrievedItem> = value
            .get("retrieved_context")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| serde_json::from_value(v.clone()).ok()).collect())
            .unwrap_or_default();

        Self {
            agent_id,
            mode,
            entries,
            legacy_max_tokens: value.get("legacy_max_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            summary_threshold: value.get("summary_threshold").and_then(|v| v.as_f64()).unwrap_or(0.8),
            distant_summary: value.get("distant_summary").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            recent_summary: value.get("recent_summary").and_then(|v| v.as_str()).unwrap_or("").to_string(),
            full_detail,
            retrieved_context,
            distant_summary_tokens: value.get("distant_summary_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
            recent_summary_tokens: value.get("recent_summary_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
            detail_tokens: value.get("detail_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
            retrieved_tokens: value.get("retrieved_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
            ratios,
            clarity_boundary: value.get("clarity_boundary").and_then(|v| serde_json::from_value(v.clone()).ok()),
            compression_count: value.get("compression_count").and_then(|v| v.as_u64()).unwrap_or(0),
            last_compression_at: value.get("last_compression_at").and_then(|v| serde_json::from_value(v.clone()).ok()),
            max_tokens: value.get("max_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            summarization_model: value.get("summarization_model").and_then(|v| v.as_str()).map(String::from),
            summarization_provider: value.get("summarization_provider").and_then(|v| v.as_str()).map(String::from),
            fact_extraction_model: value.get("fact_extraction_model").and_then(|v| v.as_str()).map(String::from),
            summarization_enabled: value.get("summarization_enabled").and_then(|v| v.as_bool()).unwrap_or(false),
            fact_extraction_enabled: value.get("fact_extraction_enabled").and_then(|v| v.as_bool()).unwrap_or(false),
            summarization_algorithm: value.get("summarization_algorithm").and_then(|v| v.as_str()).map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::MultiLayerOpts;

    #[test]
    fn multi_layer_round_trips() {
        let mut w = ContextWindow::new_multi_layer(AgentId::from("a1"), MultiLayerOpts::default()).unwrap();
        w.add_user_message("hello").unwrap();
        w.add_retrieved("a fact").unwrap();
        w.distant_summary = "old stuff".to_string();

        let map = w.to_map();
        let restored = ContextWindow::from_map(&map);

        assert_eq!(restored.agent_id.as_str(), "a1");
        assert_eq!(restored.mode(), Mode::MultiLayer);
        assert_eq!(restored.full_detail().len(), 1);
        assert_eq!(restored.retrieved_context().len(), 1);
        assert_eq!(restored.distant_summary(), "old stuff");
    }

    #[test]
    fn legacy_round_trips() {
        let mut w = ContextWindow::new_legacy(AgentId::from("a1"), 1_000, 0.8);
        w.add_entry(crate::legacy::EntryKind::Message, "hi").unwrap();

        let map = w.to_map();
        let restored = ContextWindow::from_map(&map);

        assert_eq!(restored.mode(), Mode::Legacy);
        assert_eq!(restored.entries().len(), 1);
    }

    #[test]
    fn missing_fields_fill_defaults() {
        let bare = json!({"agent_id": "a1"});
        let restored = ContextWindow::from_map(&bare);
        assert_eq!(restored.mode(), Mode::Legacy);
        assert!(restored.full_detail().is_empty());
    }
}
