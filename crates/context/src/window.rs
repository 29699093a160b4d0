//! The [`ContextWindow`] itself: mode selection, layer storage, and the
//! ratio-based budget each layer is held to.

use chrono::{DateTime, Utc};
use cogmem_config::{ContextConfig, SummarizerConfig};
use cogmem_core::error::ContextError;
use cogmem_core::AgentId;
use cogmem_tokens::{resolve_budget, BudgetSpec, DEFAULT_MODEL_CONTEXT};

use crate::legacy::LegacyEntry;
use crate::message::{MessageEntry, RetrievedItem};

/// Which of the two mutually exclusive modes a window operates in.
/// Legacy-mode operations are no-ops in multi-layer mode and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Legacy,
    MultiLayer,
}

/// The four layer-ratio shares of `max_tokens`. Must sum to at most 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerRatios {
    pub full_detail: f64,
    pub recent_summary: f64,
    pub distant_summary: f64,
    pub retrieved: f64,
}

impl LayerRatios {
    pub fn new(full_detail: f64, recent_summary: f64, distant_summary: f64, retrieved: f64) -> Result<Self, ContextError> {
        let total = full_detail + recent_summary + distant_summary + retrieved;
        if total > 1.0 + 1e-9 {
            return Err(ContextError::RatiosExceedUnity(total));
        }
        Ok(Self { full_detail, recent_summary, distant_summary, retrieved })
    }
}

impl Default for LayerRatios {
    fn default() -> Self {
        Self { full_detail: 0.5, recent_summary: 0.25, distant_summary: 0.15, retrieved: 0.1 }
    }
}

impl From<&ContextConfig> for LayerRatios {
    fn from(cfg: &ContextConfig) -> Self {
        Self {
            full_detail: cfg.full_detail_ratio,
            recent_summary: cfg.recent_summary_ratio,
            distant_summary: cfg.distant_summary_ratio,
            retrieved: cfg.retrieved_ratio,
        }
    }
}

/// A named bundle of `max_tokens` / ratios / `summarization_enabled`, the
/// way a caller picks a window shape without hand-assembling ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// A modest window for short-lived sessions: 8% of model context, even
    /// ratios across the four layers.
    Compact,
    /// The default ratios (0.5/0.25/0.15/0.1) over a generous
    /// percentage-of-context budget.
    Balanced,
    /// A large window for long-running agents, with summarisation enabled
    /// and a wide full-detail tail.
    LongRunning,
}

impl Preset {
    pub fn budget(self) -> BudgetSpec {
        match self {
            Preset::Compact => BudgetSpec::min_max(1_000, 20_000, 0.08),
            Preset::Balanced => BudgetSpec::percentage(0.25),
            Preset::LongRunning => BudgetSpec::min_max(20_000, 400_000, 0.5),
        }
    }

    pub fn ratios(self) -> LayerRatios {
        match self {
            Preset::Compact => LayerRatios { full_detail: 0.6, recent_summary: 0.2, distant_summary: 0.1, retrieved: 0.1 },
            Preset::Balanced => LayerRatios::default(),
            Preset::LongRunning => LayerRatios { full_detail: 0.35, recent_summary: 0.3, distant_summary: 0.25, retrieved: 0.1 },
        }
    }

    pub fn summarization_enabled(self) -> bool {
        matches!(self, Preset::Balanced | Preset::LongRunning)
    }
}

/// Options accepted by [`ContextWindow::new_multi_layer`].
#[derive(Debug, Clone, Default)]
pub struct MultiLayerOpts {
    pub max_tokens: Option<BudgetSpec>,
    pub ratios: Option<LayerRatios>,
    pub preset: Option<Preset>,
    pub summarization_enabled: Option<bool>,
    pub fact_extraction_enabled: bool,
    pub model_context: Option<u64>,
    pub summarization_model: Option<String>,
    pub summarization_provider: Option<String>,
    pub fact_extraction_model: Option<String>,
    pub summarization_algorithm: Option<String>,
    pub summarizer: SummarizerConfig,
}

/// The per-agent context window. Owned exclusively by one agent, same as
/// `cogmem-graph`'s knowledge graph.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    pub agent_id: AgentId,
    pub(crate) mode: Mode,

    // ── Legacy mode ──────────────────────────────────────────────────────
    pub(crate) entries: Vec<LegacyEntry>,
    pub(crate) legacy_max_tokens: u64,
    pub(crate) summary_threshold: f64,

    // ── Multi-layer mode ─────────────────────────────────────────────────
    pub(crate) distant_summary: String,
    pub(crate) recent_summary: String,
    pub(crate) full_detail: Vec<MessageEntry>,
    pub(crate) retrieved_context: Vec<RetrievedItem>,
    pub(crate) distant_summary_tokens: usize,
    pub(crate) recent_summary_tokens: usize,
    pub(crate) detail_tokens: usize,
    pub(crate) retrieved_tokens: usize,
    pub ratios: LayerRatios,
    pub(crate) clarity_boundary: Option<DateTime<Utc>>,
    pub(crate) compression_count: u64,
    pub(crate) last_compression_at: Option<DateTime<Utc>>,
    pub max_tokens: u64,
    pub summarization_model: Option<String>,
    pub summarization_provider: Option<String>,
    pub fact_extraction_model: Option<String>,
    pub summarization_enabled: bool,
    pub fact_extraction_enabled: bool,
    pub summarization_algorithm: Option<String>,
    pub summarizer: SummarizerConfig,
}

impl ContextWindow {
    pub fn new_legacy(agent_id: AgentId, max_tokens: u64, summary_threshold: f64) -> Self {
        Self {
            agent_id,
            mode: Mode::Legacy,
            entries: Vec::new(),
            legacy_max_tokens: max_tokens,
            summary_threshold,
            distant_summary: String::new(),
            recent_summary: String::new(),
            full_detail: Vec::new(),
            retrieved_context: Vec::new(),
            distant_summary_tokens: 0,
            recent_summary_tokens: 0,
            detail_tokens: 0,
            retrieved_tokens: 0,
            ratios: LayerRatios::default(),
            clarity_boundary: None,
            compression_count: 0,
            last_compression_at: None,
            max_tokens,
            summarization_model: None,
            summarization_provider: None,
            fact_extraction_model: None,
            summarization_enabled: false,
            fact_extraction_enabled: false,
            summarization_algorithm: None,
            summarizer: SummarizerConfig::default(),
        }
    }

    pub fn new_multi_layer(agent_id: AgentId, opts: MultiLayerOpts) -> Result<Self, ContextError> {
        let model_context = opts.model_context.unwrap_or(DEFAULT_MODEL_CONTEXT as u64);
        let budget_spec = opts
            .max_tokens
            .or_else(|| opts.preset.map(Preset::budget))
            .unwrap_or_else(|| BudgetSpec::percentage(0.25));
        let max_tokens = resolve_budget(budget_spec, model_context);
        let ratios = opts
            .ratios
            .or_else(|| opts.preset.map(Preset::ratios))
            .unwrap_or_default();
        let total = ratios.full_detail + ratios.recent_summary + ratios.distant_summary + ratios.retrieved;
        if total > 1.0 + 1e-9 {
            return Err(ContextError::RatiosExceedUnity(total));
        }
        let summarization_enabled = opts
            .summarization_enabled
            .or_else(|| opts.preset.map(Preset::summarization_enabled))
            .unwrap_or(true);

        Ok(Self {
            agent_id,
            mode: Mode::MultiLayer,
            entries: Vec::new(),
            legacy_max_tokens: max_tokens,
            summary_threshold: 0.8,
            distant_summary: String::new(),
            recent_summary: String::new(),
            full_detail: Vec::new(),
            retrieved_context: Vec::new(),
            distant_summary_tokens: 0,
            recent_summary_tokens: 0,
            detail_tokens: 0,
            retrieved_tokens: 0,
            ratios,
            clarity_boundary: None,
            compression_count: 0,
            last_compression_at: None,
            max_tokens,
            summarization_model: opts.summarization_model,
            summarization_provider: opts.summarization_provider,
            fact_extraction_model: opts.fact_extraction_model,
            summarization_enabled,
            fact_extraction_enabled: opts.fact_extraction_enabled,
            summarization_algorithm: opts.summarization_algorithm,
            summarizer: opts.summarizer,
        })
    }

    pub fn from_config(
        agent_id: AgentId,
        cfg: &ContextConfig,
        summarizer_cfg: &SummarizerConfig,
        multi_layer: bool,
        model_context: u64,
    ) -> Result<Self, ContextError> {
        if !multi_layer {
            return Ok(Self::new_legacy(agent_id, (cfg.summary_threshold * model_context as f64) as u64, cfg.summary_threshold));
        }
        Self::new_multi_layer(
            agent_id,
            MultiLayerOpts {
                ratios: Some(LayerRatios::from(cfg)),
                summarization_enabled: Some(cfg.summarization_enabled),
                fact_extraction_enabled: cfg.fact_extraction_enabled,
                model_context: Some(model_context),
                summarizer: summarizer_cfg.clone(),
                ..Default::default()
            },
        )
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_multi_layer(&self) -> bool {
        self.mode == Mode::MultiLayer
    }

    pub fn distant_summary(&self) -> &str {
        &self.distant_summary
    }

    pub fn recent_summary(&self) -> &str {
        &self.recent_summary
    }

    pub fn full_detail(&self) -> &[MessageEntry] {
        &self.full_detail
    }

    pub fn retrieved_context(&self) -> &[RetrievedItem] {
        &self.retrieved_context
    }

    pub fn clarity_boundary(&self) -> Option<DateTime<Utc>> {
        self.clarity_boundary
    }

    pub fn compression_count(&self) -> u64 {
        self.compression_count
    }

    pub fn detail_tokens(&self) -> usize {
        self.detail_tokens
    }

    pub fn recent_summary_tokens(&self) -> usize {
        self.recent_summary_tokens
    }

    pub fn distant_summary_tokens(&self) -> usize {
        self.distant_summary_tokens
    }

    pub fn retrieved_tokens(&self) -> usize {
        self.retrieved_tokens
    }

    pub fn entries(&self) -> &[LegacyEntry] {
        &self.entries
    }
}
