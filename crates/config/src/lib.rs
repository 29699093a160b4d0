//! Configuration loading for the cognitive memory engine.
//!
//! Loads a TOML `AppConfig` with `serde(default)` fallbacks on every field,
//! so the engine runs with sane defaults even with no config file present.
//! Unlike the provider/channel-oriented configs elsewhere in this lineage,
//! nothing here is a secret: the engine's own tunables never include API
//! keys (those belong to the external `LlmProvider` implementation the
//! caller wires in), so there is no redacting `Debug` impl to write.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// The root configuration structure. Maps directly to a TOML file; every
/// field has a default so an empty or partial file still loads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub context: ContextConfig,
    #[serde(default)]
    pub reflection: ReflectionConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub working_memory: WorkingMemoryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            context: ContextConfig::default(),
            reflection: ReflectionConfig::default(),
            summarizer: SummarizerConfig::default(),
            working_memory: WorkingMemoryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`. A missing file is not an error —
    /// it resolves to [`AppConfig::default`] so the crate stays usable
    /// standalone with no config file present.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            }),
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: "<string>".to_string(),
            source,
        })
    }
}

/// Knowledge graph tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,
    #[serde(default = "default_max_nodes_per_type")]
    pub max_nodes_per_type: usize,
    #[serde(default = "default_prune_threshold")]
    pub prune_threshold: f64,
    #[serde(default = "default_max_active")]
    pub max_active: usize,
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,
    #[serde(default = "default_cascade_decay_factor")]
    pub cascade_decay_factor: f64,
    #[serde(default = "default_cascade_max_depth")]
    pub cascade_max_depth: usize,
    #[serde(default = "default_cascade_min_boost")]
    pub cascade_min_boost: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            decay_rate: default_decay_rate(),
            max_nodes_per_type: default_max_nodes_per_type(),
            prune_threshold: default_prune_threshold(),
            max_active: default_max_active(),
            dedup_threshold: default_dedup_threshold(),
            cascade_decay_factor: default_cascade_decay_factor(),
            cascade_max_depth: default_cascade_max_depth(),
            cascade_min_boost: default_cascade_min_boost(),
        }
    }
}

fn default_decay_rate() -> f64 {
    0.1
}
fn default_max_nodes_per_type() -> usize {
    500
}
fn default_prune_threshold() -> f64 {
    0.1
}
fn default_max_active() -> usize {
    50
}
fn default_dedup_threshold() -> f64 {
    0.85
}
fn default_cascade_decay_factor() -> f64 {
    0.5
}
fn default_cascade_max_depth() -> usize {
    3
}
fn default_cascade_min_boost() -> f64 {
    0.01
}

/// Multi-layer context window ratios and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextConfig {
    #[serde(default = "default_full_detail_ratio")]
    pub full_detail_ratio: f64,
    #[serde(default = "default_recent_summary_ratio")]
    pub recent_summary_ratio: f64,
    #[serde(default = "default_distant_summary_ratio")]
    pub distant_summary_ratio: f64,
    #[serde(default = "default_retrieved_ratio")]
    pub retrieved_ratio: f64,
    #[serde(default = "default_summary_threshold")]
    pub summary_threshold: f64,
    #[serde(default = "default_true")]
    pub summarization_enabled: bool,
    #[serde(default)]
    pub fact_extraction_enabled: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            full_detail_ratio: default_full_detail_ratio(),
            recent_summary_ratio: default_recent_summary_ratio(),
            distant_summary_ratio: default_distant_summary_ratio(),
            retrieved_ratio: default_retrieved_ratio(),
            summary_threshold: default_summary_threshold(),
            summarization_enabled: true,
            fact_extraction_enabled: false,
        }
    }
}

fn default_full_detail_ratio() -> f64 {
    0.5
}
fn default_recent_summary_ratio() -> f64 {
    0.25
}
fn default_distant_summary_ratio() -> f64 {
    0.15
}
fn default_retrieved_ratio() -> f64 {
    0.1
}
fn default_summary_threshold() -> f64 {
    0.8
}
fn default_true() -> bool {
    true
}

/// Reflection gating for `should_reflect?`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReflectionConfig {
    #[serde(default = "default_reflection_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_reflection_signal_threshold")]
    pub signal_threshold: u64,
    #[serde(default = "default_self_insight_cap")]
    pub self_insight_cap: usize,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_reflection_interval_ms(),
            signal_threshold: default_reflection_signal_threshold(),
            self_insight_cap: default_self_insight_cap(),
        }
    }
}

fn default_reflection_interval_ms() -> u64 {
    6 * 60 * 60 * 1000
}
fn default_reflection_signal_threshold() -> u64 {
    20
}
fn default_self_insight_cap() -> usize {
    10
}

/// Summarisation preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub preference: ProviderPreference,
    #[serde(default)]
    pub cost_sensitive: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            preference: ProviderPreference::default(),
            cost_sensitive: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderPreference {
    #[default]
    Anthropic,
    Openai,
    Google,
}

/// Working-memory bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingMemoryConfig {
    #[serde(default = "default_max_thoughts")]
    pub max_thoughts: usize,
    #[serde(default)]
    pub max_tokens: Option<u64>,
}

impl Default for WorkingMemoryConfig {
    fn default() -> Self {
        Self {
            max_thoughts: default_max_thoughts(),
            max_tokens: None,
        }
    }
}

fn default_max_thoughts() -> usize {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_spec_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.graph.decay_rate, 0.1);
        assert_eq!(cfg.graph.max_nodes_per_type, 500);
        assert_eq!(cfg.graph.prune_threshold, 0.1);
        assert_eq!(cfg.graph.max_active, 50);
        assert_eq!(cfg.graph.dedup_threshold, 0.85);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let cfg = AppConfig::load("/nonexistent/path/cogmem.toml").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg = AppConfig::from_toml_str("[graph]\ndecay_rate = 0.5\n").unwrap();
        assert_eq!(cfg.graph.decay_rate, 0.5);
        assert_eq!(cfg.graph.max_active, 50);
    }

    #[test]
    fn loads_from_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cogmem.toml");
        std::fs::write(&path, "[reflection]\ninterval_ms = 1000\n").unwrap();
        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.reflection.interval_ms, 1000);
        assert_eq!(cfg.reflection.signal_threshold, 20);
    }

    #[test]
    fn provider_preference_defaults_to_anthropic() {
        assert_eq!(SummarizerConfig::default().preference, ProviderPreference::Anthropic);
    }
}
