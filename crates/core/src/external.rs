//! The narrow traits through which the core reaches outside itself: an
//! embedding store, a durable relationship store, and an LLM provider.
//! None of these are implemented here beyond an in-memory reference used by
//! tests and default wiring — real backends are a caller concern.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::ExternalError;
use crate::ids::AgentId;

/// Context passed alongside an embedding or search call.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingContext {
    pub agent_id: Option<AgentId>,
    pub node_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SemanticMatch {
    pub key: String,
    pub score: f32,
}

/// The embedding/semantic-search collaborator. Every method degrades
/// gracefully: a missing input is a no-op, and an unreachable backing store
/// never surfaces as an error to the caller.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    async fn embed_async(
        &self,
        namespace: &str,
        key: &str,
        content: &str,
        ctx: EmbeddingContext,
    );

    async fn semantic_search(
        &self,
        query: &str,
        namespace: &str,
        ctx: EmbeddingContext,
        limit: usize,
    ) -> Vec<SemanticMatch>;
}

/// Durable relationship storage. Conventional CRUD; the core only ever
/// calls the four methods below.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn put_by_name(
        &self,
        agent_id: &AgentId,
        name: &str,
        value: serde_json::Value,
    ) -> std::result::Result<(), ExternalError>;

    async fn get_by_name(
        &self,
        agent_id: &AgentId,
        name: &str,
    ) -> std::result::Result<Option<serde_json::Value>, ExternalError>;

    async fn list(
        &self,
        agent_id: &AgentId,
    ) -> std::result::Result<Vec<(String, serde_json::Value)>, ExternalError>;

    async fn touch(&self, agent_id: &AgentId, name: &str) -> std::result::Result<(), ExternalError>;
}

#[derive(Debug, Clone, Default)]
pub struct GenerateTextOpts {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: Option<u64>,
}

/// A single-method LLM provider: `generate_text(prompt, opts) -> {ok, text}
/// | {error, reason}`. The core never assumes a specific provider;
/// summarisation and reflection both call through this trait only.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate_text(
        &self,
        prompt: &str,
        opts: GenerateTextOpts,
    ) -> std::result::Result<String, ExternalError>;
}

/// An in-memory `EmbeddingStore` used by default wiring and tests: stores
/// content verbatim and scores matches by a cheap token-overlap heuristic
/// rather than real embeddings.
#[derive(Default)]
pub struct InMemoryEmbeddingStore {
    entries: RwLock<HashMap<String, Vec<(String, String)>>>,
}

impl InMemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EmbeddingStore for InMemoryEmbeddingStore {
    async fn embed_async(&self, namespace: &str, key: &str, content: &str, _ctx: EmbeddingContext) {
        if key.is_empty() || content.is_empty() {
            return;
        }
        let mut entries = self.entries.write().await;
        entries
            .entry(namespace.to_string())
            .or_default()
            .push((key.to_string(), content.to_string()));
    }

    async fn semantic_search(
        &self,
        query: &str,
        namespace: &str,
        _ctx: EmbeddingContext,
        limit: usize,
    ) -> Vec<SemanticMatch> {
        let entries = self.entries.read().await;
        let query_lower = query.to_lowercase();
        let query_tokens: Vec<&str> = query_lower.split_whitespace().collect();
        let mut matches: Vec<SemanticMatch> = entries
            .get(namespace)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|(key, content)| {
                        let content_lower = content.to_lowercase();
                        let overlap = query_tokens
                            .iter()
                            .filter(|t| content_lower.contains(*t))
                            .count();
                        if overlap == 0 {
                            None
                        } else {
                            Some(SemanticMatch {
                                key: key.clone(),
                                score: overlap as f32 / query_tokens.len().max(1) as f32,
                            })
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);
        matches
    }
}

#[derive(Default)]
pub struct InMemoryRelationshipStore {
    entries: RwLock<HashMap<AgentId, HashMap<String, (serde_json::Value, DateTime<Utc>)>>>,
}

impl InMemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelationshipStore for InMemoryRelationshipStore {
    async fn put_by_name(
        &self,
        agent_id: &AgentId,
        name: &str,
        value: serde_json::Value,
    ) -> std::result::Result<(), ExternalError> {
        let mut entries = self.entries.write().await;
        entries
            .entry(agent_id.clone())
            .or_default()
            .insert(name.to_string(), (value, Utc::now()));
        Ok(())
    }

    async fn get_by_name(
        &self,
        agent_id: &AgentId,
        name: &str,
    ) -> std::result::Result<Option<serde_json::Value>, ExternalError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(agent_id)
            .and_then(|m| m.get(name))
            .map(|(v, _)| v.clone()))
    }

    async fn list(
        &self,
        agent_id: &AgentId,
    ) -> std::result::Result<Vec<(String, serde_json::Value)>, ExternalError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(agent_id)
            .map(|m| m.iter().map(|(k, (v, _))| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    async fn touch(&self, agent_id: &AgentId, name: &str) -> std::result::Result<(), ExternalError> {
        let mut entries = self.entries.write().await;
        if let Some(m) = entries.get_mut(agent_id) {
            if let Some((_, ts)) = m.get_mut(name) {
                *ts = Utc::now();
            }
        }
        Ok(())
    }
}

/// A deterministic LLM stand-in for tests: echoes a canned response or a
/// truncation of the prompt, never calls out to a network.
pub struct MockLlmProvider {
    pub canned_response: Option<String>,
}

impl MockLlmProvider {
    pub fn canned(response: impl Into<String>) -> Self {
        Self {
            canned_response: Some(response.into()),
        }
    }

    pub fn echo() -> Self {
        Self {
            canned_response: None,
        }
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn generate_text(
        &self,
        prompt: &str,
        _opts: GenerateTextOpts,
    ) -> std::result::Result<String, ExternalError> {
        match &self.canned_response {
            Some(resp) => Ok(resp.clone()),
            None => Ok(prompt.chars().take(200).collect()),
        }
    }
}

pub type SharedEmbeddingStore = Arc<dyn EmbeddingStore>;
pub type SharedRelationshipStore = Arc<dyn RelationshipStore>;
pub type SharedLlmProvider = Arc<dyn LlmProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn embed_async_ignores_empty_inputs() {
        let store = InMemoryEmbeddingStore::new();
        store.embed_async("ns", "", "content", EmbeddingContext::default()).await;
        let matches = store
            .semantic_search("content", "ns", EmbeddingContext::default(), 10)
            .await;
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn semantic_search_finds_token_overlap() {
        let store = InMemoryEmbeddingStore::new();
        store
            .embed_async("ns", "k1", "the sky is blue today", EmbeddingContext::default())
            .await;
        let matches = store
            .semantic_search("sky blue", "ns", EmbeddingContext::default(), 10)
            .await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].key, "k1");
    }

    #[tokio::test]
    async fn relationship_store_put_get_list_touch() {
        let store = InMemoryRelationshipStore::new();
        let agent = AgentId::from("a1");
        store.put_by_name(&agent, "Alice", json!({"trust": 0.8})).await.unwrap();
        let got = store.get_by_name(&agent, "Alice").await.unwrap();
        assert!(got.is_some());
        let listed = store.list(&agent).await.unwrap();
        assert_eq!(listed.len(), 1);
        store.touch(&agent, "Alice").await.unwrap();
    }

    #[tokio::test]
    async fn mock_llm_provider_echoes_canned_response() {
        let provider = MockLlmProvider::canned("hello");
        let out = provider.generate_text("prompt", GenerateTextOpts::default()).await.unwrap();
        assert_eq!(out, "hello");
    }
}
