//! The signal/event bus: an external collaborator the core only consumes.
//!
//! Working memory's `apply_memory_event` and `rebuild_from_long_term`, and
//! the reflection orchestrator's "signal count since last reflection" gate,
//! are both driven by this taxonomy. The bus itself (durable storage,
//! fan-out, cross-process delivery) lives outside the core; `InMemorySignalBus`
//! below is a reference implementation used by the facade's default wiring
//! and by tests, grounded on the broadcast-based event bus pattern used
//! elsewhere in this lineage.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};

use crate::error::ExternalError;
use crate::ids::AgentId;

/// The recognised event types for `apply_memory_event`. A bus may carry
/// other signal kinds (arbitrary intents/percepts); those flow through
/// unmodified and are simply not among the ones working memory understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    IdentityChange,
    ThoughtRecorded,
    Goal,
    RelationshipChanged,
    EngagementChanged,
    ConcernAdded,
    ConcernResolved,
    CuriosityAdded,
    CuriositySatisfied,
    ConversationChanged,
    /// Anything else travelling on the bus — intents, percepts, and
    /// engine-external notifications the working memory taxonomy ignores.
    Other,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::IdentityChange => "identity_change",
            SignalType::ThoughtRecorded => "thought_recorded",
            SignalType::Goal => "goal",
            SignalType::RelationshipChanged => "relationship_changed",
            SignalType::EngagementChanged => "engagement_changed",
            SignalType::ConcernAdded => "concern_added",
            SignalType::ConcernResolved => "concern_resolved",
            SignalType::CuriosityAdded => "curiosity_added",
            SignalType::CuriositySatisfied => "curiosity_satisfied",
            SignalType::ConversationChanged => "conversation_changed",
            SignalType::Other => "other",
        }
    }
}

/// A single event on the bus: `{type, data, timestamp, correlation_id?, cause_id?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub agent_id: AgentId,
    /// The raw event-type string as it appeared on the bus. Kept alongside
    /// `kind` so unrecognised types survive a round trip instead of
    /// collapsing into a lossy `Other`.
    pub event_type: String,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<String>,
    pub cause_id: Option<String>,
}

impl Signal {
    pub fn new(agent_id: AgentId, event_type: impl Into<String>, data: Value) -> Self {
        Self {
            agent_id,
            event_type: event_type.into(),
            data,
            timestamp: Utc::now(),
            correlation_id: None,
            cause_id: None,
        }
    }

    pub fn kind(&self) -> SignalType {
        match self.event_type.as_str() {
            "identity_change" => SignalType::IdentityChange,
            "thought_recorded" => SignalType::ThoughtRecorded,
            "goal" => SignalType::Goal,
            "relationship_changed" => SignalType::RelationshipChanged,
            "engagement_changed" => SignalType::EngagementChanged,
            "concern_added" => SignalType::ConcernAdded,
            "concern_resolved" => SignalType::ConcernResolved,
            "curiosity_added" => SignalType::CuriosityAdded,
            "curiosity_satisfied" => SignalType::CuriositySatisfied,
            "conversation_changed" => SignalType::ConversationChanged,
            _ => SignalType::Other,
        }
    }
}

/// An in-flight intent dispatched by an agent, paired later with a percept
/// by `execute_and_wait`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub agent_id: AgentId,
    pub id: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// The observable result of an intent's execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Percept {
    pub agent_id: AgentId,
    pub correlation_id: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

/// The state recorded by `interrupt` and read back by `interrupted?`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptState {
    pub reason: String,
    pub agent_id: AgentId,
    pub target_id: String,
    pub interrupted_at: DateTime<Utc>,
    pub replacement_intent_id: Option<String>,
    pub allow_resume: bool,
}

#[derive(Debug, Clone, Default)]
pub struct InterruptOpts {
    pub replacement_intent_id: Option<String>,
    pub allow_resume: bool,
}

/// Subscription handle returned by `subscribe_*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

/// The narrow interface the core requires from a signal/event bus. Every
/// method degrades gracefully: a bus that is down never causes a core
/// operation to panic, only to return an empty/neutral result or a
/// `ExternalError`.
#[async_trait]
pub trait SignalBus: Send + Sync {
    async fn publish(&self, signal: Signal);

    /// Replays every signal recorded for `agent_id`, in publish order. Used
    /// by `rebuild_from_long_term`; an unavailable bus returns an empty
    /// vector rather than an error, leaving the caller's input unchanged.
    async fn replay(&self, agent_id: &AgentId) -> Vec<Signal>;

    /// Count of signals published for `agent_id` since `since`. Drives the
    /// reflection orchestrator's `should_reflect?` threshold clause.
    async fn signal_count_since(&self, agent_id: &AgentId, since: DateTime<Utc>) -> u64;

    async fn recent_intents(&self, agent_id: &AgentId, limit: usize) -> Vec<Intent>;
    async fn recent_percepts(&self, agent_id: &AgentId, limit: usize) -> Vec<Percept>;

    async fn interrupt(&self, target: &str, reason: &str, opts: InterruptOpts, agent_id: AgentId);
    async fn interrupted(&self, target: &str) -> Option<InterruptState>;
    async fn clear_interrupt(&self, target: &str);

    async fn subscribe(&self) -> (SubscriptionId, broadcast::Receiver<Signal>);
    async fn unsubscribe(&self, id: SubscriptionId);

    /// Dispatches `intent` and waits up to `timeout_ms` for the first
    /// percept correlated to it.
    async fn execute_and_wait(
        &self,
        agent_id: &AgentId,
        intent: Intent,
        timeout_ms: u64,
    ) -> std::result::Result<Percept, ExternalError>;
}

struct BusInner {
    history: HashMap<AgentId, Vec<Signal>>,
    intents: HashMap<AgentId, Vec<Intent>>,
    percepts: HashMap<AgentId, Vec<Percept>>,
    interrupts: HashMap<String, InterruptState>,
}

/// A process-local, non-durable `SignalBus`. Used as the facade's default
/// wiring and throughout the test suite; never the production backing
/// store.
pub struct InMemorySignalBus {
    inner: RwLock<BusInner>,
    sender: broadcast::Sender<Signal>,
    next_sub_id: AtomicU64,
    subs: RwLock<HashMap<SubscriptionId, ()>>,
}

impl InMemorySignalBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            inner: RwLock::new(BusInner {
                history: HashMap::new(),
                intents: HashMap::new(),
                percepts: HashMap::new(),
                interrupts: HashMap::new(),
            }),
            sender,
            next_sub_id: AtomicU64::new(1),
            subs: RwLock::new(HashMap::new()),
        }
    }

    pub fn record_intent(&self, intent: Intent) -> impl std::future::Future<Output = ()> + '_ {
        async move {
            let mut inner = self.inner.write().await;
            inner.intents.entry(intent.agent_id.clone()).or_default().push(intent);
        }
    }

    pub fn record_percept(&self, percept: Percept) -> impl std::future::Future<Output = ()> + '_ {
        async move {
            let mut inner = self.inner.write().await;
            inner
                .percepts
                .entry(percept.agent_id.clone())
                .or_default()
                .push(percept);
        }
    }
}

impl Default for InMemorySignalBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SignalBus for InMemorySignalBus {
    async fn publish(&self, signal: Signal) {
        let mut inner = self.inner.write().await;
        inner
            .history
            .entry(signal.agent_id.clone())
            .or_default()
            .push(signal.clone());
        drop(inner);
        let _ = self.sender.send(signal);
    }

    async fn replay(&self, agent_id: &AgentId) -> Vec<Signal> {
        let inner = self.inner.read().await;
        inner.history.get(agent_id).cloned().unwrap_or_default()
    }

    async fn signal_count_since(&self, agent_id: &AgentId, since: DateTime<Utc>) -> u64 {
        let inner = self.inner.read().await;
        inner
            .history
            .get(agent_id)
            .map(|sigs| sigs.iter().filter(|s| s.timestamp >= since).count() as u64)
            .unwrap_or(0)
    }

    async fn recent_intents(&self, agent_id: &AgentId, limit: usize) -> Vec<Intent> {
        let inner = self.inner.read().await;
        inner
            .intents
            .get(agent_id)
            .map(|v| v.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    async fn recent_percepts(&self, agent_id: &AgentId, limit: usize) -> Vec<Percept> {
        let inner = self.inner.read().await;
        inner
            .percepts
            .get(agent_id)
            .map(|v| v.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    async fn interrupt(&self, target: &str, reason: &str, opts: InterruptOpts, agent_id: AgentId) {
        let mut inner = self.inner.write().await;
        inner.interrupts.insert(
            target.to_string(),
            InterruptState {
                reason: reason.to_string(),
                agent_id,
                target_id: target.to_string(),
                interrupted_at: Utc::now(),
                replacement_intent_id: opts.replacement_intent_id,
                allow_resume: opts.allow_resume,
            },
        );
    }

    async fn interrupted(&self, target: &str) -> Option<InterruptState> {
        let inner = self.inner.read().await;
        inner.interrupts.get(target).cloned()
    }

    async fn clear_interrupt(&self, target: &str) {
        let mut inner = self.inner.write().await;
        inner.interrupts.remove(target);
    }

    async fn subscribe(&self) -> (SubscriptionId, broadcast::Receiver<Signal>) {
        let id = SubscriptionId(self.next_sub_id.fetch_add(1, Ordering::SeqCst));
        self.subs.write().await.insert(id, ());
        (id, self.sender.subscribe())
    }

    async fn unsubscribe(&self, id: SubscriptionId) {
        self.subs.write().await.remove(&id);
    }

    async fn execute_and_wait(
        &self,
        agent_id: &AgentId,
        intent: Intent,
        timeout_ms: u64,
    ) -> std::result::Result<Percept, ExternalError> {
        self.record_intent(intent.clone()).await;
        let correlation_id = intent.id.clone();
        let deadline = tokio::time::Instant::now() + tokio::time::Duration::from_millis(timeout_ms);
        loop {
            {
                let inner = self.inner.read().await;
                if let Some(percepts) = inner.percepts.get(agent_id) {
                    if let Some(p) = percepts.iter().find(|p| p.correlation_id == correlation_id) {
                        return Ok(p.clone());
                    }
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ExternalError::Timeout(timeout_ms));
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
        }
    }
}

pub type SharedSignalBus = Arc<dyn SignalBus>;
