//! A single agent's bundled state: the four engines plus the external
//! collaborators it was wired up with. The facade never inspects or
//! mutates any of this directly — every call borrows the lock, delegates
//! to the owning crate, and releases it.

use std::sync::Arc;

use cogmem_config::AppConfig;
use cogmem_context::ContextWindow;
use cogmem_core::error::Error;
use cogmem_core::external::{SharedEmbeddingStore, SharedLlmProvider, SharedRelationshipStore};
use cogmem_core::signal::SharedSignalBus;
use cogmem_core::AgentId;
use cogmem_graph::KnowledgeGraph;
use cogmem_proposals::ProposalQueue;
use cogmem_reflection::{deep_reflect, DeepReflectInputs, DeepReflectOpts, ReflectOutcome, ReflectionHistory};
use cogmem_working_memory::WorkingMemory;
use tokio::sync::RwLock;

/// External collaborators an agent may be wired up with. Every field is
/// optional: a facade with no LLM provider can still do everything except
/// reflection and summarisation-backed compression — narrow traits,
/// graceful absence when a collaborator isn't wired up.
#[derive(Clone, Default)]
pub struct AgentOpts {
    pub llm: Option<SharedLlmProvider>,
    pub embeddings: Option<SharedEmbeddingStore>,
    pub relationships: Option<SharedRelationshipStore>,
    pub signal_bus: Option<SharedSignalBus>,
    pub multi_layer_context: bool,
    pub model_context: Option<u64>,
}

struct AgentState {
    graph: KnowledgeGraph,
    working_memory: WorkingMemory,
    context: ContextWindow,
    proposals: ProposalQueue,
    reflection_history: ReflectionHistory,
}

/// One agent's owned engines behind a single lock: an `Arc<RwLock<...>>`
/// around a struct of engines rather than a single vec.
pub struct AgentHandle {
    pub agent_id: AgentId,
    cfg: AppConfig,
    opts: AgentOpts,
    state: RwLock<AgentState>,
}

impl AgentHandle {
    pub(crate) fn new(agent_id: AgentId, cfg: AppConfig, opts: AgentOpts) -> Result<Arc<Self>, Error> {
        let model_context = opts.model_context.unwrap_or(cogmem_tokens::DEFAULT_MODEL_CONTEXT as u64);
        let context =
            ContextWindow::from_config(agent_id.clone(), &cfg.context, &cfg.summarizer, opts.multi_layer_context, model_context)?;
        let state = AgentState {
            graph: KnowledgeGraph::new(agent_id.clone(), cfg.graph.clone()),
            working_memory: WorkingMemory::from_config(agent_id.clone(), &cfg.working_memory),
            context,
            proposals: ProposalQueue::new(agent_id.clone()),
            reflection_history: ReflectionHistory::new(),
        };
        Ok(Arc::new(Self { agent_id, cfg, opts, state: RwLock::new(state) }))
    }

    // ── Generic thin routes ─────────────────────────────────────────────
    //
    // The facade owns no domain logic: every operation beyond
    // init/cleanup is one of these four read/write accessors closing over
    // the caller's own call into `cogmem-graph` / `cogmem-working-memory` /
    // `cogmem-context` / `cogmem-proposals`.

    pub async fn with_graph<R>(&self, f: impl FnOnce(&KnowledgeGraph) -> R) -> R {
        let state = self.state.read().await;
        f(&state.graph)
    }

    pub async fn with_graph_mut<R>(&self, f: impl FnOnce(&mut KnowledgeGraph) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state.graph)
    }

    pub async fn with_working_memory<R>(&self, f: impl FnOnce(&WorkingMemory) -> R) -> R {
        let state = self.state.read().await;
        f(&state.working_memory)
    }

    pub async fn with_working_memory_mut<R>(&self, f: impl FnOnce(&mut WorkingMemory) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state.working_memory)
    }

    pub async fn with_context<R>(&self, f: impl FnOnce(&ContextWindow) -> R) -> R {
        let state = self.state.read().await;
        f(&state.context)
    }

    pub async fn with_context_mut<R>(&self, f: impl FnOnce(&mut ContextWindow) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state.context)
    }

    pub async fn with_proposals<R>(&self, f: impl FnOnce(&ProposalQueue) -> R) -> R {
        let state = self.state.read().await;
        f(&state.proposals)
    }

    pub async fn with_proposals_mut<R>(&self, f: impl FnOnce(&mut ProposalQueue) -> R) -> R {
        let mut state = self.state.write().await;
        f(&mut state.proposals)
    }

    pub async fn reflection_history(&self) -> ReflectionHistory {
        self.state.read().await.reflection_history.clone()
    }

    // ── Orchestrated routes ──────────────────────────────────────────────
    //
    // Thin, but spanning more than one engine at once, so they live here
    // rather than forcing every caller to reimplement the locking order.

    /// Accepts a pending proposal, materialising it into the knowledge
    /// graph under the shared lock both engines live behind.
    pub async fn accept_proposal(&self, id: &cogmem_core::ProposalId) -> Result<cogmem_core::NodeId, Error> {
        let mut state = self.state.write().await;
        let AgentState { proposals, graph, .. } = &mut *state;
        proposals.accept(id, graph).map_err(Error::from)
    }

    pub async fn accept_all_proposals(&self) -> Vec<cogmem_core::NodeId> {
        let mut state = self.state.write().await;
        let AgentState { proposals, graph, .. } = &mut *state;
        proposals.accept_all(graph)
    }

    /// Runs `deep_reflect` unconditionally. Recent thinking/activity are
    /// pulled from the wired signal bus when present.
    pub async fn deep_reflect(&self) -> ReflectOutcome {
        self.run_reflection(DeepReflectOpts { force: true }, true).await
    }

    /// Runs `deep_reflect` only if `should_reflect?` says to.
    pub async fn maybe_reflect(&self, force: bool) -> ReflectOutcome {
        self.run_reflection(DeepReflectOpts { force }, false).await
    }

    async fn run_reflection(&self, opts: DeepReflectOpts, always_run: bool) -> ReflectOutcome {
        let Some(llm) = &self.opts.llm else {
            tracing::warn!(agent_id = %self.agent_id, "no LLM provider wired, cannot reflect");
            return ReflectOutcome::Error { reason: "no LLM provider configured for this agent".to_string() };
        };

        let recent_activity = self.recent_activity_lines().await;
        if !always_run {
            self.sync_signal_count().await;
        }

        let mut state = self.state.write().await;
        let AgentState { graph, working_memory, reflection_history, .. } = &mut *state;

        let inputs = DeepReflectInputs { recent_thinking: Vec::new(), recent_activity: recent_activity.iter().map(String::as_str).collect() };

        if always_run {
            deep_reflect(
                &self.agent_id,
                graph,
                working_memory,
                reflection_history,
                &self.cfg.reflection,
                llm.as_ref(),
                self.opts.relationships.as_deref(),
                inputs,
            )
            .await
        } else {
            cogmem_reflection::maybe_reflect(
                &self.agent_id,
                graph,
                working_memory,
                reflection_history,
                &self.cfg.reflection,
                llm.as_ref(),
                self.opts.relationships.as_deref(),
                inputs,
                opts,
            )
            .await
        }
    }

    /// Pulls `SignalBus::signal_count_since(last_reflection_at)` and feeds
    /// it into the reflection history so `should_reflect?`'s signal-count
    /// clause is driven by real bus activity rather than staying at zero
    /// forever. A no-op when there's no wired bus or no prior reflection —
    /// the gate fires unconditionally in the latter case regardless.
    async fn sync_signal_count(&self) {
        let Some(bus) = &self.opts.signal_bus else { return };
        let since = {
            let state = self.state.read().await;
            match state.reflection_history.last() {
                Some(record) => record.at,
                None => return,
            }
        };
        let count = bus.signal_count_since(&self.agent_id, since).await;
        let mut state = self.state.write().await;
        state.reflection_history.set_signals_since_last(count);
    }

    async fn recent_activity_lines(&self) -> Vec<String> {
        let Some(bus) = &self.opts.signal_bus else { return Vec::new() };
        bus.recent_percepts(&self.agent_id, 10)
            .await
            .into_iter()
            .map(|p| p.payload.to_string())
            .collect()
    }
}
