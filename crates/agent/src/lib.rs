//! The per-agent facade: owns per-agent handles
//! keyed by `agent_id` and routes every call through to the engines in
//! `cogmem-graph`, `cogmem-working-memory`, `cogmem-context`,
//! `cogmem-proposals`, and `cogmem-reflection`. The facade never owns
//! domain logic of its own — `init_for_agent` and `cleanup_for_agent` are
//! its only real operations; everything else is a thin route.

mod handle;
mod store;

pub use handle::{AgentHandle, AgentOpts};
pub use store::AgentStore;

#[cfg(test)]
mod tests {
    use super::*;
    use cogmem_config::{AppConfig, ReflectionConfig};
    use cogmem_core::external::MockLlmProvider;
    use cogmem_core::signal::InMemorySignalBus;
    use cogmem_core::{AgentId, Signal, SignalBus};
    use cogmem_graph::NodeSpec;
    use cogmem_proposals::ProposalAttrs;
    use cogmem_working_memory::ThoughtInput;
    use std::sync::Arc;

    fn store() -> AgentStore {
        AgentStore::new()
    }

    #[tokio::test]
    async fn thin_routes_delegate_to_the_right_engine() {
        let s = store();
        let agent_id = AgentId::from("a1");
        let handle = s.init_for_agent(agent_id.clone(), AppConfig::default(), AgentOpts::default()).unwrap();

        handle.with_graph_mut(|g| g.add_node(NodeSpec::new("fact", "the sky is blue"))).await.unwrap();
        let node_count = handle.with_graph(|g| g.node_count()).await;
        assert_eq!(node_count, 1);

        handle.with_working_memory_mut(|wm| wm.add_thought(ThoughtInput::from("thinking about the weather"))).await;
        let thought_count = handle.with_working_memory(|wm| wm.recent_thoughts().len()).await;
        assert_eq!(thought_count, 1);
    }

    #[tokio::test]
    async fn proposal_accept_materialises_into_the_graph_under_one_lock() {
        let s = store();
        let agent_id = AgentId::from("a1");
        let handle = s.init_for_agent(agent_id, AppConfig::default(), AgentOpts::default()).unwrap();

        let id = handle
            .with_proposals_mut(|q| q.create("fact", "rust has no GC", ProposalAttrs::default()))
            .await
            .unwrap();
        let node_id = handle.accept_proposal(&id).await.unwrap();
        let found = handle.with_graph(|g| g.get_node(&node_id).is_some()).await;
        assert!(found);
    }

    #[tokio::test]
    async fn deep_reflect_without_an_llm_provider_surfaces_an_error() {
        let s = store();
        let agent_id = AgentId::from("a1");
        let handle = s.init_for_agent(agent_id, AppConfig::default(), AgentOpts::default()).unwrap();
        let outcome = handle.deep_reflect().await;
        assert!(matches!(outcome, cogmem_reflection::ReflectOutcome::Error { .. }));
    }

    #[tokio::test]
    async fn deep_reflect_with_an_llm_applies_updates() {
        let s = store();
        let agent_id = AgentId::from("a1");
        let opts = AgentOpts { llm: Some(Arc::new(MockLlmProvider::canned("{}"))), ..Default::default() };
        let handle = s.init_for_agent(agent_id, AppConfig::default(), opts).unwrap();
        let outcome = handle.deep_reflect().await;
        assert!(matches!(outcome, cogmem_reflection::ReflectOutcome::Ok { .. }));
    }

    #[tokio::test]
    async fn maybe_reflect_gates_on_real_signal_counts_pulled_from_the_bus() {
        let s = store();
        let agent_id = AgentId::from("a1");
        let bus = Arc::new(InMemorySignalBus::new());
        let cfg = AppConfig {
            reflection: ReflectionConfig { interval_ms: 0, signal_threshold: 0, ..ReflectionConfig::default() },
            ..AppConfig::default()
        };
        let opts = AgentOpts {
            llm: Some(Arc::new(MockLlmProvider::canned("{}"))),
            signal_bus: Some(bus.clone()),
            ..Default::default()
        };
        let handle = s.init_for_agent(agent_id.clone(), cfg, opts).unwrap();

        let first = handle.deep_reflect().await;
        assert!(matches!(first, cogmem_reflection::ReflectOutcome::Ok { .. }));

        // No signals since that reflection: the gate should skip.
        let skipped = handle.maybe_reflect(false).await;
        assert_eq!(skipped, cogmem_reflection::ReflectOutcome::Skipped);

        // A real signal lands on the bus; the synced counter should now
        // clear the threshold and let the gate fire.
        bus.publish(Signal::new(agent_id.clone(), "thought_recorded", serde_json::json!({"content": "hi"}))).await;
        let fired = handle.maybe_reflect(false).await;
        assert!(matches!(fired, cogmem_reflection::ReflectOutcome::Ok { .. }));
    }

    #[test]
    fn cleanup_for_agent_tears_down_the_handle() {
        let s = store();
        let agent_id = AgentId::from("a1");
        s.init_for_agent(agent_id.clone(), AppConfig::default(), AgentOpts::default()).unwrap();
        s.cleanup_for_agent(&agent_id).unwrap();
        assert!(s.get(&agent_id).is_err());
    }
}
