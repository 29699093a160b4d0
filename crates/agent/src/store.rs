//! The process-wide table of per-agent handles: disjoint
//! `agent_id` keys never contend on the same lock, since each agent's
//! engines live behind their own lock inside a keyed table.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cogmem_config::AppConfig;
use cogmem_core::error::{Error, FacadeError};
use cogmem_core::AgentId;

use crate::handle::{AgentHandle, AgentOpts};

/// Owns every initialised agent's [`AgentHandle`]. Cheap to clone — it's
/// just an `Arc` around the table.
#[derive(Clone, Default)]
pub struct AgentStore {
    agents: Arc<RwLock<HashMap<AgentId, Arc<AgentHandle>>>>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the graph, working memory, context window, and proposal
    /// queue for `agent_id`: initialising an agent creates its graph and
    /// every other per-agent engine in one call.
    pub fn init_for_agent(&self, agent_id: AgentId, cfg: AppConfig, opts: AgentOpts) -> Result<Arc<AgentHandle>, Error> {
        let mut agents = self.agents.write().unwrap_or_else(|poison| poison.into_inner());
        if agents.contains_key(&agent_id) {
            return Err(FacadeError::AgentAlreadyInitialised(agent_id).into());
        }
        let handle = AgentHandle::new(agent_id.clone(), cfg, opts)?;
        agents.insert(agent_id, handle.clone());
        Ok(handle)
    }

    /// Tears down `agent_id`'s engines. Idempotent-adjacent: calling it
    /// twice surfaces `UnknownAgent` the second time rather than panicking.
    pub fn cleanup_for_agent(&self, agent_id: &AgentId) -> Result<(), Error> {
        let mut agents = self.agents.write().unwrap_or_else(|poison| poison.into_inner());
        agents.remove(agent_id).ok_or_else(|| FacadeError::UnknownAgent(agent_id.clone()))?;
        Ok(())
    }

    pub fn get(&self, agent_id: &AgentId) -> Result<Arc<AgentHandle>, Error> {
        let agents = self.agents.read().unwrap_or_else(|poison| poison.into_inner());
        agents.get(agent_id).cloned().ok_or_else(|| FacadeError::UnknownAgent(agent_id.clone()).into())
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        let agents = self.agents.read().unwrap_or_else(|poison| poison.into_inner());
        agents.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap_or_else(|poison| poison.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_then_cleanup_round_trips() {
        let store = AgentStore::new();
        let agent_id = AgentId::from("a1");
        store.init_for_agent(agent_id.clone(), AppConfig::default(), AgentOpts::default()).unwrap();
        assert!(store.contains(&agent_id));
        store.cleanup_for_agent(&agent_id).unwrap();
        assert!(!store.contains(&agent_id));
    }

    #[test]
    fn double_init_is_an_error() {
        let store = AgentStore::new();
        let agent_id = AgentId::from("a1");
        store.init_for_agent(agent_id.clone(), AppConfig::default(), AgentOpts::default()).unwrap();
        let err = store.init_for_agent(agent_id.clone(), AppConfig::default(), AgentOpts::default()).unwrap_err();
        assert!(matches!(err, Error::Facade(FacadeError::AgentAlreadyInitialised(_))));
    }

    #[test]
    fn unknown_agent_surfaces_as_an_error() {
        let store = AgentStore::new();
        let agent_id = AgentId::from("missing");
        let err = store.get(&agent_id).unwrap_err();
        assert!(matches!(err, Error::Facade(FacadeError::UnknownAgent(_))));
        let err = store.cleanup_for_agent(&agent_id).unwrap_err();
        assert!(matches!(err, Error::Facade(FacadeError::UnknownAgent(_))));
    }

    #[test]
    fn distinct_agents_are_independent() {
        let store = AgentStore::new();
        store.init_for_agent(AgentId::from("a1"), AppConfig::default(), AgentOpts::default()).unwrap();
        store.init_for_agent(AgentId::from("a2"), AppConfig::default(), AgentOpts::default()).unwrap();
        assert_eq!(store.len(), 2);
    }
}
