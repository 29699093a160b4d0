//! The proposal queue itself: creation with content+type dedup, listing,
//! and the lifecycle transitions.

use chrono::Utc;
use cogmem_core::error::ProposalError;
use cogmem_core::{AgentId, ProposalId};

use crate::proposal::{Proposal, ProposalAttrs, ProposalStatus, ProposalType, DEFAULT_CONFIDENCE};

/// Sort order for [`ProposalQueue::list_pending`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBy {
    #[default]
    CreatedAtDesc,
    ConfidenceDesc,
}

#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    pub proposal_type: Option<ProposalType>,
    pub limit: Option<usize>,
    pub sort_by: SortBy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProposalStats {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub deferred: usize,
}

/// The per-agent proposal queue. Owned exclusively by one agent, mirroring
/// `KnowledgeGraph`'s and `WorkingMemory`'s layout.
#[derive(Debug, Clone)]
pub struct ProposalQueue {
    pub agent_id: AgentId,
    pub(crate) proposals: Vec<Proposal>,
}

impl ProposalQueue {
    pub fn new(agent_id: AgentId) -> Self {
        Self { agent_id, proposals: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn all(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Creates a proposal, returning the existing id when an exact
    /// content+type duplicate is already queued.
    pub fn create(
        &mut self,
        proposal_type: &str,
        content: impl Into<String>,
        attrs: ProposalAttrs,
    ) -> Result<ProposalId, ProposalError> {
        let proposal_type = ProposalType::parse(proposal_type).ok_or_else(|| ProposalError::UnknownType(proposal_type.to_string()))?;
        let content = content.into();
        if content.is_empty() {
            return Err(ProposalError::EmptyContent);
        }

        if let Some(existing) = self
            .proposals
            .iter()
            .find(|p| p.proposal_type == proposal_type && p.content == content)
        {
            return Ok(existing.id.clone());
        }

        let id = ProposalId::generate();
        let proposal = Proposal {
            id: id.clone(),
            agent_id: self.agent_id.as_str().to_string(),
            proposal_type,
            content,
            confidence: attrs.confidence.unwrap_or(DEFAULT_CONFIDENCE).clamp(0.0, 1.0),
            status: ProposalStatus::Pending,
            source: attrs.source,
            evidence: attrs.evidence,
            metadata: attrs.metadata,
            created_at: Utc::now(),
        };
        tracing::debug!(agent_id = %self.agent_id, proposal_id = %id, "proposal created");
        self.proposals.push(proposal);
        Ok(id)
    }

    pub fn get(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.iter().find(|p| &p.id == id)
    }

    fn get_mut(&mut self, id: &ProposalId) -> Result<&mut Proposal, ProposalError> {
        self.proposals
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| ProposalError::NotFound(id.clone()))
    }

    pub fn list_pending(&self, opts: ListOpts) -> Vec<&Proposal> {
        let mut pending: Vec<&Proposal> = self
            .proposals
            .iter()
            .filter(|p| p.status == ProposalStatus::Pending)
            .filter(|p| opts.proposal_type.is_none_or(|t| p.proposal_type == t))
            .collect();

        match opts.sort_by {
            SortBy::CreatedAtDesc => pending.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortBy::ConfidenceDesc => pending.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal)),
        }

        if let Some(limit) = opts.limit {
            pending.truncate(limit);
        }
        pending
    }

    fn require_transition(&self, current: ProposalStatus, allowed: &[ProposalStatus]) -> Result<(), ProposalError> {
        if allowed.contains(&current) {
            return Ok(());
        }
        let expected = allowed.iter().map(|s| s.as_str()).collect::<Vec<_>>().join("|");
        Err(ProposalError::InvalidStatus { current: current.as_str().to_string(), expected })
    }

    /// Marks `pending → rejected`.
    pub fn reject(&mut self, id: &ProposalId) -> Result<(), ProposalError> {
        let current = self.get(id).ok_or_else(|| ProposalError::NotFound(id.clone()))?.status;
        self.require_transition(current, &[ProposalStatus::Pending])?;
        self.get_mut(id)?.status = ProposalStatus::Rejected;
        Ok(())
    }

    /// Marks `pending → deferred`.
    pub fn defer(&mut self, id: &ProposalId) -> Result<(), ProposalError> {
        let current = self.get(id).ok_or_else(|| ProposalError::NotFound(id.clone()))?.status;
        self.require_transition(current, &[ProposalStatus::Pending])?;
        self.get_mut(id)?.status = ProposalStatus::Deferred;
        Ok(())
    }

    /// Marks `deferred → pending`, the only way back out of deferral.
    pub fn undefer(&mut self, id: &ProposalId) -> Result<(), ProposalError> {
        let current = self.get(id).ok_or_else(|| ProposalError::NotFound(id.clone()))?.status;
        self.require_transition(current, &[ProposalStatus::Deferred])?;
        self.get_mut(id)?.status = ProposalStatus::Pending;
        Ok(())
    }

    pub fn count_pending(&self) -> usize {
        self.proposals.iter().filter(|p| p.status == ProposalStatus::Pending).count()
    }

    pub fn stats(&self) -> ProposalStats {
        let mut stats = ProposalStats::default();
        for p in &self.proposals {
            match p.status {
                ProposalStatus::Pending => stats.pending += 1,
                ProposalStatus::Accepted => stats.accepted += 1,
                ProposalStatus::Rejected => stats.rejected += 1,
                ProposalStatus::Deferred => stats.deferred += 1,
            }
        }
        stats
    }

    pub fn delete_all(&mut self) {
        self.proposals.clear();
    }

    pub(crate) fn check_acceptable(&self, id: &ProposalId) -> Result<(), ProposalError> {
        let proposal = self.get(id).ok_or_else(|| ProposalError::NotFound(id.clone()))?;
        self.require_transition(proposal.status, &[ProposalStatus::Pending])
    }

    pub(crate) fn mark_accepted(&mut self, id: &ProposalId) -> Result<(), ProposalError> {
        let proposal = self.get_mut(id)?;
        proposal.status = ProposalStatus::Accepted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> ProposalQueue {
        ProposalQueue::new(AgentId::from("a1"))
    }

    #[test]
    fn create_dedups_exact_content_and_type() {
        let mut q = queue();
        let id1 = q.create("fact", "the sky is blue", ProposalAttrs::default()).unwrap();
        let id2 = q.create("fact", "the sky is blue", ProposalAttrs::default()).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn different_types_never_dedup() {
        let mut q = queue();
        q.create("fact", "x", ProposalAttrs::default()).unwrap();
        q.create("insight", "x", ProposalAttrs::default()).unwrap();
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn unknown_type_and_empty_content_are_rejected() {
        let mut q = queue();
        assert!(matches!(q.create("not_a_type", "x", ProposalAttrs::default()), Err(ProposalError::UnknownType(_))));
        assert!(matches!(q.create("fact", "", ProposalAttrs::default()), Err(ProposalError::EmptyContent)));
    }

    #[test]
    fn reject_then_reject_again_fails_invalid_status() {
        let mut q = queue();
        let id = q.create("fact", "x", ProposalAttrs::default()).unwrap();
        q.reject(&id).unwrap();
        assert!(matches!(q.reject(&id), Err(ProposalError::InvalidStatus { .. })));
    }

    #[test]
    fn defer_then_undefer_returns_to_pending() {
        let mut q = queue();
        let id = q.create("fact", "x", ProposalAttrs::default()).unwrap();
        q.defer(&id).unwrap();
        assert_eq!(q.get(&id).unwrap().status, ProposalStatus::Deferred);
        q.undefer(&id).unwrap();
        assert_eq!(q.get(&id).unwrap().status, ProposalStatus::Pending);
    }

    #[test]
    fn list_pending_filters_by_type_and_sorts_by_confidence() {
        let mut q = queue();
        q.create("fact", "low", ProposalAttrs { confidence: Some(0.2), ..Default::default() }).unwrap();
        q.create("fact", "high", ProposalAttrs { confidence: Some(0.9), ..Default::default() }).unwrap();
        q.create("insight", "other", ProposalAttrs::default()).unwrap();

        let facts = q.list_pending(ListOpts { proposal_type: Some(ProposalType::Fact), sort_by: SortBy::ConfidenceDesc, limit: None });
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].content, "high");
    }

    #[test]
    fn stats_counts_each_status() {
        let mut q = queue();
        let id1 = q.create("fact", "a", ProposalAttrs::default()).unwrap();
        q.create("fact", "b", ProposalAttrs::default()).unwrap();
        q.reject(&id1).unwrap();
        let stats = q.stats();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.rejected, 1);
    }
}
