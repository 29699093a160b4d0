//! A short in-memory reflection history: timestamps, duration, and applied
//! update counts, mirroring the duration/success bookkeeping kept for traced
//! operations elsewhere in this workspace. Used to answer `should_reflect?`'s
//! "time since last reflection" clause and diagnostic `stats()`; never
//! exposed as a telemetry sink.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCounts {
    pub goal_updates: usize,
    pub new_goals: usize,
    pub insights: usize,
    pub learnings: usize,
    pub knowledge_nodes: usize,
    pub knowledge_edges: usize,
    pub relationships: usize,
    pub self_insight_suggestions: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionRecord {
    pub at: DateTime<Utc>,
    pub duration_ms: u64,
    pub counts: UpdateCounts,
}

/// The bounded-size history of past reflections for one agent.
#[derive(Debug, Clone, Default)]
pub struct ReflectionHistory {
    records: Vec<ReflectionRecord>,
    signals_since_last: u64,
}

const MAX_HISTORY: usize = 50;

impl ReflectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ReflectionRecord> {
        self.records.last()
    }

    pub fn push(&mut self, record: ReflectionRecord) {
        self.records.push(record);
        if self.records.len() > MAX_HISTORY {
            self.records.remove(0);
        }
        self.signals_since_last = 0;
    }

    pub fn record_signal(&mut self) {
        self.signals_since_last += 1;
    }

    /// Overwrites the counter with an authoritative count pulled from the
    /// signal bus (`SignalBus::signal_count_since(last_reflection_at)`),
    /// rather than accumulating one-at-a-time via `record_signal`.
    pub fn set_signals_since_last(&mut self, n: u64) {
        self.signals_since_last = n;
    }

    pub fn signals_since_last(&self) -> u64 {
        self.signals_since_last
    }

    pub fn records(&self) -> &[ReflectionRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_resets_signal_counter() {
        let mut h = ReflectionHistory::new();
        h.record_signal();
        h.record_signal();
        assert_eq!(h.signals_since_last(), 2);
        h.push(ReflectionRecord { at: Utc::now(), duration_ms: 10, counts: UpdateCounts::default() });
        assert_eq!(h.signals_since_last(), 0);
    }

    #[test]
    fn set_signals_since_last_overwrites_rather_than_accumulates() {
        let mut h = ReflectionHistory::new();
        h.record_signal();
        h.set_signals_since_last(7);
        assert_eq!(h.signals_since_last(), 7);
        h.set_signals_since_last(3);
        assert_eq!(h.signals_since_last(), 3);
    }

    #[test]
    fn history_is_bounded() {
        let mut h = ReflectionHistory::new();
        for _ in 0..(MAX_HISTORY + 5) {
            h.push(ReflectionRecord { at: Utc::now(), duration_ms: 1, counts: UpdateCounts::default() });
        }
        assert_eq!(h.records().len(), MAX_HISTORY);
    }
}
