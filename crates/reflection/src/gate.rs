//! `should_reflect?`: true when there's no prior reflection, or both the
//! interval has elapsed and the signal count exceeds the threshold.

use chrono::Utc;
use cogmem_config::ReflectionConfig;

use crate::history::ReflectionHistory;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShouldReflectOpts {
    pub force: bool,
}

pub fn should_reflect(history: &ReflectionHistory, cfg: &ReflectionConfig, opts: ShouldReflectOpts) -> bool {
    if opts.force {
        return true;
    }
    let Some(last) = history.last() else {
        return true;
    };
    let elapsed_ms = (Utc::now() - last.at).num_milliseconds().max(0) as u64;
    elapsed_ms >= cfg.interval_ms && history.signals_since_last() > cfg.signal_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ReflectionRecord, UpdateCounts};

    #[test]
    fn no_prior_reflection_always_reflects() {
        let history = ReflectionHistory::new();
        assert!(should_reflect(&history, &ReflectionConfig::default(), ShouldReflectOpts::default()));
    }

    #[test]
    fn recent_reflection_with_few_signals_does_not_reflect() {
        let mut history = ReflectionHistory::new();
        history.push(ReflectionRecord { at: Utc::now(), duration_ms: 1, counts: UpdateCounts::default() });
        history.record_signal();
        assert!(!should_reflect(&history, &ReflectionConfig::default(), ShouldReflectOpts::default()));
    }

    #[test]
    fn force_bypasses_the_gate() {
        let mut history = ReflectionHistory::new();
        history.push(ReflectionRecord { at: Utc::now(), duration_ms: 1, counts: UpdateCounts::default() });
        assert!(should_reflect(&history, &ReflectionConfig::default(), ShouldReflectOpts { force: true }));
    }
}
