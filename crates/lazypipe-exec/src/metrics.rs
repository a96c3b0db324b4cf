//! Per-run counters, logged through `tracing` when enabled in the config.

use lazypipe_core::flow::SignalCounters;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunMetrics {
    /// Items delivered to the chain (from every feed).
    pub items_pulled: u64,
    pub items_emitted: u64,
    pub restarts: u64,
    pub continuations: u64,
    pub resumptions: u64,
    pub limits: u64,
    pub forgotten: u64,
    pub push_backs: u64,
    /// The run ended through `stop()` rather than natural exhaustion.
    pub stopped_early: bool,
}

impl RunMetrics {
    pub fn collect(counters: SignalCounters, pulled: u64, emitted: u64, stopped: bool) -> Self {
        Self {
            items_pulled: pulled,
            items_emitted: emitted,
            restarts: counters.restarts,
            continuations: counters.continuations,
            resumptions: counters.resumptions,
            limits: counters.limits,
            forgotten: counters.forgets,
            push_backs: counters.push_backs,
            stopped_early: stopped,
        }
    }

    pub fn emit(&self) {
        tracing::info!(
            pulled = self.items_pulled,
            emitted = self.items_emitted,
            restarts = self.restarts,
            continuations = self.continuations,
            resumptions = self.resumptions,
            limits = self.limits,
            forgotten = self.forgotten,
            push_backs = self.push_backs,
            stopped_early = self.stopped_early,
            "run metrics"
        );
    }
}
