//! Call observers — the profiling seam around a decision call.
//!
//! An observer is attached to a single call. Wasm/host transitions reach it
//! through the store's call hook; with no observer attached the hook is a
//! no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use wasmtime::CallHook;

use crate::context::CallPhase;

/// Hooks invoked around one decision call. All methods default to no-ops.
pub trait CallObserver: Send + Sync {
    /// The guest entrypoint is about to run for `workload` (`namespace/name`).
    fn call_started(&self, _workload: &str) {}

    /// A transition between host and guest code.
    fn transition(&self, _hook: CallHook) {}

    /// The call ended in `phase` (`OutcomeCollected` or `Trapped`).
    fn call_finished(&self, _phase: CallPhase, _elapsed: Duration) {}
}

/// Observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {}

/// Counting observer: calls, host calls, traps, and total call time.
#[derive(Debug, Default)]
pub struct CallStats {
    calls: AtomicU64,
    host_calls: AtomicU64,
    traps: AtomicU64,
    elapsed_nanos: AtomicU64,
}

/// Point-in-time copy of [`CallStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub calls: u64,
    pub host_calls: u64,
    pub traps: u64,
    pub elapsed: Duration,
}

impl CallStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            host_calls: self.host_calls.load(Ordering::Relaxed),
            traps: self.traps.load(Ordering::Relaxed),
            elapsed: Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed)),
        }
    }
}

impl CallObserver for CallStats {
    fn call_started(&self, _workload: &str) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn transition(&self, hook: CallHook) {
        if matches!(hook, CallHook::CallingHost) {
            self.host_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn call_finished(&self, phase: CallPhase, elapsed: Duration) {
        if phase == CallPhase::Trapped {
            self.traps.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_host_calls_only() {
        let stats = CallStats::new();
        stats.call_started("default/web-0");
        stats.transition(CallHook::CallingWasm);
        stats.transition(CallHook::CallingHost);
        stats.transition(CallHook::ReturningFromHost);
        stats.transition(CallHook::CallingHost);
        stats.transition(CallHook::ReturningFromHost);
        stats.transition(CallHook::ReturningFromWasm);
        stats.call_finished(CallPhase::OutcomeCollected, Duration::from_millis(3));

        let snap = stats.snapshot();
        assert_eq!(snap.calls, 1);
        assert_eq!(snap.host_calls, 2);
        assert_eq!(snap.traps, 0);
        assert_eq!(snap.elapsed, Duration::from_millis(3));
    }

    #[test]
    fn stats_count_traps() {
        let stats = CallStats::new();
        stats.call_started("default/web-0");
        stats.call_finished(CallPhase::Trapped, Duration::ZERO);
        assert_eq!(stats.snapshot().traps, 1);
    }
}
