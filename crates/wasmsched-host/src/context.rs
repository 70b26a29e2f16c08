//! Per-call request state.
//!
//! A [`RequestContext`] lives for exactly one decision call. It is created by
//! the invocation adapter, installed into one store for the duration of the
//! guest call, and dropped afterwards. Host functions only ever see the
//! context of the call they were invoked from.

use std::fmt;
use std::sync::Arc;

use wasmsched_core::codec::{self, CodecError};
use wasmsched_core::{Node, Pod};

/// Which host object a fetch function exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Target,
    Workload,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Target => f.write_str("target"),
            ObjectKind::Workload => f.write_str("workload"),
        }
    }
}

/// Lifecycle of one decision call.
///
/// `Idle → ContextAttached → GuestExecuting → OutcomeCollected` on success,
/// `GuestExecuting → Trapped` when the guest faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    Idle,
    ContextAttached,
    GuestExecuting,
    OutcomeCollected,
    Trapped,
}

/// Target, workload and outcome message of one decision call.
#[derive(Debug)]
pub struct RequestContext {
    target: Option<Arc<Node>>,
    workload: Arc<Pod>,
    outcome: String,
}

impl RequestContext {
    /// A fresh context with an empty outcome. A missing target is exported
    /// to the guest as the empty payload.
    pub fn new(target: Option<Arc<Node>>, workload: Arc<Pod>) -> Self {
        Self {
            target,
            workload,
            outcome: String::new(),
        }
    }

    pub fn target(&self) -> Option<&Node> {
        self.target.as_deref()
    }

    pub fn workload(&self) -> &Pod {
        &self.workload
    }

    pub fn outcome(&self) -> &str {
        &self.outcome
    }

    /// Replace the outcome message. Last write wins.
    pub fn set_outcome(&mut self, outcome: String) {
        self.outcome = outcome;
    }

    pub fn into_outcome(self) -> String {
        self.outcome
    }

    /// Encode one of the context's objects with the payload codec.
    pub fn encode(&self, kind: ObjectKind) -> Result<Vec<u8>, CodecError> {
        match kind {
            ObjectKind::Target => codec::encode(self.target()),
            ObjectKind::Workload => codec::encode(Some(self.workload())),
        }
    }
}
