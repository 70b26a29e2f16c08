//! wasmsched-host — Wasmtime host functions for scheduling guests.
//!
//! Provides the host side of the guest ABI:
//! - **marshal**: bounded probe-then-fetch copy of payloads into guest buffers
//! - **context**: per-call `RequestContext` (target, workload, outcome)
//! - **registry**: `HostRegistry`, binds `outcome-report`, `fetch-target`
//!   and `fetch-workload` (plus optional WASI preview1) into a `Linker`
//! - **engine**: `SchedEngine`, the configured `wasmtime::Engine` + linker,
//!   and the per-store `HostState`
//! - **observer**: hooks for profiling around a call
//! - **limiter**: per-instance memory and table caps
//! - **config**: `HostConfig`, engine and store settings

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod limiter;
pub mod marshal;
pub mod observer;
pub mod registry;

pub use config::HostConfig;
pub use context::{CallPhase, ObjectKind, RequestContext};
pub use engine::{HostState, SchedEngine};
pub use error::HostFault;
pub use observer::{CallObserver, CallStats, StatsSnapshot};
pub use registry::{HostRegistry, RegistryError};
