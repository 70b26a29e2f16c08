//! wasmsched-runtime — loading and running scheduling guests.
//!
//! # Architecture
//!
//! ```text
//! .wasm bytes ──► GuestModule (compile + linkage check + InstancePre)
//!                      │
//!                      ▼
//!               InstancePool ──checkout──► Lease ──attach──► CallHandle
//!                 (bounded)  ◄──release───        ◄──finish── (invoke)
//! ```
//!
//! - **module**: compiles a guest and rejects ABI mismatches at load time
//! - **instance**: one store per instance; `CallHandle` scopes a request
//!   to a single call and tracks its phase
//! - **pool**: bounded, non-reentrant instance reuse
//! - **ticker**: epoch ticker backing per-call deadlines

pub mod error;
pub mod instance;
pub mod module;
pub mod pool;
pub mod ticker;

pub use error::{LinkageError, RuntimeError, RuntimeResult};
pub use instance::{CallBudget, CallHandle, GuestInstance, NO_DEADLINE_TICKS, UNMETERED_FUEL};
pub use module::GuestModule;
pub use pool::{InstanceFactory, InstancePool, Lease, PoolConfig};
pub use ticker::{EPOCH_TICK, EpochTicker, deadline_ticks};
