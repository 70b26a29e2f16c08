//! wasmsched-plugin — scheduling decisions backed by a WebAssembly guest.
//!
//! # Architecture
//!
//! ```text
//! filter(target, workload)
//!   │
//!   ├── InstancePool::checkout            (waits at max_instances)
//!   ├── GuestInstance::attach             Idle → ContextAttached
//!   ├── CallHandle::invoke                → GuestExecuting
//!   │     guest: fetch-target / fetch-workload / outcome-report
//!   ├── return code + outcome             → OutcomeCollected | Trapped
//!   ├── CallHandle drop                   context discarded
//!   ├── InstancePool::release             trapped instance dropped
//!   │
//!   ▼
//! Decision { code, message }  or  PluginError::{Trap, HostFault, ..}
//! ```

pub mod decision;
pub mod error;
pub mod plugin;

pub use decision::Decision;
pub use error::{PluginError, PluginResult};
pub use plugin::FilterPlugin;
