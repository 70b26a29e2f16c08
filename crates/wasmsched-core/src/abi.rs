//! The host/guest function table.
//!
//! Every parameter and result is a 32-bit integer holding a byte offset into
//! guest linear memory or a byte length.
//!
//! | Module      | Function         | Params            | Result |
//! |-------------|------------------|-------------------|--------|
//! | `scheduler` | `outcome-report` | `(ptr, size)`     | —      |
//! | `api`       | `fetch-target`   | `(buf, buf_limit)`| length |
//! | `api`       | `fetch-workload` | `(buf, buf_limit)`| length |

/// Namespace of functions that report results back to the host.
pub const SCHEDULER_MODULE: &str = "scheduler";
/// Namespace of functions that export host objects to the guest.
pub const API_MODULE: &str = "api";

pub const OUTCOME_REPORT: &str = "outcome-report";
pub const FETCH_TARGET: &str = "fetch-target";
pub const FETCH_WORKLOAD: &str = "fetch-workload";

/// Decision entrypoint exported by the guest: `() -> i32`.
pub const FILTER_EXPORT: &str = "filter";
/// Linear memory exported by the guest.
pub const MEMORY_EXPORT: &str = "memory";
/// Optional guest export `() -> i32` naming the payload schema it decodes.
pub const SCHEMA_VERSION_EXPORT: &str = "schema-version";
/// Optional reactor initializer, called once after instantiation.
pub const INITIALIZE_EXPORT: &str = "_initialize";

/// Outcome text used when the guest reports from an invalid memory range.
pub const OUTCOME_READ_FAULT: &str = "BUG: out of memory reading message";

/// Shape of one host function as seen by the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFunction {
    pub module: &'static str,
    pub name: &'static str,
    /// Number of `i32` parameters.
    pub params: usize,
    /// Number of `i32` results.
    pub results: usize,
}

pub const HOST_FUNCTIONS: [HostFunction; 3] = [
    HostFunction {
        module: SCHEDULER_MODULE,
        name: OUTCOME_REPORT,
        params: 2,
        results: 0,
    },
    HostFunction {
        module: API_MODULE,
        name: FETCH_TARGET,
        params: 2,
        results: 1,
    },
    HostFunction {
        module: API_MODULE,
        name: FETCH_WORKLOAD,
        params: 2,
        results: 1,
    },
];

/// Whether `module` is a namespace owned by this ABI.
pub fn is_abi_module(module: &str) -> bool {
    module == SCHEDULER_MODULE || module == API_MODULE
}

/// Look up a host function by its import coordinates.
pub fn host_function(module: &str, name: &str) -> Option<&'static HostFunction> {
    HOST_FUNCTIONS
        .iter()
        .find(|f| f.module == module && f.name == name)
}
