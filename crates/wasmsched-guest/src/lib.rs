//! wasmsched-guest — write scheduling filters as WebAssembly guests.
//!
//! ```ignore
//! use wasmsched_guest::{Node, Pod, Verdict, export_filter};
//!
//! fn filter(target: Option<&Node>, workload: &Pod) -> Verdict {
//!     match target {
//!         Some(node) if node.unschedulable => Verdict::unschedulable("node is cordoned"),
//!         _ => Verdict::success(),
//!     }
//! }
//!
//! export_filter!(filter);
//! ```
//!
//! Build with `--target wasm32-unknown-unknown` (or `wasm32-wasip1` with
//! WASI enabled on the host) as a `cdylib`.

pub mod fetch;
pub mod host;
pub mod imports;

pub use fetch::{FetchError, INITIAL_BUFFER, probe_then_fetch};
pub use host::{Host, Verdict, run_filter_with};
#[cfg(target_arch = "wasm32")]
pub use host::{WasmHost, run_filter};
pub use wasmsched_core::{
    GuestCode, Node, Pod, Resources, SCHEMA_VERSION, Taint, TaintEffect, Toleration,
};

/// Export `filter` and `schema-version` from this guest, running `$handler`
/// (a `fn(Option<&Node>, &Pod) -> Verdict`) on every decision.
#[macro_export]
macro_rules! export_filter {
    ($handler:path) => {
        #[cfg(target_arch = "wasm32")]
        #[unsafe(export_name = "filter")]
        pub extern "C" fn __wasmsched_filter() -> u32 {
            $crate::run_filter($handler)
        }

        #[cfg(target_arch = "wasm32")]
        #[unsafe(export_name = "schema-version")]
        pub extern "C" fn __wasmsched_schema_version() -> u32 {
            $crate::SCHEMA_VERSION
        }
    };
}
