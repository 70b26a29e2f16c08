//! Raw host imports. Every argument is a guest memory offset or a length.

/// `(module, name)` of every function declared below, in declaration order.
pub const DECLARED: [(&str, &str); 3] = [
    ("scheduler", "outcome-report"),
    ("api", "fetch-target"),
    ("api", "fetch-workload"),
];

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "scheduler")]
unsafe extern "C" {
    #[link_name = "outcome-report"]
    pub fn outcome_report(ptr: u32, size: u32);
}

#[cfg(target_arch = "wasm32")]
#[link(wasm_import_module = "api")]
unsafe extern "C" {
    #[link_name = "fetch-target"]
    pub fn fetch_target(buf: u32, buf_limit: u32) -> u32;

    #[link_name = "fetch-workload"]
    pub fn fetch_workload(buf: u32, buf_limit: u32) -> u32;
}
