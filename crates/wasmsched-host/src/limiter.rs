//! GuestLimiter — memory and table caps for one guest instance.
//!
//! Implements `wasmtime::ResourceLimiter`. A denied memory growth surfaces in
//! the guest as a failed `memory.grow`; guests that treat that as fatal trap,
//! and the trap is reported like any other.

use wasmtime::ResourceLimiter;

/// Default linear memory cap (64 MiB).
pub const DEFAULT_MEMORY_LIMIT: usize = 64 * 1024 * 1024;
/// Default table element cap.
pub const DEFAULT_TABLE_LIMIT: usize = 10_000;

pub struct GuestLimiter {
    memory_limit: usize,
    table_limit: usize,
    /// Largest memory size granted so far.
    peak_memory: usize,
}

impl GuestLimiter {
    pub fn new(memory_limit: usize, table_limit: usize) -> Self {
        Self {
            memory_limit,
            table_limit,
            peak_memory: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MEMORY_LIMIT, DEFAULT_TABLE_LIMIT)
    }

    pub fn memory_limit(&self) -> usize {
        self.memory_limit
    }

    /// High-water mark of granted linear memory, in bytes.
    pub fn peak_memory(&self) -> usize {
        self.peak_memory
    }
}

impl ResourceLimiter for GuestLimiter {
    fn memory_growing(
        &mut self,
        current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired > self.memory_limit {
            tracing::warn!(
                current,
                desired,
                limit = self.memory_limit,
                "guest memory growth denied"
            );
            return Ok(false);
        }
        self.peak_memory = self.peak_memory.max(desired);
        Ok(true)
    }

    fn table_growing(
        &mut self,
        current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        if desired > self.table_limit {
            tracing::warn!(
                current,
                desired,
                limit = self.table_limit,
                "guest table growth denied"
            );
            Ok(false)
        } else {
            Ok(true)
        }
    }
}
