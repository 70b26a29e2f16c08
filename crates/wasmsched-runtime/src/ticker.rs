//! Epoch ticker — advances an engine's epoch at a fixed rate so per-call
//! deadlines can interrupt guests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wasmtime::Engine;

/// Interval between epoch increments.
pub const EPOCH_TICK: Duration = Duration::from_millis(10);

/// Number of ticks covering `timeout`, rounded up, at least one.
pub fn deadline_ticks(timeout: Duration) -> u64 {
    let ticks = timeout.as_nanos().div_ceil(EPOCH_TICK.as_nanos()).max(1);
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// Background thread incrementing an engine's epoch every [`EPOCH_TICK`].
///
/// Runs on a plain thread so it keeps ticking while a current-thread tokio
/// runtime is busy polling a guest. Stops when dropped.
pub struct EpochTicker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EpochTicker {
    pub fn start(engine: Engine) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        let handle = thread::Builder::new()
            .name("wasmsched-epoch".to_string())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    thread::sleep(EPOCH_TICK);
                    engine.increment_epoch();
                }
            })?;

        tracing::debug!(tick_ms = EPOCH_TICK.as_millis() as u64, "epoch ticker started");
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for EpochTicker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
