//! SchedEngine — wasmtime engine and linker for scheduling guests.
//!
//! # Architecture
//!
//! `SchedEngine` owns a `wasmtime::Engine` configured for async execution
//! plus optional fuel metering and epoch interruption, and a shared
//! `Linker<HostState>` built once through [`HostRegistry`].
//!
//! `HostState` is the data of one `Store`, i.e. of one guest instance. Its
//! request slot is empty between calls; a call's [`RequestContext`] is
//! attached for the duration of that call only.

use std::sync::Arc;

use wasmtime::{Config, Engine, Linker};
use wasmtime_wasi::WasiCtxBuilder;
use wasmtime_wasi::p1::WasiP1Ctx;

use crate::config::HostConfig;
use crate::context::RequestContext;
use crate::error::HostFault;
use crate::limiter::GuestLimiter;
use crate::observer::CallObserver;
use crate::registry::HostRegistry;

/// Per-store host state.
pub struct HostState {
    /// Request of the call currently executing in this store, if any.
    request: Option<RequestContext>,
    /// Observer of the call currently executing in this store, if any.
    observer: Option<Arc<dyn CallObserver>>,
    wasi: WasiP1Ctx,
    limiter: GuestLimiter,
}

impl HostState {
    pub fn new(config: &HostConfig) -> Self {
        let mut wasi = WasiCtxBuilder::new();
        if config.inherit_stdio {
            wasi.inherit_stdout().inherit_stderr();
        }

        Self {
            request: None,
            observer: None,
            wasi: wasi.build_p1(),
            limiter: GuestLimiter::new(config.memory_limit, config.table_limit),
        }
    }

    /// Install the request (and optional observer) of the call about to run.
    ///
    /// Fails if a request is already attached: a store serves one call at a
    /// time.
    pub fn attach(
        &mut self,
        request: RequestContext,
        observer: Option<Arc<dyn CallObserver>>,
    ) -> Result<(), HostFault> {
        if self.request.is_some() {
            return Err(HostFault::RequestAlreadyAttached);
        }
        self.request = Some(request);
        self.observer = observer;
        Ok(())
    }

    /// Remove the current request and observer, returning the request.
    pub fn detach(&mut self) -> Option<RequestContext> {
        self.observer = None;
        self.request.take()
    }

    pub fn request(&self) -> Option<&RequestContext> {
        self.request.as_ref()
    }

    pub fn request_mut(&mut self) -> Option<&mut RequestContext> {
        self.request.as_mut()
    }

    pub fn observer(&self) -> Option<&Arc<dyn CallObserver>> {
        self.observer.as_ref()
    }

    pub fn limiter(&self) -> &GuestLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut GuestLimiter {
        &mut self.limiter
    }

    pub fn wasi_mut(&mut self) -> &mut WasiP1Ctx {
        &mut self.wasi
    }
}

/// Configured engine plus the linker carrying the scheduling ABI.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct SchedEngine {
    engine: Engine,
    linker: Arc<Linker<HostState>>,
    config: HostConfig,
}

impl SchedEngine {
    pub fn new(config: HostConfig) -> anyhow::Result<Self> {
        let mut wasm_config = Config::new();
        wasm_config.async_support(true);
        wasm_config.consume_fuel(config.consume_fuel);
        wasm_config.epoch_interruption(config.epoch_interruption);

        let engine = Engine::new(&wasm_config)?;
        let mut registry = HostRegistry::new(&engine);
        registry.install_abi()?;
        if config.wasi {
            registry.install_wasi()?;
        }

        tracing::info!(
            fuel = config.consume_fuel,
            epoch = config.epoch_interruption,
            wasi = config.wasi,
            "scheduling engine initialized"
        );

        Ok(Self {
            engine,
            linker: Arc::new(registry.into_linker()),
            config,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn linker(&self) -> &Linker<HostState> {
        &self.linker
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Fresh state for a new store on this engine.
    pub fn build_host_state(&self) -> HostState {
        HostState::new(&self.config)
    }
}
