//! GuestInstance — one instantiated guest and its store.
//!
//! An instance runs at most one decision call at a time. A call is scoped by
//! a [`CallHandle`], which holds the instance exclusively, installs the
//! call's [`RequestContext`] into the store and removes it again when the
//! handle is dropped, whatever the outcome of the call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use wasmtime::{Memory, Store, TypedFunc};

use wasmsched_core::abi::{FILTER_EXPORT, INITIALIZE_EXPORT, MEMORY_EXPORT, SCHEMA_VERSION_EXPORT};
use wasmsched_core::{PluginConfig, SCHEMA_VERSION};
use wasmsched_host::{
    CallObserver, CallPhase, HostConfig, HostFault, HostState, RequestContext, SchedEngine,
};

use crate::error::{LinkageError, RuntimeError, RuntimeResult};
use crate::module::GuestModule;
use crate::ticker;

/// Fuel handed to a store when metering is on but no budget was requested.
pub const UNMETERED_FUEL: u64 = i64::MAX as u64;

/// Epoch deadline used when interruption is on but no timeout was requested.
pub const NO_DEADLINE_TICKS: u64 = u32::MAX as u64;

/// Per-call execution budget.
///
/// Fuel only applies when the engine meters fuel; the deadline only applies
/// when the engine has epoch interruption enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallBudget {
    pub fuel: Option<u64>,
    /// Deadline in epoch ticks from the start of the call.
    pub deadline_ticks: Option<u64>,
}

impl CallBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PluginConfig) -> anyhow::Result<Self> {
        Ok(Self {
            fuel: config.limits.fuel,
            deadline_ticks: config.timeout()?.map(ticker::deadline_ticks),
        })
    }

    fn apply(&self, store: &mut Store<HostState>, host: &HostConfig) -> anyhow::Result<()> {
        if host.consume_fuel {
            store.set_fuel(self.fuel.unwrap_or(UNMETERED_FUEL))?;
        }
        if host.epoch_interruption {
            store.set_epoch_deadline(self.deadline_ticks.unwrap_or(NO_DEADLINE_TICKS));
        }
        Ok(())
    }
}

/// An instantiated guest with its own store, memory and host state.
pub struct GuestInstance {
    store: Store<HostState>,
    host: HostConfig,
    filter: TypedFunc<(), u32>,
    memory: Memory,
    module_name: String,
    /// Set once a call on this instance has trapped or faulted.
    poisoned: bool,
}

impl GuestInstance {
    /// Instantiate `module`, run its `_initialize` export if any, and check
    /// its payload schema version.
    ///
    /// `budget` bounds the initialization calls.
    pub async fn new(
        engine: &SchedEngine,
        module: &GuestModule,
        budget: &CallBudget,
    ) -> RuntimeResult<Self> {
        let name = module.name().to_string();
        let instantiate_err = |source| RuntimeError::Instantiate {
            name: name.clone(),
            source,
        };

        let mut store = Store::new(engine.engine(), engine.build_host_state());
        store.limiter(|state| state.limiter_mut());
        store.call_hook(|ctx, hook| {
            if let Some(observer) = ctx.data().observer() {
                observer.transition(hook);
            }
            Ok(())
        });
        let host = engine.config().clone();
        budget.apply(&mut store, &host).map_err(instantiate_err)?;

        let instance = module
            .instance_pre()
            .instantiate_async(&mut store)
            .await
            .map_err(instantiate_err)?;

        if let Some(init) = instance.get_func(&mut store, INITIALIZE_EXPORT) {
            init.typed::<(), ()>(&store)
                .map_err(instantiate_err)?
                .call_async(&mut store, ())
                .await
                .map_err(instantiate_err)?;
        }

        if let Some(version) = instance.get_func(&mut store, SCHEMA_VERSION_EXPORT) {
            let guest = version
                .typed::<(), u32>(&store)
                .map_err(instantiate_err)?
                .call_async(&mut store, ())
                .await
                .map_err(instantiate_err)?;
            if guest != SCHEMA_VERSION {
                return Err(RuntimeError::SchemaMismatch {
                    name: name.clone(),
                    guest,
                    host: SCHEMA_VERSION,
                });
            }
        }

        let filter = instance
            .get_typed_func::<(), u32>(&mut store, FILTER_EXPORT)
            .map_err(instantiate_err)?;
        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| RuntimeError::Linkage {
                name: name.clone(),
                source: LinkageError::MissingExport(MEMORY_EXPORT),
            })?;

        tracing::debug!(%name, "guest instance created");

        Ok(Self {
            store,
            host,
            filter,
            memory,
            module_name: name,
            poisoned: false,
        })
    }

    /// Begin a decision call on this instance.
    pub fn attach(
        &mut self,
        request: RequestContext,
        observer: Option<Arc<dyn CallObserver>>,
    ) -> Result<CallHandle<'_>, HostFault> {
        self.store.data_mut().attach(request, observer)?;
        Ok(CallHandle {
            instance: self,
            phase: CallPhase::ContextAttached,
        })
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Whether a call on this instance trapped. A poisoned instance must
    /// not serve further calls.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Whether a request is currently installed in the store.
    pub fn has_request(&self) -> bool {
        self.store.data().request().is_some()
    }

    /// Largest linear memory size the guest reached, in bytes.
    pub fn peak_memory(&self) -> usize {
        self.store.data().limiter().peak_memory()
    }

    /// Current size of the guest's linear memory, in bytes.
    pub fn memory_size(&self) -> usize {
        self.memory.data_size(&self.store)
    }

    /// Copy `len` bytes of guest memory starting at `offset`, if in range.
    pub fn read_memory(&self, offset: usize, len: usize) -> Option<Vec<u8>> {
        let data = self.memory.data(&self.store);
        let end = offset.checked_add(len)?;
        data.get(offset..end).map(<[u8]>::to_vec)
    }
}

/// One decision call in progress on a [`GuestInstance`].
///
/// Dropping the handle detaches the request from the store.
pub struct CallHandle<'a> {
    instance: &'a mut GuestInstance,
    phase: CallPhase,
}

impl CallHandle<'_> {
    pub fn phase(&self) -> CallPhase {
        self.phase
    }

    /// Run the guest's `filter` entrypoint once and return its raw code.
    ///
    /// Any error is fatal to the call and poisons the instance.
    pub async fn invoke(&mut self, budget: &CallBudget) -> anyhow::Result<u32> {
        if self.phase != CallPhase::ContextAttached {
            anyhow::bail!("filter already invoked in phase {:?}", self.phase);
        }

        let instance = &mut *self.instance;
        let observer = instance.store.data().observer().cloned();
        if let Some(observer) = &observer {
            let workload = instance
                .store
                .data()
                .request()
                .map(|request| request.workload().key())
                .unwrap_or_default();
            observer.call_started(&workload);
        }

        budget.apply(&mut instance.store, &instance.host)?;
        self.phase = CallPhase::GuestExecuting;
        let started = Instant::now();
        let result = instance.filter.call_async(&mut instance.store, ()).await;
        let elapsed = started.elapsed();

        self.phase = match &result {
            Ok(_) => CallPhase::OutcomeCollected,
            Err(_) => {
                instance.poisoned = true;
                CallPhase::Trapped
            }
        };
        self.finished(observer.as_deref(), elapsed);
        result
    }

    fn finished(&self, observer: Option<&dyn CallObserver>, elapsed: Duration) {
        if let Some(observer) = observer {
            observer.call_finished(self.phase, elapsed);
        }
    }

    /// The outcome message reported so far.
    pub fn outcome(&self) -> &str {
        self.instance
            .store
            .data()
            .request()
            .map(RequestContext::outcome)
            .unwrap_or_default()
    }

    /// End the call and take its outcome message.
    pub fn finish(self) -> String {
        self.instance
            .store
            .data_mut()
            .detach()
            .map(RequestContext::into_outcome)
            .unwrap_or_default()
    }
}

impl Drop for CallHandle<'_> {
    fn drop(&mut self) {
        self.instance.store.data_mut().detach();
    }
}
