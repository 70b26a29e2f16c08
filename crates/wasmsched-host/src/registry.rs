//! HostRegistry — binds the guest ABI into a `wasmtime::Linker`.
//!
//! One registry is built per engine; nothing is registered globally, so
//! several engines with independent linkers can coexist in one process.
//!
//! | Module      | Function         | Host behavior                                   |
//! |-------------|------------------|-------------------------------------------------|
//! | `scheduler` | `outcome-report` | store guest bytes as the call's outcome message |
//! | `api`       | `fetch-target`   | marshal the call's target into a guest buffer   |
//! | `api`       | `fetch-workload` | marshal the call's workload into a guest buffer |

use thiserror::Error;
use wasmtime::{Caller, Engine, IntoFunc, Linker, Memory};

use wasmsched_core::abi::{
    API_MODULE, FETCH_TARGET, FETCH_WORKLOAD, MEMORY_EXPORT, OUTCOME_READ_FAULT, OUTCOME_REPORT,
    SCHEDULER_MODULE,
};

use crate::context::ObjectKind;
use crate::engine::HostState;
use crate::error::HostFault;
use crate::marshal::{guest_range, marshal_if_under_limit};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to define host function {module}::{name}: {source}")]
    Define {
        module: &'static str,
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to link WASI preview1: {0}")]
    Wasi(#[source] anyhow::Error),
}

/// Owns a `Linker<HostState>` and records which host modules it carries.
pub struct HostRegistry {
    linker: Linker<HostState>,
    abi_installed: bool,
    wasi_installed: bool,
}

impl HostRegistry {
    /// An empty registry for `engine`.
    pub fn new(engine: &Engine) -> Self {
        Self::from_linker(Linker::new(engine))
    }

    /// Wrap a linker that may already carry other host modules.
    ///
    /// Shadowing stays disabled: if the linker already defines any ABI name,
    /// [`install_abi`](Self::install_abi) fails.
    pub fn from_linker(linker: Linker<HostState>) -> Self {
        Self {
            linker,
            abi_installed: false,
            wasi_installed: false,
        }
    }

    /// Define `outcome-report`, `fetch-target` and `fetch-workload`.
    ///
    /// Calling this again on the same registry is a no-op.
    pub fn install_abi(&mut self) -> Result<(), RegistryError> {
        if self.abi_installed {
            tracing::debug!("scheduling ABI already installed");
            return Ok(());
        }

        self.define(SCHEDULER_MODULE, OUTCOME_REPORT, outcome_report)?;
        self.define(
            API_MODULE,
            FETCH_TARGET,
            |mut caller: Caller<'_, HostState>, buf: u32, buf_limit: u32| {
                fetch(&mut caller, ObjectKind::Target, buf, buf_limit)
            },
        )?;
        self.define(
            API_MODULE,
            FETCH_WORKLOAD,
            |mut caller: Caller<'_, HostState>, buf: u32, buf_limit: u32| {
                fetch(&mut caller, ObjectKind::Workload, buf, buf_limit)
            },
        )?;

        self.abi_installed = true;
        tracing::info!("scheduling ABI installed");
        Ok(())
    }

    /// Link WASI preview1 for guests built against `wasm32-wasip1`.
    ///
    /// Requires an engine with async support. Idempotent.
    pub fn install_wasi(&mut self) -> Result<(), RegistryError> {
        if self.wasi_installed {
            return Ok(());
        }
        wasmtime_wasi::p1::add_to_linker_async(&mut self.linker, HostState::wasi_mut)
            .map_err(RegistryError::Wasi)?;
        self.wasi_installed = true;
        tracing::info!("WASI preview1 linked");
        Ok(())
    }

    pub fn abi_installed(&self) -> bool {
        self.abi_installed
    }

    pub fn wasi_installed(&self) -> bool {
        self.wasi_installed
    }

    pub fn linker(&self) -> &Linker<HostState> {
        &self.linker
    }

    pub fn into_linker(self) -> Linker<HostState> {
        self.linker
    }

    fn define<Params, Results>(
        &mut self,
        module: &'static str,
        name: &'static str,
        func: impl IntoFunc<HostState, Params, Results>,
    ) -> Result<(), RegistryError> {
        self.linker
            .func_wrap(module, name, func)
            .map(|_| ())
            .map_err(|source| RegistryError::Define {
                module,
                name,
                source,
            })
    }
}

fn guest_memory(caller: &mut Caller<'_, HostState>) -> Result<Memory, HostFault> {
    caller
        .get_export(MEMORY_EXPORT)
        .and_then(|export| export.into_memory())
        .ok_or(HostFault::MissingMemory)
}

/// `scheduler::outcome-report(ptr, size)`.
///
/// An out-of-range message never aborts the call: the outcome becomes
/// [`OUTCOME_READ_FAULT`] and the guest keeps running.
fn outcome_report(mut caller: Caller<'_, HostState>, ptr: u32, size: u32) -> anyhow::Result<()> {
    let memory = guest_memory(&mut caller)?;
    let (data, state) = memory.data_and_store_mut(&mut caller);
    let request = state.request_mut().ok_or(HostFault::NoActiveRequest)?;

    let outcome = match guest_range(data.len(), ptr, size) {
        Some(range) => String::from_utf8_lossy(&data[range]).into_owned(),
        None => {
            tracing::warn!(
                ptr,
                size,
                memory_size = data.len(),
                "outcome-report outside guest memory"
            );
            OUTCOME_READ_FAULT.to_string()
        }
    };
    request.set_outcome(outcome);
    Ok(())
}

/// `api::fetch-target` / `api::fetch-workload`.
fn fetch(
    caller: &mut Caller<'_, HostState>,
    kind: ObjectKind,
    buf: u32,
    buf_limit: u32,
) -> anyhow::Result<u32> {
    let payload = caller
        .data()
        .request()
        .ok_or(HostFault::NoActiveRequest)?
        .encode(kind)
        .map_err(|source| HostFault::Encode { kind, source })?;

    let memory = guest_memory(caller)?;
    let len = marshal_if_under_limit(memory.data_mut(&mut *caller), &payload, buf, buf_limit)
        .map_err(HostFault::from)?;
    tracing::debug!(%kind, len, buf, buf_limit, probe = len > buf_limit, "fetch serviced");
    Ok(len)
}
