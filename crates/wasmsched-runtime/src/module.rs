//! GuestModule — a compiled guest whose linkage has been checked.
//!
//! Loading fails with [`LinkageError`] unless:
//! - every import from `scheduler`/`api` names a host function of the ABI
//!   with exactly its `i32` parameters and results;
//! - every other import resolves in the engine's linker (e.g. WASI);
//! - the guest exports `memory` and `filter: () -> i32`, and, if present,
//!   `schema-version: () -> i32` and `_initialize: () -> ()`.
//!
//! Compiling is expensive and instantiating is cheap: share one
//! `GuestModule` across all instances of a pool.

use std::path::Path;

use wasmtime::{ExternType, FuncType, InstancePre, Module, ValType};

use wasmsched_core::abi::{
    self, FILTER_EXPORT, INITIALIZE_EXPORT, MEMORY_EXPORT, SCHEMA_VERSION_EXPORT,
};
use wasmsched_host::{HostState, SchedEngine};

use crate::error::{LinkageError, RuntimeError, RuntimeResult};

#[derive(Clone)]
pub struct GuestModule {
    pre: InstancePre<HostState>,
    name: String,
}

impl GuestModule {
    /// Compile and validate a guest from raw `.wasm` bytes.
    pub fn from_bytes(engine: &SchedEngine, name: &str, bytes: &[u8]) -> RuntimeResult<Self> {
        let module =
            Module::from_binary(engine.engine(), bytes).map_err(|source| RuntimeError::Compile {
                name: name.to_string(),
                source,
            })?;

        let linkage = |source| RuntimeError::Linkage {
            name: name.to_string(),
            source,
        };
        validate_imports(&module).map_err(linkage)?;
        validate_exports(&module).map_err(linkage)?;
        let pre = engine
            .linker()
            .instantiate_pre(&module)
            .map_err(|err| linkage(LinkageError::Unresolved(err)))?;

        tracing::info!(%name, "compiled guest module");
        Ok(Self {
            pre,
            name: name.to_string(),
        })
    }

    /// Compile and validate a guest from a file. The module is named after
    /// the file stem.
    pub fn from_file(engine: &SchedEngine, path: &Path) -> RuntimeResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| RuntimeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "guest".to_string());
        Self::from_bytes(engine, &name, &bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &Module {
        self.pre.module()
    }

    pub(crate) fn instance_pre(&self) -> &InstancePre<HostState> {
        &self.pre
    }
}

fn is_i32(ty: ValType) -> bool {
    matches!(ty, ValType::I32)
}

fn describe(ty: &FuncType) -> String {
    let params: Vec<String> = ty.params().map(|p| p.to_string()).collect();
    let results: Vec<String> = ty.results().map(|r| r.to_string()).collect();
    format!("({}) -> ({})", params.join(", "), results.join(", "))
}

fn expected_signature(params: usize, results: usize) -> String {
    format!(
        "({}) -> ({})",
        vec!["i32"; params].join(", "),
        vec!["i32"; results].join(", ")
    )
}

/// Check imports from the ABI namespaces against the host function table.
pub fn validate_imports(module: &Module) -> Result<(), LinkageError> {
    for import in module.imports() {
        if !abi::is_abi_module(import.module()) {
            continue;
        }
        let coords = || (import.module().to_string(), import.name().to_string());

        let Some(expected) = abi::host_function(import.module(), import.name()) else {
            let (module, name) = coords();
            return Err(LinkageError::UnknownFunction { module, name });
        };
        let ExternType::Func(found) = import.ty() else {
            let (module, name) = coords();
            return Err(LinkageError::NotAFunction { module, name });
        };

        let matches = found.params().len() == expected.params
            && found.results().len() == expected.results
            && found.params().all(is_i32)
            && found.results().all(is_i32);
        if !matches {
            let (module, name) = coords();
            return Err(LinkageError::SignatureMismatch {
                module,
                name,
                expected: expected_signature(expected.params, expected.results),
                found: describe(&found),
            });
        }
    }
    Ok(())
}

/// Check the guest's exported memory and entrypoints.
pub fn validate_exports(module: &Module) -> Result<(), LinkageError> {
    match module.get_export(MEMORY_EXPORT) {
        Some(ExternType::Memory(_)) => {}
        Some(_) => {
            return Err(LinkageError::WrongExportType {
                name: MEMORY_EXPORT,
                expected: "a memory",
            });
        }
        None => return Err(LinkageError::MissingExport(MEMORY_EXPORT)),
    }

    match module.get_export(FILTER_EXPORT) {
        Some(ExternType::Func(ty)) if ty.params().len() == 0 && returns_one_i32(&ty) => {}
        Some(_) => {
            return Err(LinkageError::WrongExportType {
                name: FILTER_EXPORT,
                expected: "a function () -> i32",
            });
        }
        None => return Err(LinkageError::MissingExport(FILTER_EXPORT)),
    }

    match module.get_export(SCHEMA_VERSION_EXPORT) {
        None => {}
        Some(ExternType::Func(ty)) if ty.params().len() == 0 && returns_one_i32(&ty) => {}
        Some(_) => {
            return Err(LinkageError::WrongExportType {
                name: SCHEMA_VERSION_EXPORT,
                expected: "a function () -> i32",
            });
        }
    }

    match module.get_export(INITIALIZE_EXPORT) {
        None => {}
        Some(ExternType::Func(ty)) if ty.params().len() == 0 && ty.results().len() == 0 => {}
        Some(_) => {
            return Err(LinkageError::WrongExportType {
                name: INITIALIZE_EXPORT,
                expected: "a function () -> ()",
            });
        }
    }

    Ok(())
}

fn returns_one_i32(ty: &FuncType) -> bool {
    ty.results().len() == 1 && ty.results().all(is_i32)
}
