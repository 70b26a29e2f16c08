//! Runtime error types.

use std::path::PathBuf;

use thiserror::Error;

/// A guest module does not match the host ABI.
///
/// Always raised while loading the module, before any decision call.
#[derive(Debug, Error)]
pub enum LinkageError {
    #[error("import {module}::{name} is not a host function of this ABI")]
    UnknownFunction { module: String, name: String },

    #[error("import {module}::{name} is not a function")]
    NotAFunction { module: String, name: String },

    #[error("import {module}::{name} has signature {found}, host provides {expected}")]
    SignatureMismatch {
        module: String,
        name: String,
        expected: String,
        found: String,
    },

    #[error("guest does not export `{0}`")]
    MissingExport(&'static str),

    #[error("guest export `{name}` must be {expected}")]
    WrongExportType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("unresolved imports: {0}")]
    Unresolved(#[source] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to read guest module {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile guest module {name}: {source}")]
    Compile {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("guest module {name} does not link: {source}")]
    Linkage {
        name: String,
        #[source]
        source: LinkageError,
    },

    #[error("guest module {name} decodes payload schema v{guest}, host encodes v{host}")]
    SchemaMismatch { name: String, guest: u32, host: u32 },

    #[error("failed to instantiate guest module {name}: {source}")]
    Instantiate {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("instance pool is closed")]
    PoolClosed,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
