//! wasmsched-core — types shared by the host and by guest modules.
//!
//! - **types**: the placement target (`Node`) and workload (`Pod`) schema
//! - **codec**: deterministic, versioned payload encoding for those types
//! - **abi**: host function names and signatures, guest export names
//! - **status**: guest return codes and the host framework's status shape
//! - **config**: `PluginConfig` parsed from TOML
//!
//! This crate must stay buildable for `wasm32` targets because guests link it
//! through `wasmsched-guest`.

pub mod abi;
pub mod codec;
pub mod config;
pub mod status;
pub mod types;

pub use codec::{CodecError, SCHEMA_VERSION};
pub use config::PluginConfig;
pub use status::{Code, GuestCode, Status};
pub use types::*;
