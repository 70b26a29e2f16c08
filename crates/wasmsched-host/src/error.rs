//! Host-side faults raised from inside host functions.

use thiserror::Error;
use wasmsched_core::CodecError;

use crate::context::ObjectKind;
use crate::marshal::MarshalFault;

/// A host invariant broke while servicing a guest call.
///
/// Returned from host functions, these abort the guest call. The invocation
/// adapter recognizes them and reports a host fault instead of a guest trap.
#[derive(Debug, Error)]
pub enum HostFault {
    #[error("host function called with no request attached to the store")]
    NoActiveRequest,

    #[error("a request is already attached to this store")]
    RequestAlreadyAttached,

    #[error("guest does not export linear memory `memory`")]
    MissingMemory,

    #[error("failed to encode {kind}: {source}")]
    Encode {
        kind: ObjectKind,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Marshal(#[from] MarshalFault),
}
