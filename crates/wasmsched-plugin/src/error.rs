//! Plugin error types.

use thiserror::Error;
use wasmtime::Trap;

use wasmsched_core::{Code, Status};
use wasmsched_host::HostFault;
use wasmsched_runtime::RuntimeError;

/// Errors from loading a guest or running a decision call.
///
/// None of these is a scheduling rejection: every variant maps to
/// [`Code::Error`].
#[derive(Debug, Error)]
pub enum PluginError {
    /// The guest does not match the host ABI or payload schema.
    #[error("guest rejected at load: {0}")]
    Linkage(#[source] RuntimeError),

    /// The guest faulted during the call: unreachable, out-of-bounds
    /// access, stack overflow, fuel exhaustion or deadline.
    #[error("guest trapped: {message}")]
    Trap { trap: Trap, message: String },

    /// A host invariant broke while servicing the guest.
    #[error("host fault: {0}")]
    HostFault(#[source] HostFault),

    #[error("invalid plugin configuration: {0}")]
    Config(#[source] anyhow::Error),

    #[error("plugin setup failed: {0}")]
    Setup(#[source] anyhow::Error),

    #[error("runtime error: {0}")]
    Runtime(#[source] RuntimeError),

    /// The host could not drive the call, e.g. the call was already spent
    /// or the per-call budget could not be applied.
    #[error("decision call failed: {0:#}")]
    Call(#[source] anyhow::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;

impl From<RuntimeError> for PluginError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Linkage { .. } | RuntimeError::SchemaMismatch { .. } => {
                PluginError::Linkage(err)
            }
            other => PluginError::Runtime(other),
        }
    }
}

impl PluginError {
    /// Sort an error raised by a guest call into a host fault, a guest trap
    /// or a host-side call failure.
    pub fn from_call(err: anyhow::Error) -> Self {
        let err = match err.downcast::<HostFault>() {
            Ok(fault) => return PluginError::HostFault(fault),
            Err(err) => err,
        };
        match err.downcast_ref::<Trap>().copied() {
            Some(trap) => PluginError::Trap {
                trap,
                message: trap.to_string(),
            },
            None => PluginError::Call(err),
        }
    }

    pub fn is_trap(&self) -> bool {
        matches!(self, PluginError::Trap { .. })
    }

    pub fn into_status(self) -> Status {
        Status::new(Code::Error, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use wasmsched_host::marshal::MarshalFault;
    use wasmsched_runtime::LinkageError;

    use super::*;

    #[test]
    fn host_fault_is_not_a_trap() {
        let err = anyhow::Error::new(HostFault::NoActiveRequest).context("error while executing");
        let err = PluginError::from_call(err);
        assert!(matches!(
            err,
            PluginError::HostFault(HostFault::NoActiveRequest)
        ));
        assert!(!err.is_trap());
    }

    #[test]
    fn marshal_fault_surfaces_as_host_fault() {
        let fault = HostFault::from(MarshalFault::OutOfBounds {
            buf: 65530,
            len: 100,
            memory_size: 65536,
        });
        let err = PluginError::from_call(anyhow::Error::new(fault));
        assert!(matches!(err, PluginError::HostFault(HostFault::Marshal(_))));
    }

    #[test]
    fn trap_is_classified() {
        let err = PluginError::from_call(anyhow::Error::new(Trap::UnreachableCodeReached));
        match err {
            PluginError::Trap { trap, .. } => assert_eq!(trap, Trap::UnreachableCodeReached),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn coded_trap_keeps_its_code_under_context() {
        let err = anyhow::Error::new(Trap::StackOverflow).context("error while executing");
        match PluginError::from_call(err) {
            PluginError::Trap { trap, message } => {
                assert_eq!(trap, Trap::StackOverflow);
                assert_eq!(message, Trap::StackOverflow.to_string());
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn uncoded_error_is_a_call_failure_not_a_trap() {
        let err = PluginError::from_call(anyhow::anyhow!(
            "filter already invoked in phase OutcomeCollected"
        ));
        assert!(!err.is_trap());
        match &err {
            PluginError::Call(source) => {
                assert!(source.to_string().contains("already invoked"));
            }
            other => panic!("unexpected {other}"),
        }
        let status = err.into_status();
        assert_eq!(status.code, Code::Error);
        assert!(status.message.starts_with("decision call failed"));
    }

    #[test]
    fn load_errors_split_into_linkage_and_runtime() {
        let linkage = PluginError::from(RuntimeError::Linkage {
            name: "g".to_string(),
            source: LinkageError::MissingExport("filter"),
        });
        assert!(matches!(linkage, PluginError::Linkage(_)));

        let schema = PluginError::from(RuntimeError::SchemaMismatch {
            name: "g".to_string(),
            guest: 2,
            host: 1,
        });
        assert!(matches!(schema, PluginError::Linkage(_)));

        assert!(matches!(
            PluginError::from(RuntimeError::PoolClosed),
            PluginError::Runtime(_)
        ));
    }

    #[test]
    fn errors_become_error_status() {
        let status = PluginError::Trap {
            trap: Trap::Interrupt,
            message: "interrupt".to_string(),
        }
        .into_status();
        assert_eq!(status.code, Code::Error);
        assert_eq!(status.message, "guest trapped: interrupt");
    }
}
