//! Safe access to the host from inside a guest.

use wasmsched_core::{GuestCode, Node, Pod};

use crate::fetch::{FetchError, fetch_object};

/// The host functions a guest can call.
///
/// [`WasmHost`] forwards to the real imports; tests provide their own.
pub trait Host {
    fn fetch_target(&mut self, buf: &mut [u8]) -> u32;
    fn fetch_workload(&mut self, buf: &mut [u8]) -> u32;
    fn report_outcome(&mut self, message: &str);

    fn target(&mut self) -> Result<Option<Node>, FetchError> {
        fetch_object(|buf| self.fetch_target(buf))
    }

    fn workload(&mut self) -> Result<Option<Pod>, FetchError> {
        fetch_object(|buf| self.fetch_workload(buf))
    }
}

/// The host this guest was instantiated by.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct WasmHost;

#[cfg(target_arch = "wasm32")]
fn offset_and_len(buf: &[u8]) -> (u32, u32) {
    (
        buf.as_ptr() as u32,
        u32::try_from(buf.len()).unwrap_or(u32::MAX),
    )
}

#[cfg(target_arch = "wasm32")]
impl Host for WasmHost {
    fn fetch_target(&mut self, buf: &mut [u8]) -> u32 {
        let (ptr, limit) = offset_and_len(buf);
        // SAFETY: the host writes at most `limit` bytes at `ptr`, all inside `buf`.
        unsafe { crate::imports::fetch_target(ptr, limit) }
    }

    fn fetch_workload(&mut self, buf: &mut [u8]) -> u32 {
        let (ptr, limit) = offset_and_len(buf);
        // SAFETY: as above.
        unsafe { crate::imports::fetch_workload(ptr, limit) }
    }

    fn report_outcome(&mut self, message: &str) {
        let (ptr, len) = offset_and_len(message.as_bytes());
        // SAFETY: the host only reads `len` bytes at `ptr`.
        unsafe { crate::imports::outcome_report(ptr, len) }
    }
}

/// What a filter decided, plus an optional outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub code: GuestCode,
    pub message: Option<String>,
}

impl Verdict {
    pub fn success() -> Self {
        Self {
            code: GuestCode::Success,
            message: None,
        }
    }

    pub fn unschedulable(message: impl Into<String>) -> Self {
        Self {
            code: GuestCode::Unschedulable,
            message: Some(message.into()),
        }
    }

    pub fn unresolvable(message: impl Into<String>) -> Self {
        Self {
            code: GuestCode::UnschedulableAndUnresolvable,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: GuestCode::Error,
            message: Some(message.into()),
        }
    }
}

/// Fetch both objects, run `handler`, report its message and return its
/// raw code. Fetch failures are reported as [`GuestCode::Error`].
pub fn run_filter_with<H: Host>(
    host: &mut H,
    handler: impl FnOnce(Option<&Node>, &Pod) -> Verdict,
) -> u32 {
    let verdict = match (host.target(), host.workload()) {
        (Ok(target), Ok(Some(workload))) => handler(target.as_ref(), &workload),
        (Ok(_), Ok(None)) => Verdict::error("host sent no workload"),
        (Err(err), _) => Verdict::error(format!("target: {err}")),
        (_, Err(err)) => Verdict::error(format!("workload: {err}")),
    };
    if let Some(message) = &verdict.message {
        host.report_outcome(message);
    }
    verdict.code.as_raw()
}

/// [`run_filter_with`] against the real host.
#[cfg(target_arch = "wasm32")]
pub fn run_filter(handler: impl FnOnce(Option<&Node>, &Pod) -> Verdict) -> u32 {
    run_filter_with(&mut WasmHost, handler)
}

#[cfg(test)]
mod tests {
    use wasmsched_core::codec;

    use super::*;

    #[derive(Default)]
    struct MockHost {
        target: Vec<u8>,
        workload: Vec<u8>,
        outcomes: Vec<String>,
    }

    fn copy_if_fits(payload: &[u8], buf: &mut [u8]) -> u32 {
        if payload.len() <= buf.len() {
            buf[..payload.len()].copy_from_slice(payload);
        }
        payload.len() as u32
    }

    impl Host for MockHost {
        fn fetch_target(&mut self, buf: &mut [u8]) -> u32 {
            copy_if_fits(&self.target, buf)
        }

        fn fetch_workload(&mut self, buf: &mut [u8]) -> u32 {
            copy_if_fits(&self.workload, buf)
        }

        fn report_outcome(&mut self, message: &str) {
            self.outcomes.push(message.to_string());
        }
    }

    fn host(target: Option<&Node>, workload: Option<&Pod>) -> MockHost {
        MockHost {
            target: codec::encode(target).unwrap(),
            workload: codec::encode(workload).unwrap(),
            outcomes: Vec::new(),
        }
    }

    #[test]
    fn handler_sees_both_objects() {
        let node = Node {
            name: "n1".to_string(),
            ..Node::default()
        };
        let pod = Pod {
            name: "web-0".to_string(),
            ..Pod::default()
        };
        let mut host = host(Some(&node), Some(&pod));

        let code = run_filter_with(&mut host, |target, workload| {
            assert_eq!(target.map(|n| n.name.as_str()), Some("n1"));
            assert_eq!(workload.name, "web-0");
            Verdict::unschedulable("too full")
        });
        assert_eq!(code, 2);
        assert_eq!(host.outcomes, vec!["too full".to_string()]);
    }

    #[test]
    fn success_reports_nothing() {
        let mut host = host(None, Some(&Pod::default()));
        let code = run_filter_with(&mut host, |target, _| {
            assert!(target.is_none());
            Verdict::success()
        });
        assert_eq!(code, 0);
        assert!(host.outcomes.is_empty());
    }

    #[test]
    fn missing_workload_is_error() {
        let mut host = host(None, None);
        let code = run_filter_with(&mut host, |_, _| panic!("handler must not run"));
        assert_eq!(code, GuestCode::Error.as_raw());
        assert_eq!(host.outcomes, vec!["host sent no workload".to_string()]);
    }

    #[test]
    fn undecodable_target_is_error() {
        let mut host = host(None, Some(&Pod::default()));
        host.target = b"[1,2".to_vec();
        let code = run_filter_with(&mut host, |_, _| panic!("handler must not run"));
        assert_eq!(code, GuestCode::Error.as_raw());
        assert!(host.outcomes[0].starts_with("target:"));
    }
}
