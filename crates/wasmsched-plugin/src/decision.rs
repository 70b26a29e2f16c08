//! Decision — the result of one completed guest call.

use wasmsched_core::{Code, GuestCode, Status};

/// Status code and outcome message of a guest call that returned normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub code: Code,
    /// Raw value returned by the guest's `filter` export.
    pub guest_code: u32,
    pub message: String,
}

impl Decision {
    /// Map the guest's raw return code and outcome message.
    ///
    /// Codes outside the known set are errors; if the guest left no outcome
    /// the message names the code.
    pub fn from_guest(raw: u32, outcome: String) -> Self {
        match GuestCode::from_raw(raw) {
            Some(code) => Self {
                code: code.code(),
                guest_code: raw,
                message: outcome,
            },
            None => Self {
                code: Code::Error,
                guest_code: raw,
                message: if outcome.is_empty() {
                    format!("unknown status code {raw}")
                } else {
                    outcome
                },
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }

    pub fn into_status(self) -> Status {
        Status::new(self.code, self.message)
    }
}
