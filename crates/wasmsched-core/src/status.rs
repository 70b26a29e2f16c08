//! Decision status codes.
//!
//! [`GuestCode`] is what the guest's `filter` export returns. [`Code`] and
//! [`Status`] are what the host scheduling framework consumes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw return value of the guest `filter` export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum GuestCode {
    Success = 0,
    Error = 1,
    /// The workload does not fit this target right now.
    Unschedulable = 2,
    /// The workload can never fit this target.
    UnschedulableAndUnresolvable = 3,
}

impl GuestCode {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Success),
            1 => Some(Self::Error),
            2 => Some(Self::Unschedulable),
            3 => Some(Self::UnschedulableAndUnresolvable),
            _ => None,
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }

    /// Collapse onto the framework's three-way code.
    pub fn code(self) -> Code {
        match self {
            Self::Success => Code::Success,
            Self::Error => Code::Error,
            Self::Unschedulable | Self::UnschedulableAndUnresolvable => Code::Rejected,
        }
    }
}

/// Outcome category reported to the scheduling framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Code {
    Success,
    Rejected,
    Error,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Code::Success => "Success",
            Code::Rejected => "Rejected",
            Code::Error => "Error",
        };
        f.write_str(label)
    }
}

/// `(code, message)` pair handed back to the scheduling framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: Code,
    /// May be empty, in particular on success.
    pub message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn success() -> Self {
        Self::new(Code::Success, String::new())
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}
