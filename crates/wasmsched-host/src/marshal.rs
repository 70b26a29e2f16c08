//! Probe-then-fetch marshaling into guest-owned buffers.
//!
//! The host never allocates inside the guest. The guest passes a buffer and
//! its capacity; the host copies the payload only when it fits and always
//! returns the full payload length:
//!
//! ```text
//! len = fetch(buf, limit)
//!   len <= limit → buf[..len] holds the payload
//!   len >  limit → nothing written; allocate >= len bytes and call again
//! ```
//!
//! A limit of 0 is a pure probe. Both fetch functions share
//! [`marshal_if_under_limit`].

use std::ops::Range;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalFault {
    #[error("payload of {len} bytes does not fit a 32-bit length")]
    TooLarge { len: usize },

    #[error("write of {len} bytes at {buf:#x} exceeds guest memory of {memory_size} bytes")]
    OutOfBounds {
        buf: u32,
        len: u32,
        memory_size: usize,
    },
}

/// Byte range `[ptr, ptr + len)` if it lies inside a memory of `memory_size`.
pub fn guest_range(memory_size: usize, ptr: u32, len: u32) -> Option<Range<usize>> {
    let start = ptr as usize;
    let end = start.checked_add(len as usize)?;
    (end <= memory_size).then_some(start..end)
}

/// Copy `payload` to `memory[buf..]` if it fits within `buf_limit`.
///
/// Returns the payload length whether or not it was written. When the length
/// exceeds `buf_limit`, `memory` is left untouched.
///
/// `OutOfBounds` means the guest declared a capacity its memory cannot hold.
/// The capacity check already passed at that point, so callers treat it as a
/// fault of the call rather than a guest-visible result.
pub fn marshal_if_under_limit(
    memory: &mut [u8],
    payload: &[u8],
    buf: u32,
    buf_limit: u32,
) -> Result<u32, MarshalFault> {
    let len = u32::try_from(payload.len()).map_err(|_| MarshalFault::TooLarge {
        len: payload.len(),
    })?;

    if len > buf_limit {
        tracing::debug!(len, buf_limit, "marshal probe: payload exceeds guest buffer");
        return Ok(len);
    }
    if len == 0 {
        return Ok(0);
    }

    let range = guest_range(memory.len(), buf, len).ok_or(MarshalFault::OutOfBounds {
        buf,
        len,
        memory_size: memory.len(),
    })?;
    memory[range].copy_from_slice(payload);
    tracing::debug!(len, buf, buf_limit, "marshal fetch: payload written");
    Ok(len)
}
