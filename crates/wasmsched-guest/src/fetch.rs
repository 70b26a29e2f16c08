//! Guest side of the probe-then-fetch protocol.

use serde::de::DeserializeOwned;
use thiserror::Error;

use wasmsched_core::codec::{self, CodecError};

/// Buffer size tried on the first fetch.
pub const INITIAL_BUFFER: usize = 1024;

/// Fetch attempts before giving up on a payload whose length keeps growing.
pub const MAX_ATTEMPTS: usize = 4;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("payload length kept changing after {attempts} attempts")]
    Unstable { attempts: usize },

    #[error(transparent)]
    Decode(#[from] CodecError),
}

/// Fetch a payload through `call`, which hands a buffer to the host and
/// returns the payload length.
///
/// If the length exceeds the buffer nothing was written: the buffer grows
/// to that length and the call is repeated.
pub fn probe_then_fetch(
    initial: usize,
    mut call: impl FnMut(&mut [u8]) -> u32,
) -> Result<Vec<u8>, FetchError> {
    let mut buf = vec![0u8; initial];
    for _ in 0..MAX_ATTEMPTS {
        let len = call(&mut buf) as usize;
        if len <= buf.len() {
            buf.truncate(len);
            return Ok(buf);
        }
        buf.resize(len, 0);
    }
    Err(FetchError::Unstable {
        attempts: MAX_ATTEMPTS,
    })
}

/// Fetch and decode an object. The empty payload is `None`.
pub fn fetch_object<T: DeserializeOwned>(
    call: impl FnMut(&mut [u8]) -> u32,
) -> Result<Option<T>, FetchError> {
    let bytes = probe_then_fetch(INITIAL_BUFFER, call)?;
    Ok(codec::decode(&bytes)?)
}
