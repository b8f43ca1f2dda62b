//! Cancellable image loads.
//!
//! Decoding an upload can finish after the user has already cancelled the
//! editor or picked another file. Every load is therefore issued a
//! [`LoadTicket`] holding a cancellation token and a generation number; a
//! completion is only applied when its ticket is still the session's
//! current one.

use tokio_util::sync::CancellationToken;

use crate::decode::{decode_source, DecodeError, SourceImage};

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image replaced the session's source and the transform was reset
    Applied,
    /// A newer load or a cancel happened first; the result was dropped
    Superseded,
}

/// Handle for one in-flight load, issued by
/// [`EditSession::begin_load`](super::EditSession::begin_load).
#[derive(Debug, Clone)]
pub struct LoadTicket {
    generation: u64,
    token: CancellationToken,
}

impl LoadTicket {
    pub(super) fn new(generation: u64, token: CancellationToken) -> Self {
        Self { generation, token }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the session has moved on from this load.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Decode `bytes` for this load.
    ///
    /// Returns `None` if the ticket was cancelled before or during decoding.
    pub async fn decode(&self, bytes: &[u8]) -> Option<Result<SourceImage, DecodeError>> {
        if self.token.is_cancelled() {
            return None;
        }

        let result = decode_source(bytes);

        if self.token.is_cancelled() {
            log::debug!("load {} cancelled during decode", self.generation);
            return None;
        }
        Some(result)
    }
}
