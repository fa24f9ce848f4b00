use thiserror::Error;

use crate::kind::CompressionKind;

pub type Result<T, E = CodecError> = std::result::Result<T, E>;

/// Failure vocabulary shared by every adapter.
///
/// Write path: every variant is recoverable. The caller stores the block with
/// [`CompressionKind::None`] instead (see `CodecDispatcher::compress_or_store`).
///
/// Read path: everything except [`CodecError::TruncatedOutput`] means either a
/// corrupted stored block or a build that lacks the codec the block was
/// written with. It must be surfaced as data corruption, never retried.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The codec is not available in this build. Not an engine error: no
    /// adapter state was touched.
    #[error("{kind} compression is not supported by this build")]
    Unsupported { kind: CompressionKind },

    /// The engine rejected the options while creating its context.
    #[error("{kind} engine rejected its options: {reason}")]
    InitFailure {
        kind: CompressionKind,
        reason: String,
    },

    /// The engine failed mid-stream (corrupt input, bad sequence, unexpected
    /// status, or runaway growth). Partial output has been discarded.
    #[error("{kind} stream error: {reason}")]
    StreamError {
        kind: CompressionKind,
        reason: String,
    },

    /// LZ4 family only: the payload did not fill its declared length exactly.
    /// `partial` holds every byte that could be produced.
    #[error(
        "{kind} output truncated: {} bytes produced, frame declares {expected}",
        .partial.len()
    )]
    TruncatedOutput {
        kind: CompressionKind,
        partial: Vec<u8>,
        expected: usize,
    },
}

impl CodecError {
    pub fn unsupported(kind: CompressionKind) -> Self {
        CodecError::Unsupported { kind }
    }

    pub fn init(kind: CompressionKind, reason: impl ToString) -> Self {
        CodecError::InitFailure {
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn stream(kind: CompressionKind, reason: impl ToString) -> Self {
        CodecError::StreamError {
            kind,
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> CompressionKind {
        match self {
            CodecError::Unsupported { kind }
            | CodecError::InitFailure { kind, .. }
            | CodecError::StreamError { kind, .. }
            | CodecError::TruncatedOutput { kind, .. } => *kind,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, CodecError::Unsupported { .. })
    }

    /// Whether a read-path caller must treat this as corruption.
    pub fn is_fatal_on_read(&self) -> bool {
        !matches!(self, CodecError::TruncatedOutput { .. })
    }

    /// Best-effort bytes carried by [`CodecError::TruncatedOutput`].
    pub fn into_partial(self) -> Option<Vec<u8>> {
        match self {
            CodecError::TruncatedOutput { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
