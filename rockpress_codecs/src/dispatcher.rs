use std::sync::Arc;

use rockpress_core::{Codec, CodecError, CompressionKind, CompressionOptions, Result};
use tracing::{debug, warn};

use crate::capability::Capabilities;
use crate::codec_for;

/// Routes a [`CompressionKind`] to its adapter.
///
/// Holds no per-call state: the capability table and the adapter table are
/// fixed at construction, so one dispatcher can serve every thread.
///
/// Error policy, by direction:
/// - `compress` failures are recoverable. Use [`CodecDispatcher::compress_or_store`]
///   to fall back to storing the block uncompressed.
/// - `decompress` failures other than [`CodecError::TruncatedOutput`] mean the
///   stored block is corrupt or the build lacks its codec. Report them as data
///   corruption; retrying cannot help.
/// - The LZ4 family is partial-capable on read and may return
///   [`CodecError::TruncatedOutput`] carrying the bytes that could be produced.
///   Zlib and BZip2 are all-or-nothing.
pub struct CodecDispatcher {
    capabilities: Capabilities,
    codecs: [Option<Arc<dyn Codec>>; CompressionKind::ALL.len()],
}

impl Default for CodecDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecDispatcher {
    /// Every codec compiled into this build.
    pub fn new() -> Self {
        Self::with_capabilities(Capabilities::compiled())
    }

    /// Restrict dispatch to `capabilities`. Kinds outside it answer
    /// [`CodecError::Unsupported`] even when their adapter is linked in.
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            codecs: CompressionKind::ALL.map(codec_for),
        }
    }

    /// Replace the adapter for `codec.kind()`. The capability table is left
    /// unchanged.
    pub fn register(mut self, codec: Arc<dyn Codec>) -> Self {
        let slot = codec.kind().id() as usize;
        self.codecs[slot] = Some(codec);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn supports(&self, kind: CompressionKind) -> bool {
        self.capabilities.supports(kind) && self.codecs[kind.id() as usize].is_some()
    }

    fn select(&self, kind: CompressionKind) -> Result<&dyn Codec> {
        match &self.codecs[kind.id() as usize] {
            Some(codec) if self.capabilities.supports(kind) => Ok(codec.as_ref()),
            _ => {
                debug!(%kind, "codec not available in this build");
                Err(CodecError::unsupported(kind))
            }
        }
    }

    /// Compress one block. `CompressionKind::None` returns the input unchanged.
    pub fn compress(
        &self,
        kind: CompressionKind,
        opts: &CompressionOptions,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        if kind == CompressionKind::None {
            return Ok(input.to_vec());
        }
        self.select(kind)?.compress(opts, input)
    }

    /// Decompress one block with default options.
    pub fn decompress(&self, kind: CompressionKind, input: &[u8]) -> Result<Vec<u8>> {
        self.decompress_with(kind, &CompressionOptions::default(), input)
    }

    /// Decompress one block. Zlib reads `window_bits` from `opts`; it must
    /// match the value used to compress, or be positive for header detection.
    pub fn decompress_with(
        &self,
        kind: CompressionKind,
        opts: &CompressionOptions,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        if kind == CompressionKind::None {
            return Ok(input.to_vec());
        }
        self.select(kind)?.decompress(opts, input)
    }

    /// Original length as declared by the payload (Snappy header, LZ4 frame),
    /// or `None` when the format does not carry it.
    pub fn uncompressed_len(&self, kind: CompressionKind, input: &[u8]) -> Result<Option<usize>> {
        if kind == CompressionKind::None {
            return Ok(Some(input.len()));
        }
        self.select(kind)?.uncompressed_len(input)
    }

    /// Write path: compress with `kind`, or store the block uncompressed if
    /// that fails for any reason. Returns the kind the payload is actually
    /// encoded with.
    pub fn compress_or_store(
        &self,
        kind: CompressionKind,
        opts: &CompressionOptions,
        input: &[u8],
    ) -> (CompressionKind, Vec<u8>) {
        match self.compress(kind, opts, input) {
            Ok(payload) => (kind, payload),
            Err(err) => {
                if err.is_unsupported() {
                    debug!(%kind, "storing block uncompressed");
                } else {
                    warn!(%kind, error = %err, len = input.len(), "compression failed, storing block uncompressed");
                }
                (CompressionKind::None, input.to_vec())
            }
        }
    }

    /// Read path: decompress and check the result against the original length
    /// the caller recorded next to the block.
    pub fn decompress_exact(
        &self,
        kind: CompressionKind,
        opts: &CompressionOptions,
        input: &[u8],
        expected_len: usize,
    ) -> Result<Vec<u8>> {
        let raw = self.decompress_with(kind, opts, input)?;
        if raw.len() != expected_len {
            return Err(CodecError::stream(
                kind,
                format!(
                    "block decompressed to {} bytes but {expected_len} were recorded",
                    raw.len()
                ),
            ));
        }
        Ok(raw)
    }
}
