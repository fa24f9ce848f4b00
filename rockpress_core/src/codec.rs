use crate::error::Result;
use crate::kind::CompressionKind;
use crate::options::CompressionOptions;

/// Core compression abstraction.
///
/// Each `Codec` implementation:
/// - Wraps exactly one external engine and is identified by its
///   [`CompressionKind`], whose id the storage engine persists next to the block.
/// - Transforms one whole block per call. No state survives between calls, so
///   a single instance may be shared across threads.
/// - Returns a buffer trimmed to exactly the bytes the engine produced, or an
///   error. Partial output is never returned next to a failure, with the single
///   documented exception of [`CodecError::TruncatedOutput`] for the LZ4 family.
///
/// [`CodecError::TruncatedOutput`]: crate::CodecError::TruncatedOutput
pub trait Codec: Send + Sync {
    fn kind(&self) -> CompressionKind;

    /// Human-readable codec name for logs.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Compress a single independent block.
    ///
    /// Only the fields of `opts` meaningful to this codec are consulted.
    fn compress(&self, opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a single independent block.
    ///
    /// For unframed codecs the original length is not recoverable from the
    /// payload; callers that tracked it should compare it with the result.
    fn decompress(&self, opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>>;

    /// Original length as declared by the payload itself, when the format
    /// carries one. `Ok(None)` means the codec cannot tell.
    fn uncompressed_len(&self, _compressed: &[u8]) -> Result<Option<usize>> {
        Ok(None)
    }
}
