use rockpress_core::{Codec, CodecError, CompressionKind, CompressionOptions, Result};
use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

/// Snappy raw-block codec.
///
/// One-shot in both directions: compression writes into a buffer sized by
/// `max_compress_len` and is never retried; decompression first reads the
/// uncompressed length from the payload's varint header and allocates exactly
/// that. No options are consulted.
///
/// Best for: hot data where decode speed matters more than ratio.
pub struct SnappyCodec;

const KIND: CompressionKind = CompressionKind::Snappy;

/// A snappy copy op emits at most 64 bytes from 3 payload bytes.
const MAX_EXPANSION: usize = 32;

impl Codec for SnappyCodec {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn compress(&self, _opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>> {
        let bound = max_compress_len(raw.len());
        if bound == 0 && !raw.is_empty() {
            return Err(CodecError::init(
                KIND,
                format!("{} bytes exceeds the snappy block limit", raw.len()),
            ));
        }
        let mut out = vec![0u8; bound];
        let n = Encoder::new()
            .compress(raw, &mut out)
            .map_err(|e| CodecError::stream(KIND, e))?;
        out.truncate(n);
        Ok(out)
    }

    fn decompress(&self, _opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>> {
        let len = decompress_len(compressed).map_err(|e| CodecError::stream(KIND, e))?;
        if len > compressed.len().saturating_mul(MAX_EXPANSION) {
            return Err(CodecError::stream(
                KIND,
                format!("header declares {len} bytes from a {} byte payload", compressed.len()),
            ));
        }
        let mut out = vec![0u8; len];
        let n = Decoder::new()
            .decompress(compressed, &mut out)
            .map_err(|e| CodecError::stream(KIND, e))?;
        out.truncate(n);
        Ok(out)
    }

    fn uncompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>> {
        decompress_len(compressed)
            .map(Some)
            .map_err(|e| CodecError::stream(KIND, e))
    }
}
