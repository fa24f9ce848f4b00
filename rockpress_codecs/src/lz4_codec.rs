use lz4::block::CompressionMode;
use lz4_flex::block::{compress_into, decompress_into, get_maximum_output_size, DecompressError};
use rockpress_core::{Codec, CodecError, CompressionKind, CompressionOptions, Result, FRAME_PREFIX_LEN};

/// Default LZ4HC level when the options ask for the library default.
pub const LZ4HC_DEFAULT_LEVEL: i32 = 9;
pub const LZ4HC_MAX_LEVEL: i32 = 12;

/// Upper bound on LZ4 block expansion: every length byte adds at most 255.
const MAX_EXPANSION: usize = 255;
const EXPANSION_SLACK: usize = 16;

/// Prefix `raw.len()` as 8 native-endian bytes and hand the rest of a
/// worst-case-sized buffer to `encode`. The bound is never retried.
fn compress_framed(
    kind: CompressionKind,
    raw: &[u8],
    bound: usize,
    encode: impl FnOnce(&mut [u8]) -> Result<usize>,
) -> Result<Vec<u8>> {
    let mut out = vec![0u8; FRAME_PREFIX_LEN + bound];
    out[..FRAME_PREFIX_LEN].copy_from_slice(&(raw.len() as u64).to_ne_bytes());
    let n = encode(&mut out[FRAME_PREFIX_LEN..])?;
    if n == 0 && !raw.is_empty() {
        return Err(CodecError::stream(kind, "encoder produced no output"));
    }
    out.truncate(FRAME_PREFIX_LEN + n);
    Ok(out)
}

/// Declared original length from the 8-byte prefix.
fn frame_len(kind: CompressionKind, compressed: &[u8]) -> Result<usize> {
    if compressed.len() < FRAME_PREFIX_LEN {
        return Err(CodecError::stream(
            kind,
            format!("{} bytes is shorter than the length prefix", compressed.len()),
        ));
    }
    let mut prefix = [0u8; FRAME_PREFIX_LEN];
    prefix.copy_from_slice(&compressed[..FRAME_PREFIX_LEN]);
    usize::try_from(u64::from_ne_bytes(prefix))
        .map_err(|_| CodecError::stream(kind, "declared length does not fit in memory"))
}

/// Decode a framed payload into exactly the declared length.
///
/// Partial-capable: when the payload produces fewer bytes than declared, or
/// holds more than the declared length can take, the bytes that fit come back
/// in [`CodecError::TruncatedOutput`] instead of being dropped. Recovering an
/// overlong payload costs a scratch buffer of at most the declared length
/// plus the payload length.
fn decompress_framed(kind: CompressionKind, compressed: &[u8]) -> Result<Vec<u8>> {
    let expected = frame_len(kind, compressed)?;
    let payload = &compressed[FRAME_PREFIX_LEN..];
    let limit = payload
        .len()
        .saturating_mul(MAX_EXPANSION)
        .saturating_add(EXPANSION_SLACK);
    if expected > limit {
        return Err(CodecError::stream(
            kind,
            format!("frame declares {expected} bytes from a {} byte payload", payload.len()),
        ));
    }

    let mut out = vec![0u8; expected];
    match decompress_into(payload, &mut out) {
        Ok(n) if n == expected => Ok(out),
        Ok(n) => {
            out.truncate(n);
            Err(CodecError::TruncatedOutput {
                kind,
                partial: out,
                expected,
            })
        }
        Err(DecompressError::OutputTooSmall { .. }) => {
            // Recover the declared prefix only when the overrun is at most one
            // payload's worth; anything larger is treated as corruption.
            let mut scratch = vec![0u8; expected.saturating_add(payload.len()).min(limit)];
            let n = match decompress_into(payload, &mut scratch) {
                Ok(n) => n,
                Err(DecompressError::OutputTooSmall { .. }) => {
                    return Err(CodecError::stream(
                        kind,
                        format!("payload expands well past the declared {expected} bytes"),
                    ))
                }
                Err(e) => return Err(CodecError::stream(kind, e)),
            };
            scratch.truncate(n.min(expected));
            Err(CodecError::TruncatedOutput {
                kind,
                partial: scratch,
                expected,
            })
        }
        Err(e) => Err(CodecError::stream(kind, e)),
    }
}

/// LZ4 block codec.
///
/// Fastest decompression of all bundled codecs. The payload is prefixed with
/// the original length, so decompression allocates exactly once. No options
/// are consulted.
///
/// Best for: hot data, low-latency random access workloads.
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Lz4
    }

    fn compress(&self, _opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>> {
        let bound = get_maximum_output_size(raw.len());
        compress_framed(CompressionKind::Lz4, raw, bound, |dst| {
            compress_into(raw, dst).map_err(|e| CodecError::stream(CompressionKind::Lz4, e))
        })
    }

    fn decompress(&self, _opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>> {
        decompress_framed(CompressionKind::Lz4, compressed)
    }

    fn uncompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>> {
        frame_len(CompressionKind::Lz4, compressed).map(Some)
    }
}

/// LZ4 high-compression codec.
///
/// Same frame and decoder as [`Lz4Codec`]; encoding goes through the reference
/// LZ4HC implementation at `level` (`<= 0` picks the library default, values
/// above 12 are clamped).
///
/// Best for: read-mostly data that is written once.
pub struct Lz4HcCodec;

impl Lz4HcCodec {
    pub fn effective_level(level: i32) -> i32 {
        if level <= 0 {
            LZ4HC_DEFAULT_LEVEL
        } else {
            level.min(LZ4HC_MAX_LEVEL)
        }
    }
}

impl Codec for Lz4HcCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::Lz4Hc
    }

    fn compress(&self, opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>> {
        const KIND: CompressionKind = CompressionKind::Lz4Hc;
        let bound = lz4::block::compress_bound(raw.len()).map_err(|e| CodecError::init(KIND, e))?;
        let mode = CompressionMode::HIGHCOMPRESSION(Self::effective_level(opts.level));
        compress_framed(KIND, raw, bound, |dst| {
            lz4::block::compress_to_buffer(raw, Some(mode), false, dst)
                .map_err(|e| CodecError::stream(KIND, e))
        })
    }

    fn decompress(&self, _opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>> {
        decompress_framed(CompressionKind::Lz4Hc, compressed)
    }

    fn uncompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>> {
        frame_len(CompressionKind::Lz4Hc, compressed).map(Some)
    }
}
