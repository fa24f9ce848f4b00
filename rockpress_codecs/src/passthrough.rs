use rockpress_core::{Codec, CompressionKind, CompressionOptions, Result};

/// No-op codec: blocks are stored verbatim.
///
/// Backs [`CompressionKind::None`], which is also where the write path lands
/// when any other codec fails or is missing from the build.
pub struct PassThroughCodec;

impl Codec for PassThroughCodec {
    fn kind(&self) -> CompressionKind {
        CompressionKind::None
    }

    fn compress(&self, _opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>> {
        Ok(raw.to_vec())
    }

    fn decompress(&self, _opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>> {
        Ok(compressed.to_vec())
    }

    fn uncompressed_len(&self, compressed: &[u8]) -> Result<Option<usize>> {
        Ok(Some(compressed.len()))
    }
}
