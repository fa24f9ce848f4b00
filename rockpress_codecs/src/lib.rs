#[cfg(feature = "bzip2")]
mod bzip2_codec;
mod capability;
mod dispatcher;
#[cfg(feature = "lz4")]
mod lz4_codec;
mod passthrough;
#[cfg(feature = "snappy")]
mod snappy_codec;
#[cfg(feature = "zlib")]
mod zlib_codec;

#[cfg(feature = "bzip2")]
pub use bzip2_codec::Bzip2Codec;
pub use capability::Capabilities;
pub use dispatcher::CodecDispatcher;
#[cfg(feature = "lz4")]
pub use lz4_codec::{Lz4Codec, Lz4HcCodec, LZ4HC_DEFAULT_LEVEL, LZ4HC_MAX_LEVEL};
pub use passthrough::PassThroughCodec;
#[cfg(feature = "snappy")]
pub use snappy_codec::SnappyCodec;
#[cfg(feature = "zlib")]
pub use zlib_codec::ZlibCodec;

use rockpress_core::{Codec, CompressionKind};
use std::sync::Arc;

/// Resolve the adapter for a stored kind.
///
/// Returns `None` when the codec was not compiled into this build; the
/// dispatcher turns that into `CodecError::Unsupported`.
pub fn codec_for(kind: CompressionKind) -> Option<Arc<dyn Codec>> {
    match kind {
        CompressionKind::None => Some(Arc::new(PassThroughCodec)),
        #[cfg(feature = "snappy")]
        CompressionKind::Snappy => Some(Arc::new(SnappyCodec)),
        #[cfg(feature = "zlib")]
        CompressionKind::Zlib => Some(Arc::new(ZlibCodec::default())),
        #[cfg(feature = "bzip2")]
        CompressionKind::BZip2 => Some(Arc::new(Bzip2Codec::default())),
        #[cfg(feature = "lz4")]
        CompressionKind::Lz4 => Some(Arc::new(Lz4Codec)),
        #[cfg(feature = "lz4")]
        CompressionKind::Lz4Hc => Some(Arc::new(Lz4HcCodec)),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
