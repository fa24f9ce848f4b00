use std::fmt;

use serde::{Deserialize, Serialize};

// ── Kind IDs ───────────────────────────────────────────────────────────────
//
// Stable tags persisted by the storage engine next to each block.

pub const KIND_NONE: u8 = 0;
pub const KIND_SNAPPY: u8 = 1;
pub const KIND_ZLIB: u8 = 2;
pub const KIND_BZIP2: u8 = 3;
pub const KIND_LZ4: u8 = 4;
pub const KIND_LZ4HC: u8 = 5;

/// Size of the original-length prefix carried by framed payloads (LZ4/LZ4HC).
pub const FRAME_PREFIX_LEN: usize = 8;

/// Identifies which codec encoded a block, and therefore which must decode it.
///
/// The tag is kept out-of-band by the caller. Only the LZ4 family embeds the
/// original length in the payload itself; for every other kind the caller must
/// persist the uncompressed length alongside the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompressionKind {
    #[default]
    None,
    Snappy,
    Zlib,
    BZip2,
    Lz4,
    Lz4Hc,
}

impl CompressionKind {
    /// Every kind, in id order.
    pub const ALL: [CompressionKind; 6] = [
        CompressionKind::None,
        CompressionKind::Snappy,
        CompressionKind::Zlib,
        CompressionKind::BZip2,
        CompressionKind::Lz4,
        CompressionKind::Lz4Hc,
    ];

    /// Stable id stored next to the block.
    pub fn id(self) -> u8 {
        match self {
            CompressionKind::None => KIND_NONE,
            CompressionKind::Snappy => KIND_SNAPPY,
            CompressionKind::Zlib => KIND_ZLIB,
            CompressionKind::BZip2 => KIND_BZIP2,
            CompressionKind::Lz4 => KIND_LZ4,
            CompressionKind::Lz4Hc => KIND_LZ4HC,
        }
    }

    /// Resolve a stored id. Returns `None` for ids this build has never heard of.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            KIND_NONE => Some(CompressionKind::None),
            KIND_SNAPPY => Some(CompressionKind::Snappy),
            KIND_ZLIB => Some(CompressionKind::Zlib),
            KIND_BZIP2 => Some(CompressionKind::BZip2),
            KIND_LZ4 => Some(CompressionKind::Lz4),
            KIND_LZ4HC => Some(CompressionKind::Lz4Hc),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionKind::None => "none",
            CompressionKind::Snappy => "snappy",
            CompressionKind::Zlib => "zlib",
            CompressionKind::BZip2 => "bzip2",
            CompressionKind::Lz4 => "lz4",
            CompressionKind::Lz4Hc => "lz4hc",
        }
    }

    /// True when the payload starts with an 8-byte original-length prefix.
    pub fn is_framed(self) -> bool {
        matches!(self, CompressionKind::Lz4 | CompressionKind::Lz4Hc)
    }
}

impl fmt::Display for CompressionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
