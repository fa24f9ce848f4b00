use serde::{Deserialize, Serialize};

/// Library-default compression level sentinel (zlib's `Z_DEFAULT_COMPRESSION`).
pub const DEFAULT_LEVEL: i32 = -1;

/// Raw deflate with a 16 KB window.
pub const DEFAULT_WINDOW_BITS: i32 = -14;

/// Deflate's default strategy.
pub const DEFAULT_STRATEGY: i32 = 0;

/// Per-call tuning knobs.
///
/// Each codec consults only the fields that mean something to it and ignores
/// the rest: Zlib reads all three, LZ4HC reads `level`, Snappy/BZip2/LZ4 read
/// nothing. Unused fields are never validated against the selected kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    /// Codec-specific level. `-1` selects the library default.
    pub level: i32,
    /// Deflate window size. Negative (-15..=-9) selects raw deflate, 9..=15 a
    /// zlib header, 25..=31 a gzip header. On decompression any positive value
    /// enables automatic zlib/gzip header detection.
    pub window_bits: i32,
    /// Deflate strategy (0 = default, 1 = filtered, 2 = huffman only,
    /// 3 = rle, 4 = fixed).
    pub strategy: i32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            window_bits: DEFAULT_WINDOW_BITS,
            strategy: DEFAULT_STRATEGY,
        }
    }
}

impl CompressionOptions {
    pub fn new(level: i32, window_bits: i32, strategy: i32) -> Self {
        Self {
            level,
            window_bits,
            strategy,
        }
    }

    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn with_window_bits(mut self, window_bits: i32) -> Self {
        self.window_bits = window_bits;
        self
    }
}
