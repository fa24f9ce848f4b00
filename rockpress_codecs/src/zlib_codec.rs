use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use rockpress_core::{
    drive, Codec, CodecError, CompressionKind, CompressionOptions, GrowthPolicy, Result, Step,
    StepStatus, StreamEngine, UNFRAMED_EXPANSION_GUESS,
};
use tracing::debug;

const KIND: CompressionKind = CompressionKind::Zlib;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const MIN_WINDOW_BITS: i32 = 9;
const MAX_WINDOW_BITS: i32 = 15;
const GZIP_WINDOW_OFFSET: i32 = 16;
const AUTO_DETECT_WINDOW_OFFSET: i32 = 32;
const MAX_STRATEGY: i32 = 4;

/// Header written in front of the deflate stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Header {
    Raw,
    Zlib,
    Gzip,
}

fn window_size(bits: i32) -> Result<u8> {
    if (MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&bits) {
        Ok(bits as u8)
    } else {
        Err(CodecError::init(
            KIND,
            format!("window_bits magnitude {bits} outside {MIN_WINDOW_BITS}..={MAX_WINDOW_BITS}"),
        ))
    }
}

/// Map `window_bits` onto a header and window size for compression.
fn compress_header(window_bits: i32) -> Result<(Header, u8)> {
    if window_bits < 0 {
        Ok((Header::Raw, window_size(-window_bits)?))
    } else if window_bits > MAX_WINDOW_BITS {
        Ok((Header::Gzip, window_size(window_bits - GZIP_WINDOW_OFFSET)?))
    } else {
        Ok((Header::Zlib, window_size(window_bits)?))
    }
}

/// Map `window_bits` onto a header and window size for decompression.
/// Any non-negative value turns on zlib/gzip detection from the payload.
fn decompress_header(window_bits: i32, payload: &[u8]) -> Result<(Header, u8)> {
    if window_bits < 0 {
        return Ok((Header::Raw, window_size(-window_bits)?));
    }
    let mut bits = window_bits;
    if bits >= AUTO_DETECT_WINDOW_OFFSET {
        bits -= AUTO_DETECT_WINDOW_OFFSET;
    }
    if bits > MAX_WINDOW_BITS {
        bits -= GZIP_WINDOW_OFFSET;
    }
    if bits == 0 {
        bits = MAX_WINDOW_BITS;
    }
    let window = window_size(bits)?;
    if payload.starts_with(&GZIP_MAGIC) {
        Ok((Header::Gzip, window))
    } else {
        Ok((Header::Zlib, window))
    }
}

fn level(opts: &CompressionOptions) -> Result<Compression> {
    match opts.level {
        -1 => Ok(Compression::default()),
        0..=9 => Ok(Compression::new(opts.level as u32)),
        other => Err(CodecError::init(KIND, format!("level {other} outside -1..=9"))),
    }
}

/// Deflate context for one call. Dropping it ends the stream.
struct Deflater(Compress);

impl Deflater {
    fn new(opts: &CompressionOptions) -> Result<Self> {
        let level = level(opts)?;
        if !(0..=MAX_STRATEGY).contains(&opts.strategy) {
            return Err(CodecError::init(
                KIND,
                format!("strategy {} outside 0..={MAX_STRATEGY}", opts.strategy),
            ));
        }
        if opts.strategy != 0 {
            debug!(strategy = opts.strategy, "deflate backend has no strategy control, using default");
        }
        let compress = match compress_header(opts.window_bits)? {
            (Header::Raw, window) => Compress::new_with_window_bits(level, false, window),
            (Header::Zlib, window) => Compress::new_with_window_bits(level, true, window),
            (Header::Gzip, window) => Compress::new_gzip(level, window),
        };
        Ok(Self(compress))
    }
}

impl StreamEngine for Deflater {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step> {
        let (in_before, out_before) = (self.0.total_in(), self.0.total_out());
        let status = self
            .0
            .compress(input, output, FlushCompress::Finish)
            .map_err(|e| CodecError::stream(KIND, e))?;
        let status = match status {
            Status::StreamEnd => StepStatus::Finished,
            Status::Ok => StepStatus::NeedsOutput,
            Status::BufError => {
                return Err(CodecError::stream(KIND, "deflate could not make progress"))
            }
        };
        Ok(Step {
            consumed: (self.0.total_in() - in_before) as usize,
            produced: (self.0.total_out() - out_before) as usize,
            status,
        })
    }
}

/// Inflate context for one call. Dropping it ends the stream.
struct Inflater(Decompress);

impl Inflater {
    fn new(opts: &CompressionOptions, payload: &[u8]) -> Result<Self> {
        let decompress = match decompress_header(opts.window_bits, payload)? {
            (Header::Raw, window) => Decompress::new_with_window_bits(false, window),
            (Header::Zlib, window) => Decompress::new_with_window_bits(true, window),
            (Header::Gzip, window) => Decompress::new_gzip(window),
        };
        Ok(Self(decompress))
    }
}

impl StreamEngine for Inflater {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step> {
        let (in_before, out_before) = (self.0.total_in(), self.0.total_out());
        let status = self
            .0
            .decompress(input, output, FlushDecompress::Sync)
            .map_err(|e| CodecError::stream(KIND, e))?;
        let status = match status {
            Status::StreamEnd => StepStatus::Finished,
            Status::Ok => StepStatus::NeedsOutput,
            Status::BufError => {
                return Err(CodecError::stream(KIND, "deflate stream is truncated"))
            }
        };
        Ok(Step {
            consumed: (self.0.total_in() - in_before) as usize,
            produced: (self.0.total_out() - out_before) as usize,
            status,
        })
    }
}

/// Deflate codec (raw, zlib, or gzip framing depending on `window_bits`).
///
/// Streaming in both directions. Compression starts with an output buffer as
/// large as the input; decompression guesses five times the payload. Both grow
/// under [`GrowthPolicy`] until the engine reports the end of the stream.
/// Consults `level`, `window_bits`, and `strategy`.
///
/// Best for: cold data where ratio matters more than speed.
#[derive(Default)]
pub struct ZlibCodec {
    policy: GrowthPolicy,
}

impl ZlibCodec {
    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self { policy }
    }
}

impl Codec for ZlibCodec {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn compress(&self, opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>> {
        let mut engine = Deflater::new(opts)?;
        drive(&mut engine, raw, raw.len(), &self.policy)
    }

    fn decompress(&self, opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut engine = Inflater::new(opts, compressed)?;
        let guess = compressed.len().saturating_mul(UNFRAMED_EXPANSION_GUESS);
        drive(&mut engine, compressed, guess, &self.policy)
    }
}
