use bzip2::{Action, Compress, Compression, Decompress, Status};
use rockpress_core::{
    drive, Codec, CodecError, CompressionKind, CompressionOptions, GrowthPolicy, Result, Step,
    StepStatus, StreamEngine, UNFRAMED_EXPANSION_GUESS,
};

const KIND: CompressionKind = CompressionKind::BZip2;

/// 100 KB blocks.
const BLOCK_SIZE: u32 = 1;
const WORK_FACTOR: u32 = 30;

struct BzCompressor(Compress);

impl StreamEngine for BzCompressor {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step> {
        let (in_before, out_before) = (self.0.total_in(), self.0.total_out());
        let status = self
            .0
            .compress(input, output, Action::Finish)
            .map_err(|e| CodecError::stream(KIND, e))?;
        // Only the engine's end-of-stream status ends the loop; running out of
        // input alone does not, since the final flush may still be pending.
        let status = match status {
            Status::StreamEnd => StepStatus::Finished,
            Status::FinishOk => StepStatus::NeedsOutput,
            other => {
                return Err(CodecError::stream(
                    KIND,
                    format!("unexpected status {other:?} while finishing"),
                ))
            }
        };
        Ok(Step {
            consumed: (self.0.total_in() - in_before) as usize,
            produced: (self.0.total_out() - out_before) as usize,
            status,
        })
    }
}

struct BzDecompressor(Decompress);

impl StreamEngine for BzDecompressor {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step> {
        let (in_before, out_before) = (self.0.total_in(), self.0.total_out());
        let status = self
            .0
            .decompress(input, output)
            .map_err(|e| CodecError::stream(KIND, e))?;
        let status = match status {
            Status::StreamEnd => StepStatus::Finished,
            Status::Ok => StepStatus::NeedsOutput,
            other => {
                return Err(CodecError::stream(
                    KIND,
                    format!("unexpected status {other:?} while decompressing"),
                ))
            }
        };
        Ok(Step {
            consumed: (self.0.total_in() - in_before) as usize,
            produced: (self.0.total_out() - out_before) as usize,
            status,
        })
    }
}

/// BZip2 codec with a fixed 100 KB block size and work factor 30.
///
/// Streaming in both directions with the same sizing and growth rules as
/// [`ZlibCodec`](crate::ZlibCodec). No options are consulted.
///
/// Best for: archival tiers; slow in both directions.
#[derive(Default)]
pub struct Bzip2Codec {
    policy: GrowthPolicy,
}

impl Bzip2Codec {
    pub fn with_policy(policy: GrowthPolicy) -> Self {
        Self { policy }
    }
}

impl Codec for Bzip2Codec {
    fn kind(&self) -> CompressionKind {
        KIND
    }

    fn compress(&self, _opts: &CompressionOptions, raw: &[u8]) -> Result<Vec<u8>> {
        let mut engine = BzCompressor(Compress::new(Compression::new(BLOCK_SIZE), WORK_FACTOR));
        drive(&mut engine, raw, raw.len(), &self.policy)
    }

    fn decompress(&self, _opts: &CompressionOptions, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut engine = BzDecompressor(Decompress::new(false));
        let guess = compressed.len().saturating_mul(UNFRAMED_EXPANSION_GUESS);
        drive(&mut engine, compressed, guess, &self.policy)
    }
}
