//! Growable output buffer and the growth-and-retry loop shared by streaming
//! adapters.
//!
//! # Protocol
//! 1. Start at a caller-chosen capacity (input length when compressing,
//!    a multiple of it when decompressing an unframed payload).
//! 2. Hand the engine all remaining input and all spare capacity.
//! 3. [`StepStatus::Finished`]: trim to the produced bytes and return.
//! 4. [`StepStatus::NeedsOutput`]: grow by `max(growth_percent%, min_increment)`
//!    once the spare space is used up, keep produced bytes, and call the engine
//!    again. The engine resumes from its own continuation state.
//! 5. Any engine error: drop everything and propagate.
//!
//! Growth is geometric, so total bytes copied stay linear in the final size.
//! [`GrowthPolicy`] also caps the number of growth steps and the capacity, and
//! an engine that asks for more room while leaving the room it has untouched
//! is treated as stalled.

use tracing::trace;

use crate::error::{CodecError, Result};
use crate::kind::CompressionKind;

pub const DEFAULT_GROWTH_PERCENT: usize = 20;
pub const DEFAULT_MIN_INCREMENT: usize = 10;
pub const DEFAULT_MAX_GROWTH_STEPS: u32 = 128;
pub const DEFAULT_MAX_CAPACITY: usize = u32::MAX as usize;

/// Initial output guess, as a multiple of the payload, when decompressing a
/// codec whose payload does not carry its original length.
pub const UNFRAMED_EXPANSION_GUESS: usize = 5;

/// Bounds on how an output buffer may grow during one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    pub growth_percent: usize,
    pub min_increment: usize,
    /// Growth steps allowed before the call fails.
    pub max_steps: u32,
    /// Capacity the buffer may never exceed.
    pub max_capacity: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            growth_percent: DEFAULT_GROWTH_PERCENT,
            min_increment: DEFAULT_MIN_INCREMENT,
            max_steps: DEFAULT_MAX_GROWTH_STEPS,
            max_capacity: DEFAULT_MAX_CAPACITY,
        }
    }
}

impl GrowthPolicy {
    /// Capacity after one growth step from `current`.
    pub fn next_capacity(&self, current: usize) -> usize {
        let delta = (current / 100)
            .saturating_mul(self.growth_percent)
            .saturating_add(current % 100 * self.growth_percent / 100);
        current.saturating_add(delta.max(self.min_increment))
    }
}

/// Why a buffer refused to grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthLimit {
    Steps(u32),
    Capacity(usize),
}

impl GrowthLimit {
    fn into_error(self, kind: CompressionKind) -> CodecError {
        match self {
            GrowthLimit::Steps(steps) => {
                CodecError::stream(kind, format!("output still incomplete after {steps} growth steps"))
            }
            GrowthLimit::Capacity(cap) => {
                CodecError::stream(kind, format!("output would exceed {cap} bytes"))
            }
        }
    }
}

/// Owned output buffer with a logical length and a zero-filled capacity.
///
/// Bytes past `len` are never exposed: [`GrowableBuffer::into_vec`] trims to
/// exactly what was produced.
#[derive(Debug, Default)]
pub struct GrowableBuffer {
    storage: Vec<u8>,
    len: usize,
    growth_steps: u32,
}

impl GrowableBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: vec![0u8; capacity],
            len: 0,
            growth_steps: 0,
        }
    }

    /// Bytes produced so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn growth_steps(&self) -> u32 {
        self.growth_steps
    }

    #[inline]
    pub fn spare(&self) -> usize {
        self.storage.len() - self.len
    }

    /// Produced bytes.
    pub fn filled(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// Unused tail the engine may write into.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.len..]
    }

    /// Mark `n` more bytes of the spare tail as produced.
    pub fn advance(&mut self, n: usize) {
        assert!(n <= self.spare(), "advance past capacity");
        self.len += n;
    }

    /// Grow capacity by one policy step, keeping produced bytes.
    pub fn grow(&mut self, policy: &GrowthPolicy) -> Result<(), GrowthLimit> {
        if self.growth_steps >= policy.max_steps {
            return Err(GrowthLimit::Steps(self.growth_steps));
        }
        let old = self.capacity();
        if old >= policy.max_capacity {
            return Err(GrowthLimit::Capacity(policy.max_capacity));
        }
        // The last step may be short so the cap itself stays reachable.
        let new = policy.next_capacity(old).min(policy.max_capacity);
        self.storage.resize(new, 0);
        self.growth_steps += 1;
        trace!(step = self.growth_steps, old, new, "grew output buffer");
        Ok(())
    }

    /// Trim to the produced bytes and hand ownership to the caller.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.storage.truncate(self.len);
        self.storage
    }
}

/// What the engine reported after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The stream is complete; no more output will follow.
    Finished,
    /// More output remains; call again (with more room if the buffer is full).
    NeedsOutput,
}

/// Outcome of one engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// Input bytes consumed, counted from the start of the slice passed in.
    pub consumed: usize,
    /// Output bytes written, counted from the start of the slice passed in.
    pub produced: usize,
    pub status: StepStatus,
}

/// A streaming engine context owned by one adapter call.
///
/// Implementations keep their continuation state internally; the driver only
/// ever hands them the remaining input and the spare output. Dropping the
/// engine releases the native context, on success and failure alike.
pub trait StreamEngine {
    fn kind(&self) -> CompressionKind;

    /// Consume from `input`, write into `output`, and report progress.
    /// Engine failures come back as [`CodecError::StreamError`].
    fn step(&mut self, input: &[u8], output: &mut [u8]) -> Result<Step>;
}

/// Run `engine` over `input` with the growth-and-retry protocol.
pub fn drive<E: StreamEngine + ?Sized>(
    engine: &mut E,
    input: &[u8],
    initial_capacity: usize,
    policy: &GrowthPolicy,
) -> Result<Vec<u8>> {
    let kind = engine.kind();
    let mut buffer = GrowableBuffer::with_capacity(initial_capacity.min(policy.max_capacity));
    let mut consumed = 0usize;

    loop {
        if buffer.spare() == 0 {
            buffer.grow(policy).map_err(|limit| limit.into_error(kind))?;
        }

        let spare = buffer.spare();
        let step = engine.step(&input[consumed..], buffer.spare_mut())?;
        if step.consumed > input.len() - consumed || step.produced > spare {
            return Err(CodecError::stream(kind, "engine reported progress beyond its buffers"));
        }
        consumed += step.consumed;
        buffer.advance(step.produced);

        match step.status {
            StepStatus::Finished => return Ok(buffer.into_vec()),
            StepStatus::NeedsOutput => {
                if step.consumed == 0 && step.produced == 0 {
                    return Err(CodecError::stream(
                        kind,
                        format!(
                            "engine made no progress with {} input and {spare} output bytes available",
                            input.len() - consumed
                        ),
                    ));
                }
            }
        }
    }
}
