//! Pluggable compaction strategy contract.
//!
//! A background scheduler owns the strategy and calls it synchronously on its
//! own thread, so every operation must return quickly. The compacted output
//! blocks are written through the codec dispatcher using
//! [`CompactionOptions::compression`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kind::CompressionKind;
use crate::metadata::ColumnFamilyMetaData;
use crate::options::CompressionOptions;

pub const DEFAULT_NUM_LEVELS: i32 = 7;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompactionError {
    /// No beneficial compaction exists right now. Expected, not a failure.
    #[error("no compaction candidate found")]
    NotFound,
    #[error("invalid compaction input: {0}")]
    InvalidArgument(String),
    /// A selected file is already owned by another compaction.
    #[error("file {0} is already being compacted")]
    Aborted(u64),
}

/// Column-family options fixed for the lifetime of a strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImmutableCfOptions {
    pub num_levels: i32,
    pub compression: CompressionKind,
    pub compression_opts: CompressionOptions,
}

impl Default for ImmutableCfOptions {
    fn default() -> Self {
        Self {
            num_levels: DEFAULT_NUM_LEVELS,
            compression: CompressionKind::Snappy,
            compression_opts: CompressionOptions::default(),
        }
    }
}

impl ImmutableCfOptions {
    pub fn is_valid_level(&self, level: i32) -> bool {
        (0..self.num_levels).contains(&level)
    }
}

/// Options applied to every compaction a strategy schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactionOptions {
    /// Codec for the compacted output blocks.
    pub compression: CompressionKind,
    pub compression_opts: CompressionOptions,
    pub output_file_size_limit: u64,
}

impl Default for CompactionOptions {
    fn default() -> Self {
        Self {
            compression: CompressionKind::Snappy,
            compression_opts: CompressionOptions::default(),
            output_file_size_limit: u64::MAX,
        }
    }
}

/// Where the selected files go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLevel {
    Level(i32),
    /// Drop the selected files without writing any output.
    Deletion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionPlan {
    pub input_files: Vec<u64>,
    pub output_level: OutputLevel,
}

impl CompactionPlan {
    pub fn to_level(input_files: Vec<u64>, level: i32) -> Self {
        Self {
            input_files,
            output_level: OutputLevel::Level(level),
        }
    }
}

/// A compaction strategy.
///
/// None of these may block for long: they run on the scheduler's thread and a
/// slow strategy stalls all background work.
pub trait Compactor: Send + Sync {
    fn compact_options(&self) -> &CompactionOptions;

    /// Choose input files and an output level from a snapshot of the column
    /// family. [`CompactionError::NotFound`] when nothing is worth doing.
    fn pick_compaction(&self, cf_meta: &ColumnFamilyMetaData)
        -> Result<CompactionPlan, CompactionError>;

    /// Like [`Compactor::pick_compaction`], but every input must come from
    /// `input_level` and the output goes to `output_level`.
    fn pick_compaction_by_range(
        &self,
        cf_meta: &ColumnFamilyMetaData,
        input_level: i32,
        output_level: i32,
    ) -> Result<Vec<u64>, CompactionError>;

    /// Extend `input_files` (never shrink it) until it forms a valid
    /// compaction into `output_level`, or fail if no valid superset exists.
    fn sanitize_compaction_input_files(
        &self,
        input_files: &mut BTreeSet<u64>,
        cf_meta: &ColumnFamilyMetaData,
        output_level: i32,
    ) -> Result<(), CompactionError>;
}

/// Builds one [`Compactor`] per column family.
pub trait CompactorFactory: Send + Sync {
    fn compact_options(&self) -> &CompactionOptions;

    fn create_compactor(&self, ioptions: &ImmutableCfOptions) -> Box<dyn Compactor>;
}
