pub mod buffer;
pub mod codec;
pub mod compaction;
pub mod error;
pub mod full_compactor;
pub mod kind;
pub mod metadata;
pub mod options;

pub use buffer::{
    drive, GrowableBuffer, GrowthPolicy, Step, StepStatus, StreamEngine, UNFRAMED_EXPANSION_GUESS,
};
pub use codec::Codec;
pub use compaction::{
    CompactionError, CompactionOptions, CompactionPlan, Compactor, CompactorFactory,
    ImmutableCfOptions, OutputLevel,
};
pub use error::{CodecError, Result};
pub use full_compactor::{FullCompactor, FullCompactorFactory};
pub use kind::{CompressionKind, FRAME_PREFIX_LEN};
pub use metadata::{ColumnFamilyMetaData, LevelMetaData, SstFileMetaData};
pub use options::CompressionOptions;
