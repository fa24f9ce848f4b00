//! Snapshot of a column family's stored files, handed to a [`Compactor`].
//!
//! [`Compactor`]: crate::compaction::Compactor

pub type SequenceNumber = u64;

/// One stored file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SstFileMetaData {
    pub file_number: u64,
    /// File size in bytes.
    pub size: u64,
    pub name: String,
    /// Directory holding the file.
    pub path: String,
    pub smallest_seqno: SequenceNumber,
    pub largest_seqno: SequenceNumber,
    pub smallest_key: Vec<u8>,
    pub largest_key: Vec<u8>,
    /// Already an input of a running compaction.
    pub being_compacted: bool,
}

impl SstFileMetaData {
    /// Inclusive key-range overlap.
    pub fn overlaps(&self, smallest: &[u8], largest: &[u8]) -> bool {
        self.smallest_key.as_slice() <= largest && smallest <= self.largest_key.as_slice()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelMetaData {
    pub level: i32,
    /// Total bytes on this level.
    pub size: u64,
    pub files: Vec<SstFileMetaData>,
}

impl LevelMetaData {
    pub fn new(level: i32, files: Vec<SstFileMetaData>) -> Self {
        let size = files.iter().map(|f| f.size).sum();
        Self { level, size, files }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamilyMetaData {
    pub name: String,
    /// Total bytes across all levels.
    pub size: u64,
    pub levels: Vec<LevelMetaData>,
}

impl ColumnFamilyMetaData {
    pub fn new(name: impl Into<String>, levels: Vec<LevelMetaData>) -> Self {
        let size = levels.iter().map(|l| l.size).sum();
        Self {
            name: name.into(),
            size,
            levels,
        }
    }

    pub fn files(&self) -> impl Iterator<Item = (i32, &SstFileMetaData)> {
        self.levels
            .iter()
            .flat_map(|l| l.files.iter().map(move |f| (l.level, f)))
    }

    /// Level and metadata of `file_number`, if the file is live.
    pub fn find_file(&self, file_number: u64) -> Option<(i32, &SstFileMetaData)> {
        self.files().find(|(_, f)| f.file_number == file_number)
    }

    pub fn level(&self, level: i32) -> Option<&LevelMetaData> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// Highest level that holds at least one file.
    pub fn last_non_empty_level(&self) -> Option<i32> {
        self.levels
            .iter()
            .filter(|l| !l.files.is_empty())
            .map(|l| l.level)
            .max()
    }
}
