use std::collections::BTreeSet;

use tracing::debug;

use crate::compaction::{
    CompactionError, CompactionOptions, CompactionPlan, Compactor, CompactorFactory,
    ImmutableCfOptions,
};
use crate::metadata::{ColumnFamilyMetaData, SstFileMetaData};

/// Reference strategy: merge every live file into the deepest non-empty level.
///
/// Useful as a baseline and for exercising the scheduler; it makes no attempt
/// to bound write amplification.
pub struct FullCompactor {
    ioptions: ImmutableCfOptions,
    compact_options: CompactionOptions,
}

impl FullCompactor {
    pub fn new(ioptions: ImmutableCfOptions, compact_options: CompactionOptions) -> Self {
        Self {
            ioptions,
            compact_options,
        }
    }

    fn check_level(&self, level: i32, what: &str) -> Result<(), CompactionError> {
        if self.ioptions.is_valid_level(level) {
            Ok(())
        } else {
            Err(CompactionError::InvalidArgument(format!(
                "{what} {level} outside 0..{}",
                self.ioptions.num_levels
            )))
        }
    }
}

/// Smallest and largest key over `files`.
fn key_span<'a>(files: impl Iterator<Item = &'a SstFileMetaData>) -> Option<(Vec<u8>, Vec<u8>)> {
    files.fold(None, |span, f| match span {
        None => Some((f.smallest_key.clone(), f.largest_key.clone())),
        Some((lo, hi)) => Some((
            lo.min(f.smallest_key.clone()),
            hi.max(f.largest_key.clone()),
        )),
    })
}

impl Compactor for FullCompactor {
    fn compact_options(&self) -> &CompactionOptions {
        &self.compact_options
    }

    fn pick_compaction(
        &self,
        cf_meta: &ColumnFamilyMetaData,
    ) -> Result<CompactionPlan, CompactionError> {
        if cf_meta.files().any(|(_, f)| f.being_compacted) {
            debug!(cf = %cf_meta.name, "compaction already running, skipping");
            return Err(CompactionError::NotFound);
        }
        let output_level = cf_meta
            .last_non_empty_level()
            .ok_or(CompactionError::NotFound)?;

        let input_files: Vec<u64> = cf_meta.files().map(|(_, f)| f.file_number).collect();
        // A lone file has nothing to merge with.
        if input_files.len() == 1 {
            return Err(CompactionError::NotFound);
        }
        Ok(CompactionPlan::to_level(input_files, output_level))
    }

    fn pick_compaction_by_range(
        &self,
        cf_meta: &ColumnFamilyMetaData,
        input_level: i32,
        output_level: i32,
    ) -> Result<Vec<u64>, CompactionError> {
        self.check_level(input_level, "input level")?;
        self.check_level(output_level, "output level")?;
        if output_level < input_level {
            return Err(CompactionError::InvalidArgument(format!(
                "output level {output_level} is above input level {input_level}"
            )));
        }

        let level = cf_meta.level(input_level).ok_or(CompactionError::NotFound)?;
        if level.files.is_empty() || level.files.iter().any(|f| f.being_compacted) {
            return Err(CompactionError::NotFound);
        }
        Ok(level.files.iter().map(|f| f.file_number).collect())
    }

    fn sanitize_compaction_input_files(
        &self,
        input_files: &mut BTreeSet<u64>,
        cf_meta: &ColumnFamilyMetaData,
        output_level: i32,
    ) -> Result<(), CompactionError> {
        self.check_level(output_level, "output level")?;
        if input_files.is_empty() {
            return Err(CompactionError::InvalidArgument("no input files".into()));
        }

        let mut start_level = output_level;
        for &number in input_files.iter() {
            let (level, file) = cf_meta.find_file(number).ok_or_else(|| {
                CompactionError::InvalidArgument(format!("file {number} is not live"))
            })?;
            if file.being_compacted {
                return Err(CompactionError::Aborted(number));
            }
            if level > output_level {
                return Err(CompactionError::InvalidArgument(format!(
                    "file {number} on level {level} is below output level {output_level}"
                )));
            }
            start_level = start_level.min(level);
        }

        // Pull in every overlapping file between the shallowest input level and
        // the output level until the key span stops widening.
        loop {
            let (smallest, largest) = key_span(
                input_files
                    .iter()
                    .filter_map(|n| cf_meta.find_file(*n).map(|(_, f)| f)),
            )
            .ok_or(CompactionError::NotFound)?;

            let mut added = false;
            for (level, file) in cf_meta.files() {
                if level < start_level || level > output_level {
                    continue;
                }
                if input_files.contains(&file.file_number) || !file.overlaps(&smallest, &largest) {
                    continue;
                }
                if file.being_compacted {
                    return Err(CompactionError::Aborted(file.file_number));
                }
                input_files.insert(file.file_number);
                added = true;
            }
            if !added {
                return Ok(());
            }
        }
    }
}

/// Hands out a [`FullCompactor`] per column family.
pub struct FullCompactorFactory {
    compact_options: CompactionOptions,
}

impl FullCompactorFactory {
    pub fn new(compact_options: CompactionOptions) -> Self {
        Self { compact_options }
    }
}

impl CompactorFactory for FullCompactorFactory {
    fn compact_options(&self) -> &CompactionOptions {
        &self.compact_options
    }

    fn create_compactor(&self, ioptions: &ImmutableCfOptions) -> Box<dyn Compactor> {
        Box::new(FullCompactor::new(
            ioptions.clone(),
            self.compact_options.clone(),
        ))
    }
}
