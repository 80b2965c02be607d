//! Run summary: what the pipeline processed, skipped and why.

use std::fmt;

use crate::error::ExportError;
use crate::photos::PhotoStats;

/// Accumulated outcome of one pipeline run.
///
/// Local failures are collected in [`issues`](RunSummary::issues) rather
/// than aborting the run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Archive files found in the input directory.
    pub archives_found: usize,
    /// Archive-level failures: archives that could not be opened, entries
    /// left out of the tree and entries that failed to decompress.
    pub archives_failed: usize,
    /// Entries hidden by an identically named entry in an earlier shard.
    pub entries_shadowed: usize,
    /// Post files decoded, fully or in part.
    pub post_files_read: usize,
    /// Post files that could not be read or decoded at all.
    pub post_files_failed: usize,
    /// Records successfully parsed, duplicates included.
    pub records_parsed: usize,
    /// Records skipped because they were too malformed.
    pub records_skipped: usize,
    /// Records dropped because an earlier record had the same id.
    pub duplicates: usize,
    /// Records in the final output.
    pub records_written: usize,
    /// Photo copy counters.
    pub photos: PhotoStats,
    /// Every non-fatal error, in the order it happened.
    pub issues: Vec<ExportError>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if anything was skipped or missing.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty() || self.duplicates > 0
    }

    /// Number of archive-level failures recorded.
    pub fn archive_issues(&self) -> usize {
        self.issues.iter().filter(|e| e.is_archive_corrupt()).count()
    }

    /// Number of record-level failures recorded.
    pub fn record_issues(&self) -> usize {
        self.issues.iter().filter(|e| e.is_record_parse()).count()
    }

    /// Number of missing photo references recorded.
    pub fn photo_issues(&self) -> usize {
        self.issues.iter().filter(|e| e.is_photo_missing()).count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Archives:  {} found, {} failed, {} shadowed entries",
            self.archives_found, self.archives_failed, self.entries_shadowed
        )?;
        writeln!(
            f,
            "Files:     {} post files read, {} failed",
            self.post_files_read, self.post_files_failed
        )?;
        writeln!(
            f,
            "Records:   {} parsed, {} skipped, {} duplicates, {} written",
            self.records_parsed, self.records_skipped, self.duplicates, self.records_written
        )?;
        write!(
            f,
            "Photos:    {} copied, {} already present, {} reused, {} missing",
            self.photos.copied, self.photos.already_present, self.photos.reused, self.photos.missing
        )
    }
}
