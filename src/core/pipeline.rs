//! Extraction pipeline.
//!
//! [`Pipeline::run`] takes an input directory of export shards to an ordered,
//! de-duplicated set of [`PostRecord`]s with their photos copied:
//!
//! 1. open and merge every shard ([`ArchiveTree`])
//! 2. parse every post file ([`PostParser`])
//! 3. drop duplicate ids, first seen wins ([`dedup_records`])
//! 4. resolve and copy photos ([`PhotoResolver`])
//! 5. order by timestamp, id as tiebreak ([`sort_records`])
//!
//! Archive, record and photo failures are tallied in the [`RunSummary`];
//! only a missing input or an unwritable output aborts the run.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use log::{debug, info, warn};

use crate::archive::ArchiveTree;
use crate::config::{ExportConfig, SortOrder};
use crate::core::summary::RunSummary;
use crate::error::Result;
use crate::parser::PostParser;
use crate::photos::PhotoResolver;
use crate::record::PostRecord;

/// Final output of a pipeline run.
#[derive(Debug)]
pub struct Extraction {
    /// Records in output order.
    pub records: Vec<PostRecord>,
    /// What happened along the way.
    pub summary: RunSummary,
}

/// The extraction pipeline.
///
/// # Example
///
/// ```rust,no_run
/// use postpack::config::ExportConfig;
/// use postpack::core::Pipeline;
/// use std::path::Path;
///
/// let pipeline = Pipeline::new(ExportConfig::default());
/// let extraction = pipeline.run(Path::new("downloaded_facebook_data"), Path::new("website/photos"))?;
/// println!("{}", extraction.summary);
/// # Ok::<(), postpack::ExportError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: ExportConfig,
}

impl Pipeline {
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Runs the pipeline over every archive in `input_dir`, copying photos
    /// into `photos_dir`.
    pub fn run(&self, input_dir: &Path, photos_dir: &Path) -> Result<Extraction> {
        let loaded = ArchiveTree::open_dir(input_dir, &self.config)?;
        let mut tree = loaded.tree;

        let mut summary = RunSummary::new();
        summary.archives_found = loaded.archives_found;
        summary.entries_shadowed = tree.shadowed();
        summary.issues.extend(loaded.failures);

        let parsed = PostParser::with_config(self.config.clone()).parse_tree(&mut tree);
        summary.post_files_read = parsed.files_read;
        summary.post_files_failed = parsed.files_failed;
        summary.records_parsed = parsed.records.len();
        summary.records_skipped = parsed.records_skipped;
        summary.issues.extend(parsed.failures);
        summary.archives_failed = summary.archive_issues();
        info!(
            "Parsed {} record(s) from {} post file(s)",
            parsed.records.len(),
            parsed.files_read
        );

        let (records, duplicates) = dedup_records(parsed.records);
        summary.duplicates = duplicates;
        if duplicates > 0 {
            info!("Dropped {duplicates} duplicate record(s)");
        }

        let mut resolver = PhotoResolver::new(&mut tree, photos_dir)?;
        let mut records = records
            .into_iter()
            .map(|mut record| -> Result<PostRecord> {
                let (photos, missing) = resolver.resolve_all(&record.photos)?;
                for issue in &missing {
                    warn!("Post {} ({}): {issue}", record.id, record.source_archive);
                }
                record.photos = photos;
                summary.issues.extend(missing);
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;
        summary.photos = resolver.stats();

        sort_records(&mut records, self.config.order);
        summary.records_written = records.len();
        debug!("Final order: {}", self.config.order);

        Ok(Extraction { records, summary })
    }
}

/// Removes records whose id was already seen. Returns the survivors, in
/// their original order, and the number dropped.
pub fn dedup_records(records: Vec<PostRecord>) -> (Vec<PostRecord>, usize) {
    let mut seen = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for record in records {
        if seen.insert(record.id.clone()) {
            kept.push(record);
        } else {
            debug!(
                "Duplicate post {} from {} dropped",
                record.id, record.source_archive
            );
            dropped += 1;
        }
    }

    (kept, dropped)
}

/// Compares two records in output order.
pub fn compare_records(a: &PostRecord, b: &PostRecord, order: SortOrder) -> Ordering {
    let by_time = match order {
        SortOrder::NewestFirst => b.timestamp.cmp(&a.timestamp),
        SortOrder::OldestFirst => a.timestamp.cmp(&b.timestamp),
    };
    by_time.then_with(|| a.id.cmp(&b.id))
}

/// Sorts records by timestamp in the given direction, ties by ascending id.
pub fn sort_records(records: &mut [PostRecord], order: SortOrder) {
    records.sort_by(|a, b| compare_records(a, b, order));
}
