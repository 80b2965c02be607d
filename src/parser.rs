//! Record parser for Facebook post files.
//!
//! [`PostParser`] finds every post file in an [`ArchiveTree`], splits each
//! into entries and normalizes every entry into a [`PostRecord`]. A broken
//! entry costs only itself: it is reported as
//! [`ExportError::RecordParse`] and the rest of the file is still read.
//!
//! # Example
//!
//! ```rust
//! use postpack::parser::PostParser;
//!
//! let json = r#"[
//!     {"timestamp": 1705314600, "data": [{"post": "Hello world"}]},
//!     {"data": [{"post": "no timestamp, skipped"}]}
//! ]"#;
//!
//! let parser = PostParser::new();
//! let parsed = parser.parse_str(json, "posts/your_posts_1.json", "export.zip")?;
//! assert_eq!(parsed.records.len(), 1);
//! assert_eq!(parsed.failures.len(), 1);
//! # Ok::<(), postpack::ExportError>(())
//! ```

use log::{debug, warn};
use serde_json::Value;

use crate::archive::ArchiveTree;
use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::parsing::facebook::{NormalizeOptions, RawPost, normalize_post};
use crate::record::PostRecord;

/// Records decoded from one post file, plus the entries that were skipped.
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub records: Vec<PostRecord>,
    pub failures: Vec<ExportError>,
}

/// Everything the parser got out of a tree.
#[derive(Debug, Default)]
pub struct ParsedPosts {
    /// Records in discovery order (file path order, then position in file).
    pub records: Vec<PostRecord>,
    /// Post files that were decoded, fully or in part.
    pub files_read: usize,
    /// Post files that could not be read or decoded at all.
    pub files_failed: usize,
    /// Individual entries that were skipped.
    pub records_skipped: usize,
    /// One error per skipped file or entry.
    pub failures: Vec<ExportError>,
}

/// Parser for `your_posts*.json` files.
#[derive(Debug, Clone, Default)]
pub struct PostParser {
    config: ExportConfig,
}

impl PostParser {
    /// Creates a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom configuration.
    pub fn with_config(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    fn options(&self) -> NormalizeOptions {
        NormalizeOptions {
            fix_encoding: self.config.fix_encoding,
            skip_stickers: self.config.skip_stickers,
        }
    }

    /// Paths in `tree` that hold post data, in sorted order.
    pub fn post_files(&self, tree: &ArchiveTree) -> Vec<String> {
        tree.paths()
            .filter(|path| self.config.is_post_file(path))
            .map(str::to_string)
            .collect()
    }

    /// Parses every post file in `tree`.
    pub fn parse_tree(&self, tree: &mut ArchiveTree) -> ParsedPosts {
        let mut parsed = ParsedPosts::default();

        for path in self.post_files(tree) {
            let source = tree.source_of(&path).unwrap_or_default().to_string();
            debug!("Reading {path} from {source}");

            let bytes = match tree.read(&path) {
                Ok(Some(bytes)) => bytes,
                // the path was listed by the tree itself
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping post file {path}: {e}");
                    parsed.files_failed += 1;
                    parsed.failures.push(e);
                    continue;
                }
            };

            match self.parse_slice(&bytes, &path, &source) {
                Ok(file) => {
                    parsed.files_read += 1;
                    parsed.records_skipped += file.failures.len();
                    parsed.records.extend(file.records);
                    parsed.failures.extend(file.failures);
                }
                Err(e) => {
                    warn!("{e}");
                    parsed.files_failed += 1;
                    parsed.failures.push(e);
                }
            }
        }

        parsed
    }

    /// Parses post file content from a string.
    pub fn parse_str(&self, content: &str, file: &str, source_archive: &str) -> Result<ParsedFile> {
        self.parse_slice(content.as_bytes(), file, source_archive)
    }

    /// Parses post file content.
    ///
    /// Fails as a whole only when the content isn't JSON or holds no list of
    /// posts; otherwise bad entries are collected in [`ParsedFile::failures`].
    pub fn parse_slice(&self, bytes: &[u8], file: &str, source_archive: &str) -> Result<ParsedFile> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ExportError::record_parse(file, None, e.to_string()))?;

        let entries = post_entries(value).ok_or_else(|| {
            ExportError::record_parse(file, None, "expected a list of posts")
        })?;

        let options = self.options();
        let mut parsed = ParsedFile::default();

        for (index, entry) in entries.into_iter().enumerate() {
            let record = serde_json::from_value::<RawPost>(entry)
                .map_err(|e| e.to_string())
                .and_then(|raw| normalize_post(raw, source_archive, options));

            match record {
                Ok(record) => parsed.records.push(record),
                Err(reason) => {
                    warn!("Skipping record #{index} in {file} ({source_archive}): {reason}");
                    parsed
                        .failures
                        .push(ExportError::record_parse(file, Some(index), reason));
                }
            }
        }

        debug!(
            "{file}: {} record(s), {} skipped",
            parsed.records.len(),
            parsed.failures.len()
        );
        Ok(parsed)
    }
}

/// Pulls the list of posts out of a post file.
///
/// Current exports are a bare array; older ones wrap it in an object such as
/// `{"status_updates_v2": [...]}`, in which case the first array-valued
/// member (by key) is used.
fn post_entries(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => map.into_iter().find_map(|(_, v)| match v {
            Value::Array(items) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}
