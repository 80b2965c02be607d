//! Unified error types for postpack.
//!
//! A single [`ExportError`] enum covers every failure in the library. Three
//! variants are *local* failures that the extraction pipeline tallies and
//! moves past:
//!
//! - [`ExportError::ArchiveCorrupt`]: one archive (or one entry of it) could
//!   not be opened or decompressed
//! - [`ExportError::RecordParse`]: one post (or one post file) was too
//!   malformed to yield a timestamp
//! - [`ExportError::PhotoMissing`]: one photo reference could not be resolved
//!
//! Everything else aborts the run. Use [`ExportError::is_fatal`] to tell the
//! two groups apart.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for postpack operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// The error type for all postpack operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// An I/O error occurred outside of any archive.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// An archive could not be opened, or one of its entries could not be
    /// decompressed.
    #[error("Archive '{archive}' is corrupt: {source}")]
    ArchiveCorrupt {
        /// Archive name; nested archives are shown as `outer.zip/inner.zip`
        archive: String,
        /// What went wrong
        #[source]
        source: ArchiveErrorKind,
    },

    /// A post record (or a whole post file) could not be decoded.
    #[error("Failed to parse {} in {file}: {reason}", index.map(|i| format!("record #{i}")).unwrap_or_else(|| "post file".to_string()))]
    RecordParse {
        /// Path of the post file inside the export
        file: String,
        /// Zero-based position of the record in the file, if known
        index: Option<usize>,
        /// Description of what's wrong
        reason: String,
    },

    /// A photo reference points at something that can't be read.
    #[error("Photo '{path}' unavailable: {reason}")]
    PhotoMissing {
        /// Path of the photo as referenced by the post
        path: String,
        /// Why it could not be resolved
        reason: String,
    },

    /// The input directory holds no archive files at all.
    #[error("No .zip archives found in {}", dir.display())]
    NoArchives {
        /// The directory that was searched
        dir: PathBuf,
    },

    /// The output directory (or a file inside it) cannot be created or written.
    #[error("Cannot write to output '{}': {source}", path.display())]
    OutputDir {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Kinds of archive failures.
#[derive(Debug, Error)]
pub enum ArchiveErrorKind {
    /// The ZIP container or an entry in it is invalid
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),
    /// Reading the archive file or entry failed
    #[error("{0}")]
    Io(#[from] io::Error),
    /// Anything else (entry size limit, unusable entry path)
    #[error("{0}")]
    Other(String),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl ExportError {
    /// Creates an archive error for the named archive.
    pub fn archive_corrupt(archive: impl Into<String>, source: impl Into<ArchiveErrorKind>) -> Self {
        ExportError::ArchiveCorrupt {
            archive: archive.into(),
            source: source.into(),
        }
    }

    /// Creates a record parse error.
    pub fn record_parse(
        file: impl Into<String>,
        index: Option<usize>,
        reason: impl Into<String>,
    ) -> Self {
        ExportError::RecordParse {
            file: file.into(),
            index,
            reason: reason.into(),
        }
    }

    /// Creates a missing photo error.
    pub fn photo_missing(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ExportError::PhotoMissing {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates an output directory error.
    pub fn output_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExportError::OutputDir {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` if this is an archive-level failure.
    pub fn is_archive_corrupt(&self) -> bool {
        matches!(self, ExportError::ArchiveCorrupt { .. })
    }

    /// Returns `true` if this is a record-level failure.
    pub fn is_record_parse(&self) -> bool {
        matches!(self, ExportError::RecordParse { .. })
    }

    /// Returns `true` if this is a photo-level failure.
    pub fn is_photo_missing(&self) -> bool {
        matches!(self, ExportError::PhotoMissing { .. })
    }

    /// Returns `true` if this error should abort the whole run.
    ///
    /// Archive, record and photo failures are local: the pipeline records
    /// them in its summary and carries on.
    pub fn is_fatal(&self) -> bool {
        !(self.is_archive_corrupt() || self.is_record_parse() || self.is_photo_missing())
    }
}

impl From<&str> for ArchiveErrorKind {
    fn from(message: &str) -> Self {
        ArchiveErrorKind::Other(message.to_string())
    }
}

impl From<String> for ArchiveErrorKind {
    fn from(message: String) -> Self {
        ArchiveErrorKind::Other(message)
    }
}

// ============================================================================
// Tests
// ============================================================================
