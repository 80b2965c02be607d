//! Core processing logic for postpack.
//!
//! This module contains:
//! - [`pipeline`] - archives to ordered, de-duplicated records
//! - [`summary`] - counters and non-fatal errors of a run
//! - [`output`] - format writers (CSV, HTML)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use postpack::core::{Pipeline, sort_records};
//! use postpack::config::{ExportConfig, SortOrder};
//! use std::path::Path;
//!
//! let extraction = Pipeline::new(ExportConfig::default())
//!     .run(Path::new("downloaded_facebook_data"), Path::new("website/photos"))?;
//! let mut records = extraction.records;
//! sort_records(&mut records, SortOrder::OldestFirst);
//! # Ok::<(), postpack::ExportError>(())
//! ```

pub mod output;
pub mod pipeline;
pub mod summary;

pub use pipeline::{Extraction, Pipeline, compare_records, dedup_records, sort_records};
pub use summary::RunSummary;

#[cfg(feature = "csv-output")]
pub use output::{to_csv, write_csv};
#[cfg(feature = "html-output")]
pub use output::{SiteOptions, render_html, write_html};
