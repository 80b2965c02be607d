//! # postpack
//!
//! A Rust library for turning a Facebook "Download Your Information" export
//! into a flat CSV file and a browsable static web page.
//!
//! ## Overview
//!
//! An export arrives as one or more `.zip` shards. postpack:
//! - **opens** every shard (and any archive nested inside one) as a single
//!   merged file tree
//! - **parses** every `your_posts*.json` file into canonical [`PostRecord`]s,
//!   tolerating missing or wrong-typed fields and repairing mojibake text
//! - **copies** referenced photos into one flat directory under
//!   content-derived names
//! - **de-duplicates and orders** the records
//! - **writes** `posts.csv` and `index.html`
//!
//! Broken archives, records and photos are skipped and reported; the run only
//! fails when there is nothing to read or nowhere to write.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use postpack::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let layout = OutputLayout::new("website");
//!     std::fs::create_dir_all(&layout.root)?;
//!
//!     let extraction = Pipeline::new(ExportConfig::default())
//!         .run("downloaded_facebook_data".as_ref(), &layout.photos_dir())?;
//!
//!     write_csv(&extraction.records, &layout.csv_path())?;
//!     write_html(&extraction.records, &SiteOptions::new(), &layout.html_path())?;
//!
//!     println!("{}", extraction.summary);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`archive`] - shard discovery and the merged [`ArchiveTree`](archive::ArchiveTree)
//! - [`parsing`] - raw export JSON shapes and per-post normalization
//! - [`parser`] - [`PostParser`](parser::PostParser), post files to records
//! - [`photos`] - [`PhotoResolver`](photos::PhotoResolver), content-named photo copies
//! - [`record`] - [`PostRecord`], [`PhotoRef`]
//! - [`core`] - [`Pipeline`](core::Pipeline), [`RunSummary`](core::RunSummary), output writers
//! - [`config`] - [`ExportConfig`](config::ExportConfig), [`OutputLayout`](config::OutputLayout)
//! - [`cli`] - command-line arguments (`cli` feature)
//! - [`error`] - [`ExportError`], [`Result`]
//! - [`prelude`] - convenient re-exports
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade. Every
//! skipped archive, record and photo is reported at `warn` level; per-file
//! progress at `debug`. Install any logger to see them.

#[cfg(feature = "cli")]
pub mod cli;
pub mod archive;
pub mod config;
pub mod core;
pub mod error;
pub mod parser;
pub mod parsing;
pub mod photos;
pub mod record;

// Re-export the main types at the crate root for convenience
pub use error::{ExportError, Result};
pub use record::{PhotoRef, PostRecord};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use postpack::prelude::*;
/// ```
pub mod prelude {
    pub use crate::record::{PhotoRef, PostRecord};

    pub use crate::error::{ExportError, Result};

    pub use crate::config::{ExportConfig, OutputLayout, SortOrder};

    pub use crate::archive::ArchiveTree;
    pub use crate::parser::PostParser;
    pub use crate::photos::PhotoResolver;

    pub use crate::core::{Extraction, Pipeline, RunSummary, dedup_records, sort_records};

    #[cfg(feature = "csv-output")]
    pub use crate::core::output::{to_csv, write_csv};
    #[cfg(feature = "html-output")]
    pub use crate::core::output::{SiteOptions, render_html, write_html};
}
