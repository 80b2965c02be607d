//! Output writers.
//!
//! - [`write_csv`] / [`to_csv`] - flat table, one row per post (requires `csv-output`)
//! - [`write_html`] / [`render_html`] - single static page (requires `html-output`)
//!
//! Both take records in their final order and are deterministic: the same
//! records always produce the same bytes.
//!
//! # Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "csv-output", feature = "html-output"))]
//! # fn main() -> postpack::Result<()> {
//! use postpack::core::output::{SiteOptions, to_csv, write_html};
//! use postpack::record::PostRecord;
//! use chrono::Utc;
//! use std::path::Path;
//!
//! let records = vec![PostRecord::new(Utc::now(), Some("Hello".into()), vec![], "export.zip")];
//!
//! let csv_string = to_csv(&records)?;
//! write_html(&records, &SiteOptions::new(), Path::new("website/index.html"))?;
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "csv-output", feature = "html-output")))]
//! # fn main() {}
//! ```

#[cfg(feature = "csv-output")]
mod csv_writer;
#[cfg(feature = "html-output")]
mod html_writer;

#[cfg(feature = "csv-output")]
pub use csv_writer::{LIST_DELIMITER, to_csv, write_csv};
#[cfg(feature = "html-output")]
pub use html_writer::{SiteOptions, render_html, slugify, write_html};
