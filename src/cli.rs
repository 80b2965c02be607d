//! Command-line interface definition using clap.
//!
//! [`Args`] maps one-to-one onto the library's configuration types, so the
//! binary stays a thin shell:
//!
//! ```rust
//! use clap::Parser;
//! use postpack::cli::Args;
//!
//! let args = Args::parse_from(["postpack", "export_dir", "-o", "site", "--oldest-first"]);
//! let config = args.export_config();
//! let layout = args.output_layout();
//! assert_eq!(config.order, postpack::config::SortOrder::OldestFirst);
//! assert_eq!(layout.root, std::path::PathBuf::from("site"));
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::config::{ExportConfig, OutputLayout, SortOrder};
use crate::core::output::SiteOptions;

/// Turn a Facebook data export into a CSV file and a static web page
/// with all of your posts and photos.
#[derive(Parser, Debug, Clone)]
#[command(name = "postpack")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    postpack
    postpack ~/Downloads/facebook -o my_site
    postpack export --csv posts.csv --oldest-first
    RUST_LOG=debug postpack export")]
pub struct Args {
    /// Directory holding the export's .zip files
    #[arg(default_value = "downloaded_facebook_data")]
    pub input: PathBuf,

    /// Output directory for the page, photos and CSV
    #[arg(short, long, default_value = "website")]
    pub output: PathBuf,

    /// Write the CSV here instead of <OUTPUT>/posts.csv
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// List the oldest posts first
    #[arg(long)]
    pub oldest_first: bool,

    /// Leave text exactly as it appears in the export
    #[arg(long)]
    pub no_fix_encoding: bool,

    /// Treat sticker attachments as photos
    #[arg(long)]
    pub keep_stickers: bool,

    /// Title of the generated page
    #[arg(long, value_name = "TEXT", default_value = "My Facebook Posts")]
    pub title: String,
}

impl Args {
    /// Extraction settings selected on the command line.
    pub fn export_config(&self) -> ExportConfig {
        let order = if self.oldest_first {
            SortOrder::OldestFirst
        } else {
            SortOrder::NewestFirst
        };
        ExportConfig::new()
            .with_fix_encoding(!self.no_fix_encoding)
            .with_skip_stickers(!self.keep_stickers)
            .with_order(order)
    }

    /// Where the artifacts go.
    pub fn output_layout(&self) -> OutputLayout {
        let layout = OutputLayout::new(&self.output);
        match &self.csv {
            Some(path) => layout.with_csv_path(path),
            None => layout,
        }
    }

    pub fn site_options(&self, layout: &OutputLayout) -> SiteOptions {
        SiteOptions::new()
            .with_title(&self.title)
            .with_photos_url_prefix(layout.photos_url_prefix())
    }
}
