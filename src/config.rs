//! Configuration types for extraction and output.
//!
//! This module provides plain configuration structs for library usage,
//! without any CLI framework dependencies.
//!
//! - [`ExportConfig`] - how archives are opened and posts are parsed
//! - [`OutputLayout`] - where the CSV, HTML page and photos are written
//! - [`SortOrder`] - direction of the final record order
//!
//! # Example
//!
//! ```rust
//! use postpack::config::{ExportConfig, SortOrder};
//!
//! let config = ExportConfig::new()
//!     .with_fix_encoding(true)
//!     .with_order(SortOrder::OldestFirst);
//! assert!(config.skip_stickers);
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Direction of the final record ordering.
///
/// Records are always ordered by timestamp; ties are broken by ascending id
/// in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Most recent post first (default)
    #[default]
    NewestFirst,
    /// Oldest post first
    OldestFirst,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::NewestFirst => write!(f, "newest first"),
            SortOrder::OldestFirst => write!(f, "oldest first"),
        }
    }
}

/// Configuration for reading a Facebook export.
///
/// # Example
///
/// ```rust
/// use postpack::config::ExportConfig;
///
/// let config = ExportConfig::new()
///     .with_skip_stickers(false)
///     .with_max_nesting_depth(1);
/// assert_eq!(config.post_file_marker, "your_posts");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Fix Meta's broken UTF-8 encoding (Mojibake) in text fields (default: true)
    pub fix_encoding: bool,

    /// Ignore media whose URI mentions "sticker" (default: true)
    pub skip_stickers: bool,

    /// Substring that marks an archive entry as a post-data file (default: "your_posts")
    pub post_file_marker: String,

    /// Order of the final record set (default: newest first)
    pub order: SortOrder,

    /// How deep `.zip` entries inside a shard are expanded (default: 3)
    pub max_nesting_depth: usize,

    /// Entries larger than this are skipped (default: 200MB)
    pub max_entry_size: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            fix_encoding: true,
            skip_stickers: true,
            post_file_marker: "your_posts".to_string(),
            order: SortOrder::NewestFirst,
            max_nesting_depth: 3,
            max_entry_size: 200 * 1024 * 1024, // 200MB
        }
    }
}

impl ExportConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the Mojibake fix.
    #[must_use]
    pub fn with_fix_encoding(mut self, enabled: bool) -> Self {
        self.fix_encoding = enabled;
        self
    }

    /// Sets whether sticker media are dropped.
    #[must_use]
    pub fn with_skip_stickers(mut self, skip: bool) -> Self {
        self.skip_stickers = skip;
        self
    }

    /// Sets the marker used to recognise post files.
    #[must_use]
    pub fn with_post_file_marker(mut self, marker: impl Into<String>) -> Self {
        self.post_file_marker = marker.into();
        self
    }

    /// Sets the final record order.
    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Sets how many levels of nested archives are expanded.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Sets the largest entry size that will be read.
    #[must_use]
    pub fn with_max_entry_size(mut self, size: u64) -> Self {
        self.max_entry_size = size;
        self
    }

    /// Returns `true` if `path` (a normalized tree path) holds post data.
    pub fn is_post_file(&self, path: &str) -> bool {
        let lower = path.to_lowercase();
        lower.ends_with(".json") && lower.contains(&self.post_file_marker.to_lowercase())
    }
}

/// Locations of the generated artifacts.
///
/// # Example
///
/// ```rust
/// use postpack::config::OutputLayout;
/// use std::path::Path;
///
/// let layout = OutputLayout::new("website");
/// assert_eq!(layout.csv_path(), Path::new("website/posts.csv"));
/// assert_eq!(layout.photos_dir(), Path::new("website/photos"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLayout {
    /// Root output directory
    pub root: PathBuf,
    /// CSV file path; defaults to `<root>/posts.csv`
    pub csv: Option<PathBuf>,
    /// HTML file name inside `root` (default: "index.html")
    pub html_name: String,
    /// Photo directory name inside `root` (default: "photos")
    pub photos_name: String,
}

impl OutputLayout {
    /// Creates the default layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            csv: None,
            html_name: "index.html".to_string(),
            photos_name: "photos".to_string(),
        }
    }

    /// Writes the CSV somewhere other than the output root.
    #[must_use]
    pub fn with_csv_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.csv = Some(path.into());
        self
    }

    pub fn csv_path(&self) -> PathBuf {
        self.csv
            .clone()
            .unwrap_or_else(|| self.root.join("posts.csv"))
    }

    pub fn html_path(&self) -> PathBuf {
        self.root.join(&self.html_name)
    }

    pub fn photos_dir(&self) -> PathBuf {
        self.root.join(&self.photos_name)
    }

    /// Relative URL prefix used by the HTML page to reach the photos.
    pub fn photos_url_prefix(&self) -> &str {
        &self.photos_name
    }
}
