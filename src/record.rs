//! Canonical post record.
//!
//! Every post in an export, whatever shape its JSON had, is normalized into a
//! [`PostRecord`]. Downstream code (dedup, sorting, writers) only ever sees
//! this one shape.
//!
//! # Identity
//!
//! A record's [`id`](PostRecord::id) is derived from its content: the
//! timestamp, the text and the ordered list of photo paths. The archive or
//! file position it came from does not take part, so the same post found in
//! two shards gets the same id and collapses to one record.
//!
//! ```
//! use postpack::record::{PhotoRef, PostRecord};
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.timestamp_opt(1_705_314_600, 0).unwrap();
//! let a = PostRecord::new(ts, Some("Hello world".into()), vec![], "part-1.zip");
//! let b = PostRecord::new(ts, Some("Hello world".into()), vec![], "part-2.zip");
//! assert_eq!(a.id, b.id);
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the SHA-256 digest for record ids.
const ID_HEX_LEN: usize = 16;

/// A photo (or video) referenced by a post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Path of the image inside the export, as referenced by the post.
    pub original_path: String,

    /// File name in the output photo directory.
    ///
    /// `None` until the photo is resolved, and stays `None` if the image
    /// could not be found.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub output_name: Option<String>,
}

impl PhotoRef {
    /// Creates an unresolved reference.
    pub fn new(original_path: impl Into<String>) -> Self {
        Self {
            original_path: original_path.into(),
            output_name: None,
        }
    }

    /// Returns a copy of this reference pointing at `output_name`.
    #[must_use]
    pub fn resolved(&self, output_name: impl Into<String>) -> Self {
        Self {
            original_path: self.original_path.clone(),
            output_name: Some(output_name.into()),
        }
    }

    /// Returns `true` if the image was copied to the output directory.
    pub fn is_available(&self) -> bool {
        self.output_name.is_some()
    }

    /// Returns `true` if the reference looks like a video rather than a still image.
    pub fn is_video(&self) -> bool {
        let lower = self.original_path.to_lowercase();
        [".mp4", ".mov", ".webm", ".m4v"]
            .iter()
            .any(|ext| lower.ends_with(ext))
    }
}

/// A normalized post from a Facebook export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Content-derived identifier, stable across runs.
    pub id: String,

    /// When the post was created.
    pub timestamp: DateTime<Utc>,

    /// Body of the post.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub text: Option<String>,

    /// Facebook's generated headline ("X shared a memory", "X was at Y").
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub title: Option<String>,

    /// Name of a checked-in place, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub place: Option<String>,

    /// Attached media in the order the export lists them.
    #[serde(default)]
    pub photos: Vec<PhotoRef>,

    /// Tagged people or pages.
    #[serde(default)]
    pub tags: BTreeSet<String>,

    /// External links, in order, without repeats.
    #[serde(default)]
    pub links: Vec<String>,

    /// Archive the record was read from. Diagnostic only.
    pub source_archive: String,
}

impl PostRecord {
    /// Creates a record and derives its id from `timestamp`, `text` and the
    /// photo paths.
    pub fn new(
        timestamp: DateTime<Utc>,
        text: Option<String>,
        photos: Vec<PhotoRef>,
        source_archive: impl Into<String>,
    ) -> Self {
        let id = derive_id(&timestamp, text.as_deref(), &photos);
        Self {
            id,
            timestamp,
            text,
            title: None,
            place: None,
            photos,
            tags: BTreeSet::new(),
            links: Vec::new(),
            source_archive: source_archive.into(),
        }
    }

    /// Builder-style method to set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder-style method to set the place.
    #[must_use]
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Builder-style method to add tags. Duplicates are ignored.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Builder-style method to add links. Repeated URLs are kept once, at
    /// their first position.
    #[must_use]
    pub fn with_links<I, S>(mut self, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for link in links {
            let link = link.into();
            if !self.links.contains(&link) {
                self.links.push(link);
            }
        }
        self
    }

    /// Output names of the photos that were actually copied.
    pub fn available_photos(&self) -> impl Iterator<Item = &str> {
        self.photos.iter().filter_map(|p| p.output_name.as_deref())
    }

    /// Number of photo references that could not be resolved.
    pub fn missing_photo_count(&self) -> usize {
        self.photos.iter().filter(|p| !p.is_available()).count()
    }
}

/// Derives a record id from the fields that identify a post.
///
/// Fields are NUL-separated before hashing so that moving text between them
/// can't produce the same digest.
pub fn derive_id(timestamp: &DateTime<Utc>, text: Option<&str>, photos: &[PhotoRef]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.timestamp().to_le_bytes());
    hasher.update(b"\0");
    hasher.update(text.unwrap_or_default().as_bytes());
    for photo in photos {
        hasher.update(b"\0");
        hasher.update(photo.original_path.as_bytes());
    }
    let hex = format!("{:x}", hasher.finalize());
    hex[..ID_HEX_LEN].to_string()
}
