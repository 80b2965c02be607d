//! Photo resolution and copying.
//!
//! Photos are named after their content: the output file name is a
//! SHA-256 prefix of the image bytes plus the original extension. Two posts
//! attaching the same image share one file, two different images never share
//! a name, and a re-run into a populated directory finds every file already
//! in place.
//!
//! ```
//! use postpack::photos::output_name_for;
//!
//! let a = output_name_for("posts/media/Album/123.JPG", b"jpeg bytes");
//! let b = output_name_for("other/path/copy.jpg", b"jpeg bytes");
//! assert_eq!(a, b);
//! assert!(a.ends_with(".jpg"));
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::archive::{ArchiveTree, normalize_path};
use crate::error::{ExportError, Result};
use crate::record::PhotoRef;

/// Number of hex characters kept from the content digest.
const NAME_HEX_LEN: usize = 32;

/// What happened to the bytes behind a resolved photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Written to the photo directory during this call.
    Copied,
    /// A file with the same name and bytes was already there.
    AlreadyPresent,
    /// The same source path was resolved earlier in this run.
    Reused,
}

/// Counters for one resolver's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoStats {
    pub copied: usize,
    pub already_present: usize,
    pub reused: usize,
    pub missing: usize,
}

impl PhotoStats {
    fn count(&mut self, outcome: CopyOutcome) {
        match outcome {
            CopyOutcome::Copied => self.copied += 1,
            CopyOutcome::AlreadyPresent => self.already_present += 1,
            CopyOutcome::Reused => self.reused += 1,
        }
    }
}

/// Derives the output file name for an image.
pub fn output_name_for(original_path: &str, bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    let extension = Path::new(original_path)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("{}.{extension}", &digest[..NAME_HEX_LEN])
}

/// Resolves photo references against an [`ArchiveTree`] and copies the
/// images into one flat output directory.
pub struct PhotoResolver<'a> {
    tree: &'a mut ArchiveTree,
    photos_dir: PathBuf,
    resolved: HashMap<String, Option<String>>,
    stats: PhotoStats,
}

impl<'a> PhotoResolver<'a> {
    /// Creates a resolver writing into `photos_dir`, creating it if needed.
    pub fn new(tree: &'a mut ArchiveTree, photos_dir: impl Into<PathBuf>) -> Result<Self> {
        let photos_dir = photos_dir.into();
        fs::create_dir_all(&photos_dir)
            .map_err(|e| ExportError::output_dir(&photos_dir, e))?;
        Ok(Self {
            tree,
            photos_dir,
            resolved: HashMap::new(),
            stats: PhotoStats::default(),
        })
    }

    pub fn photos_dir(&self) -> &Path {
        &self.photos_dir
    }

    pub fn stats(&self) -> PhotoStats {
        self.stats
    }

    /// Resolves one photo and makes sure its bytes are in the output
    /// directory. Returns the output name.
    ///
    /// Fails with [`ExportError::PhotoMissing`] when the image isn't in the
    /// export or can't be decompressed, and with [`ExportError::OutputDir`]
    /// when it can't be written.
    pub fn resolve(&mut self, original_path: &str) -> Result<(String, CopyOutcome)> {
        if let Some(previous) = self.resolved.get(original_path) {
            return match previous {
                Some(name) => {
                    let name = name.clone();
                    self.stats.count(CopyOutcome::Reused);
                    Ok((name, CopyOutcome::Reused))
                }
                None => {
                    self.stats.missing += 1;
                    Err(ExportError::photo_missing(original_path, "unavailable (see earlier warning)"))
                }
            };
        }

        let outcome = self.load(original_path).and_then(|bytes| {
            let name = output_name_for(original_path, &bytes);
            let outcome = self.store(&name, &bytes)?;
            Ok((name, outcome))
        });

        match &outcome {
            Ok((name, how)) => {
                self.stats.count(*how);
                self.resolved
                    .insert(original_path.to_string(), Some(name.clone()));
            }
            Err(e) if e.is_photo_missing() => {
                self.stats.missing += 1;
                self.resolved.insert(original_path.to_string(), None);
            }
            Err(_) => {}
        }
        outcome
    }

    /// Resolves every reference of one post.
    ///
    /// Missing photos keep their reference with `output_name = None` and are
    /// returned alongside; only a fatal error aborts.
    pub fn resolve_all(&mut self, photos: &[PhotoRef]) -> Result<(Vec<PhotoRef>, Vec<ExportError>)> {
        let mut resolved = Vec::with_capacity(photos.len());
        let mut missing = Vec::new();

        for photo in photos {
            match self.resolve(&photo.original_path) {
                Ok((name, _)) => resolved.push(photo.resolved(name)),
                Err(e) if e.is_photo_missing() => {
                    resolved.push(PhotoRef::new(photo.original_path.clone()));
                    missing.push(e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok((resolved, missing))
    }

    fn load(&mut self, original_path: &str) -> Result<Vec<u8>> {
        let Some(path) = normalize_path(original_path) else {
            return Err(ExportError::photo_missing(original_path, "empty path"));
        };

        match self.tree.read(&path) {
            Ok(Some(bytes)) => Ok(bytes),
            Ok(None) => {
                let reason = self.tree.skip_reason(&path).unwrap_or("not found in export");
                warn!("Photo unavailable: {original_path}: {reason}");
                Err(ExportError::photo_missing(original_path, reason))
            }
            Err(e) => {
                warn!("Photo could not be read: {original_path}: {e}");
                Err(ExportError::photo_missing(original_path, e.to_string()))
            }
        }
    }

    fn store(&self, name: &str, bytes: &[u8]) -> Result<CopyOutcome> {
        let dest = self.photos_dir.join(name);

        if dest.is_file() {
            if let Ok(existing) = fs::read(&dest) {
                if existing == bytes {
                    debug!("{name} already present");
                    return Ok(CopyOutcome::AlreadyPresent);
                }
            }
        }

        fs::write(&dest, bytes).map_err(|e| ExportError::output_dir(&dest, e))?;
        debug!("Copied {name} ({} bytes)", bytes.len());
        Ok(CopyOutcome::Copied)
    }
}
