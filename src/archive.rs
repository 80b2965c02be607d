//! Archive loading.
//!
//! Facebook splits large exports into several ZIP shards whose top-level
//! folders overlap (`your_facebook_activity/posts/...` appears in each).
//! [`ArchiveTree`] mounts every shard into one merged namespace of normalized
//! relative paths and serves entry bytes on demand.
//!
//! Conflicts are resolved by mount order: shards are mounted in file-name
//! order, and the first shard to claim a path keeps it. ZIP files found
//! *inside* a shard are mounted right after their parent, so the parent's own
//! entries win over anything nested.
//!
//! A shard that can't be opened is reported as
//! [`ExportError::ArchiveCorrupt`] and skipped; the remaining shards are
//! still mounted.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use zip::ZipArchive;

use crate::config::ExportConfig;
use crate::error::{ArchiveErrorKind, ExportError, Result};

/// Anything a [`ZipArchive`] can sit on: files on disk or nested archives
/// held in memory.
trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

type DynArchive = ZipArchive<Box<dyn ReadSeek>>;

struct Shard {
    name: String,
    archive: DynArchive,
}

#[derive(Debug, Clone, Copy)]
struct EntryLocation {
    shard: usize,
    index: usize,
}

/// Merged view over every shard of an export.
pub struct ArchiveTree {
    shards: Vec<Shard>,
    entries: BTreeMap<String, EntryLocation>,
    skipped: BTreeMap<String, String>,
    shadowed: usize,
}

/// Result of opening an input directory.
#[derive(Debug)]
pub struct LoadedExport {
    /// The merged tree of every shard that opened successfully.
    pub tree: ArchiveTree,
    /// Number of archive files found in the input directory.
    pub archives_found: usize,
    /// Archive-level failures; each one cost a shard (or part of one).
    pub failures: Vec<ExportError>,
}

impl fmt::Debug for ArchiveTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveTree")
            .field("shards", &self.shard_names().collect::<Vec<_>>())
            .field("entries", &self.entries.len())
            .field("skipped", &self.skipped.len())
            .field("shadowed", &self.shadowed)
            .finish()
    }
}

impl ArchiveTree {
    fn empty() -> Self {
        Self {
            shards: Vec::new(),
            entries: BTreeMap::new(),
            skipped: BTreeMap::new(),
            shadowed: 0,
        }
    }

    /// Opens every `.zip` file directly inside `dir`.
    ///
    /// Fails only when the directory holds no archives at all; broken
    /// archives end up in [`LoadedExport::failures`].
    pub fn open_dir(dir: &Path, config: &ExportConfig) -> Result<LoadedExport> {
        let paths = find_archives(dir)?;
        if paths.is_empty() {
            return Err(ExportError::NoArchives {
                dir: dir.to_path_buf(),
            });
        }
        Ok(Self::open_all(&paths, config))
    }

    /// Opens the given archives in order and merges them.
    pub fn open_all(paths: &[PathBuf], config: &ExportConfig) -> LoadedExport {
        let mut tree = Self::empty();
        let mut failures = Vec::new();

        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            match open_archive_file(path) {
                Ok(archive) => tree.mount(name, archive, 0, config, &mut failures),
                Err(source) => {
                    warn!("Skipping archive {name}: {source}");
                    failures.push(ExportError::archive_corrupt(name, source));
                }
            }
        }

        info!(
            "Mounted {} entries from {} archive(s) ({} shadowed)",
            tree.entries.len(),
            tree.shards.len(),
            tree.shadowed
        );

        LoadedExport {
            tree,
            archives_found: paths.len(),
            failures,
        }
    }

    fn mount(
        &mut self,
        name: String,
        mut archive: DynArchive,
        depth: usize,
        config: &ExportConfig,
        failures: &mut Vec<ExportError>,
    ) {
        let shard = self.shards.len();
        let mut nested = Vec::new();
        let mut mounted = 0usize;

        for index in 0..archive.len() {
            let (raw_name, is_dir, size) = match archive.by_index_raw(index) {
                Ok(file) => (file.name().to_string(), file.is_dir(), file.size()),
                Err(e) => {
                    warn!("Unreadable entry #{index} in {name}: {e}");
                    failures.push(ExportError::archive_corrupt(name.clone(), e));
                    continue;
                }
            };

            if is_dir {
                continue;
            }

            let Some(path) = normalize_path(&raw_name) else {
                warn!("Skipping invalid entry path in {name}: {raw_name}");
                failures.push(ExportError::archive_corrupt(
                    name.clone(),
                    format!("entry '{raw_name}' has no usable path"),
                ));
                continue;
            };

            if size > config.max_entry_size {
                let reason = format!(
                    "entry {path} is {size} bytes, over the {} byte limit",
                    config.max_entry_size
                );
                warn!("Skipping {reason} in {name}");
                failures.push(ExportError::archive_corrupt(name.clone(), reason.clone()));
                self.skipped.entry(path).or_insert(reason);
                continue;
            }

            if is_zip_name(&path) && depth < config.max_nesting_depth {
                nested.push((index, path));
                continue;
            }

            match self.entries.entry(path) {
                Entry::Vacant(slot) => {
                    slot.insert(EntryLocation { shard, index });
                    mounted += 1;
                }
                Entry::Occupied(slot) => {
                    self.shadowed += 1;
                    let owner = self
                        .shards
                        .get(slot.get().shard)
                        .map_or(name.as_str(), |s| s.name.as_str());
                    debug!("{} in {name} shadowed by {owner}", slot.key());
                }
            }
        }

        let mut children = Vec::new();
        for (index, path) in nested {
            let child_name = format!("{name}/{path}");
            let opened = read_entry(&mut archive, index).and_then(|bytes| {
                let reader: Box<dyn ReadSeek> = Box::new(Cursor::new(bytes));
                Ok(ZipArchive::new(reader)?)
            });
            match opened {
                Ok(child) => children.push((child_name, child)),
                Err(source) => {
                    warn!("Skipping nested archive {child_name}: {source}");
                    failures.push(ExportError::archive_corrupt(child_name, source));
                }
            }
        }

        debug!("Mounted {mounted} entries from {name}");
        self.shards.push(Shard { name, archive });

        for (child_name, child) in children {
            self.mount(child_name, child, depth + 1, config, failures);
        }
    }

    /// Reads the bytes of the entry at `path`.
    ///
    /// Returns `Ok(None)` when no shard holds the path, and
    /// [`ExportError::ArchiveCorrupt`] when the entry exists but can't be
    /// decompressed.
    pub fn read(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(location) = self.entries.get(path).copied() else {
            return Ok(None);
        };
        let shard = &mut self.shards[location.shard];
        read_entry(&mut shard.archive, location.index)
            .map(Some)
            .map_err(|source| ExportError::archive_corrupt(shard.name.clone(), source))
    }

    /// Why the entry at `path` was left out of the tree, if it was.
    pub fn skip_reason(&self, path: &str) -> Option<&str> {
        self.skipped.get(path).map(String::as_str)
    }

    /// All entry paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Name of the shard that serves `path`.
    pub fn source_of(&self, path: &str) -> Option<&str> {
        self.entries
            .get(path)
            .map(|loc| self.shards[loc.shard].name.as_str())
    }

    /// Names of the mounted shards, nested archives included.
    pub fn shard_names(&self) -> impl Iterator<Item = &str> {
        self.shards.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries hidden because an earlier shard had the same path.
    pub fn shadowed(&self) -> usize {
        self.shadowed
    }
}

/// Lists the `.zip` files directly inside `dir`, sorted by file name.
pub fn find_archives(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ExportError::NoArchives {
            dir: dir.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.file_name().is_some_and(|n| is_zip_name(&n.to_string_lossy())) {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

/// Normalizes an archive entry name into a tree path.
///
/// Backslashes become `/`; empty, `.` and `..` components and drive
/// prefixes are dropped. Returns `None` if nothing is left.
pub fn normalize_path(raw: &str) -> Option<String> {
    let unified = raw.replace('\\', "/");
    let parts: Vec<&str> = unified
        .split('/')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .filter(|part| !(part.len() == 2 && part.ends_with(':')))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn is_zip_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".zip")
}

fn open_archive_file(path: &Path) -> std::result::Result<DynArchive, ArchiveErrorKind> {
    let file = File::open(path)?;
    let reader: Box<dyn ReadSeek> = Box::new(BufReader::new(file));
    Ok(ZipArchive::new(reader)?)
}

fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
) -> std::result::Result<Vec<u8>, ArchiveErrorKind> {
    let mut file = archive.by_index(index)?;
    let mut bytes = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
