//! Shared fixtures: export shards written at test time.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const POSTS_PATH: &str = "your_facebook_activity/posts/your_posts_1.json";

/// 2024-01-15T10:30:00Z
pub const T: i64 = 1_705_314_600;

/// Writes a zip archive with the given entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("Failed to create zip");
    let mut zip = ZipWriter::new(file);
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a zip archive whose entries are stored uncompressed, so their
/// bytes can be found and damaged in place.
pub fn write_stored_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("Failed to create zip");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

/// Overwrites the first occurrence of `needle` in a file with a
/// replacement of the same length.
pub fn patch_bytes(path: &Path, needle: &[u8], replacement: &[u8]) {
    assert_eq!(needle.len(), replacement.len());
    let mut bytes = fs::read(path).unwrap();
    let at = bytes
        .windows(needle.len())
        .position(|window| window == needle)
        .expect("needle not found in file");
    bytes[at..at + needle.len()].copy_from_slice(replacement);
    fs::write(path, bytes).unwrap();
}

/// Builds zip bytes in memory, for nesting inside another archive.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, bytes) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// An input directory plus an output directory, both temporary.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("input")).unwrap();
        Self { dir }
    }

    pub fn input(&self) -> PathBuf {
        self.dir.path().join("input")
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("website")
    }

    pub fn photos(&self) -> PathBuf {
        self.output().join("photos")
    }

    /// Adds a shard to the input directory.
    pub fn shard(&self, name: &str, entries: &[(&str, &[u8])]) -> &Self {
        write_zip(&self.input().join(name), entries);
        self
    }

    /// Adds a shard with uncompressed entries.
    pub fn stored_shard(&self, name: &str, entries: &[(&str, &[u8])]) -> &Self {
        write_stored_zip(&self.input().join(name), entries);
        self
    }

    /// Adds a raw (not necessarily valid) file to the input directory.
    pub fn raw(&self, name: &str, bytes: &[u8]) -> &Self {
        fs::write(self.input().join(name), bytes).unwrap();
        self
    }
}

/// One post object in export JSON.
pub fn post(timestamp: i64, text: &str) -> serde_json::Value {
    serde_json::json!({
        "timestamp": timestamp,
        "data": [{"post": text}],
    })
}

/// One post with attached media and tags.
pub fn post_with(timestamp: i64, text: &str, photos: &[&str], tags: &[&str]) -> serde_json::Value {
    let media: Vec<_> = photos
        .iter()
        .map(|uri| serde_json::json!({"media": {"uri": uri}}))
        .collect();
    let tags: Vec<_> = tags.iter().map(|name| serde_json::json!({"name": name})).collect();
    serde_json::json!({
        "timestamp": timestamp,
        "data": [{"post": text}],
        "attachments": [{"data": media}],
        "tags": tags,
    })
}

/// Serializes posts as a post file.
pub fn posts_file(posts: &[serde_json::Value]) -> Vec<u8> {
    serde_json::to_vec_pretty(posts).unwrap()
}
