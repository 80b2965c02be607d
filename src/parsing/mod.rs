//! Parsing utilities for Facebook export files.
//!
//! [`facebook`] holds the raw JSON shapes and turns one raw post into a
//! canonical [`PostRecord`](crate::record::PostRecord). The file-level logic
//! (finding post files, splitting them into entries) lives in
//! [`crate::parser`].

pub mod facebook;

// Re-export commonly used items
pub use facebook::{NormalizeOptions, RawPost, fix_mojibake_encoding, normalize_post};
