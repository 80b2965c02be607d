//! Static HTML page writer.
//!
//! Renders every record into one self-contained page with maud: inline CSS,
//! no scripts, no external resources. Photos are referenced relative to the
//! page, so the output directory can be opened straight from disk.
//!
//! ## Page Layout
//!
//! - **Header**: site title and post count
//! - **Tag index**: every tag, linking to a section that lists its posts
//! - **Posts**: date, title, text, place, photos, tags and links, in
//!   pipeline order

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use maud::{DOCTYPE, Markup, html};

use crate::error::{ExportError, Result};
use crate::record::{PhotoRef, PostRecord};

const CSS: &str = "\
body{font-family:system-ui,sans-serif;max-width:46rem;margin:0 auto;padding:1rem;color:#1c1e21;background:#f0f2f5}\
header.site-header{margin-bottom:1.5rem}\
nav.tag-index ul{list-style:none;padding:0;display:flex;flex-wrap:wrap;gap:.5rem}\
section.tag{margin-bottom:1rem}\
article.post{background:#fff;border-radius:8px;padding:1rem;margin-bottom:1rem;box-shadow:0 1px 2px rgba(0,0,0,.2)}\
.post-date{color:#65676b;font-size:.85rem}\
.post-text{white-space:pre-wrap}\
.photos img,.photos video{max-width:100%;display:block;margin:.5rem 0}\
.photo-missing{padding:2rem;text-align:center;background:#e4e6eb;color:#65676b}\
.tags a{margin-right:.5rem}";

/// Options for the generated page.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    /// Page title and main heading.
    pub title: String,
    /// Path of the photo directory relative to the page.
    pub photos_url_prefix: String,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            title: "My Facebook Posts".to_string(),
            photos_url_prefix: "photos".to_string(),
        }
    }
}

impl SiteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_photos_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.photos_url_prefix = prefix.into();
        self
    }

    fn photo_url(&self, output_name: &str) -> String {
        let prefix = self.photos_url_prefix.trim_end_matches('/');
        if prefix.is_empty() {
            output_name.to_string()
        } else {
            format!("{prefix}/{output_name}")
        }
    }
}

/// Renders records as a complete HTML document.
pub fn render_html(records: &[PostRecord], options: &SiteOptions) -> String {
    let tags = tag_index(records);
    let content = html! {
        header.site-header {
            h1 { (options.title) }
            p.post-count { (post_count(records.len())) }
        }
        @if !tags.is_empty() {
            (render_tag_index(&tags))
        }
        main.posts {
            @for record in records {
                (render_post(record, &tags, options))
            }
        }
    };
    base_document(&options.title, content).into_string()
}

/// Renders records and writes the page to `path`, replacing any existing file.
pub fn write_html(records: &[PostRecord], options: &SiteOptions, path: &Path) -> Result<()> {
    let page = render_html(records, options);
    fs::write(path, page).map_err(|e| ExportError::output_dir(path, e))
}

/// Turns a tag name into an anchor-safe slug.
///
/// Letters and digits are kept (lowercased); every other run of characters
/// becomes a single `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("tag");
    }
    slug
}

// ============================================================================
// Tag index
// ============================================================================

struct TagEntry<'a> {
    anchor: String,
    posts: Vec<&'a PostRecord>,
}

/// Groups records by tag, assigning each tag a unique anchor.
fn tag_index(records: &[PostRecord]) -> BTreeMap<&str, TagEntry<'_>> {
    let mut index: BTreeMap<&str, TagEntry<'_>> = BTreeMap::new();
    for record in records {
        for tag in &record.tags {
            index
                .entry(tag.as_str())
                .or_insert_with(|| TagEntry {
                    anchor: String::new(),
                    posts: Vec::new(),
                })
                .posts
                .push(record);
        }
    }

    let mut issued: BTreeSet<String> = BTreeSet::new();
    for (name, entry) in &mut index {
        let slug = slugify(name);
        let mut anchor = format!("tag-{slug}");
        let mut n = 2;
        while issued.contains(&anchor) {
            anchor = format!("tag-{slug}-{n}");
            n += 1;
        }
        issued.insert(anchor.clone());
        entry.anchor = anchor;
    }
    index
}

fn post_count(count: usize) -> String {
    if count == 1 {
        "1 post".to_string()
    } else {
        format!("{count} posts")
    }
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (CSS) }
            }
            body {
                (content)
            }
        }
    }
}

fn render_tag_index(tags: &BTreeMap<&str, TagEntry<'_>>) -> Markup {
    html! {
        nav.tag-index {
            h2 { "Tags" }
            ul {
                @for (name, entry) in tags {
                    li { a href={ "#" (entry.anchor) } { (name) } }
                }
            }
            @for (name, entry) in tags {
                section.tag id=(entry.anchor) {
                    h3 { (name) }
                    ul {
                        @for record in &entry.posts {
                            li {
                                a href={ "#post-" (record.id) } { (post_label(record)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_post(record: &PostRecord, tags: &BTreeMap<&str, TagEntry<'_>>, options: &SiteOptions) -> Markup {
    html! {
        article.post id={ "post-" (record.id) } {
            time.post-date datetime=(record.timestamp.to_rfc3339()) {
                (record.timestamp.format("%Y-%m-%d %H:%M UTC").to_string())
            }
            @if let Some(title) = &record.title {
                h2.post-title { (title) }
            }
            @if let Some(text) = &record.text {
                p.post-text { (text) }
            }
            @if let Some(place) = &record.place {
                p.post-place { "📍 " (place) }
            }
            @if !record.photos.is_empty() {
                div.photos {
                    @for photo in &record.photos {
                        (render_photo(photo, options))
                    }
                }
            }
            @if !record.tags.is_empty() {
                p.tags {
                    @for tag in &record.tags {
                        @if let Some(entry) = tags.get(tag.as_str()) {
                            a href={ "#" (entry.anchor) } { "#" (tag) }
                        }
                    }
                }
            }
            @if !record.links.is_empty() {
                ul.links {
                    @for link in &record.links {
                        @if is_web_link(link) {
                            li { a href=(link) target="_blank" rel="noopener" { (link) } }
                        } @else {
                            li { (link) }
                        }
                    }
                }
            }
        }
    }
}

fn render_photo(photo: &PhotoRef, options: &SiteOptions) -> Markup {
    html! {
        @if let Some(name) = &photo.output_name {
            @if photo.is_video() {
                video src=(options.photo_url(name)) controls preload="metadata" {}
            } @else {
                img src=(options.photo_url(name)) alt="" loading="lazy";
            }
        } @else {
            div.photo-missing title=(photo.original_path) { "Photo unavailable" }
        }
    }
}

/// Only `http` and `https` links become anchors.
fn is_web_link(link: &str) -> bool {
    let link = link.trim_start();
    ["http://", "https://"].iter().any(|scheme| {
        link.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

fn post_label(record: &PostRecord) -> String {
    let date = record.timestamp.format("%Y-%m-%d").to_string();
    let summary = record
        .title
        .as_deref()
        .or(record.text.as_deref())
        .map(|s| s.lines().next().unwrap_or_default())
        .filter(|s| !s.is_empty());
    match summary {
        Some(s) if s.chars().count() > 60 => {
            format!("{date}: {}…", s.chars().take(60).collect::<String>())
        }
        Some(s) => format!("{date}: {s}"),
        None => date,
    }
}
