//! Raw Facebook post structures and their normalization.
//!
//! A post in `your_posts_*.json` looks roughly like:
//!
//! ```json
//! {
//!   "timestamp": 1705314600,
//!   "data": [{"post": "Hello world"}, {"update_timestamp": 1705314700}],
//!   "title": "Jane Doe updated her status.",
//!   "tags": [{"name": "John Doe"}],
//!   "attachments": [{"data": [
//!     {"media": {"uri": "your_facebook_activity/posts/media/Album/1.jpg"}},
//!     {"external_context": {"url": "https://example.com"}},
//!     {"place": {"name": "Bratislava"}}
//!   ]}]
//! }
//! ```
//!
//! Every field except `timestamp` is optional and can be missing, `null`, or
//! of an unexpected type across export generations. The raw structs below
//! accept all of that: anything that doesn't fit is read as absent.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::record::{PhotoRef, PostRecord};

/// One post entry as it appears in the export.
#[derive(Debug, Default, Deserialize)]
pub struct RawPost {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<i64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawPostData>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub tags: Vec<RawTag>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub attachments: Vec<RawAttachment>,
}

/// Entry of a post's `data` array.
#[derive(Debug, Default, Deserialize)]
pub struct RawPostData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub post: Option<String>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub external_context: Option<RawExternalContext>,
}

/// A tag: either `{"name": "..."}` or a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawTag {
    Named {
        #[serde(default, deserialize_with = "lenient_string")]
        name: Option<String>,
    },
    Plain(String),
}

impl RawTag {
    fn name(&self) -> Option<&str> {
        match self {
            RawTag::Named { name } => name.as_deref(),
            RawTag::Plain(name) => Some(name),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAttachment {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub data: Vec<RawAttachmentData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAttachmentData {
    #[serde(default, deserialize_with = "lenient_option")]
    pub media: Option<RawMedia>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub external_context: Option<RawExternalContext>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub place: Option<RawPlace>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawMedia {
    #[serde(default, deserialize_with = "lenient_string")]
    pub uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawExternalContext {
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawPlace {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// Options applied while normalizing one post.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeOptions {
    pub fix_encoding: bool,
    pub skip_stickers: bool,
}

// ============================================================================
// Lenient field readers
// ============================================================================

/// Reads a list, keeping only the elements that fit `T`. Non-lists read as empty.
fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Reads an object into `T`, or `None` if it doesn't fit.
fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Reads a string; any other JSON type reads as `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Reads unix seconds from an integer, a float or a numeric string.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

// ============================================================================
// Normalization
// ============================================================================

/// Fix Meta's broken encoding (Mojibake).
///
/// Meta exports UTF-8 text encoded as if it were ISO-8859-1: each UTF-8 byte
/// is stored as a separate codepoint in U+0080..U+00FF, so "Dobrý" arrives
/// as "DobrÃ½". This reverses that by reading each char back as a byte.
///
/// Text that is already correct passes through unchanged: any char above
/// U+00FF can't come from the broken encoding, and byte sequences that
/// aren't valid UTF-8 are left alone.
///
/// ```
/// use postpack::parsing::facebook::fix_mojibake_encoding;
///
/// assert_eq!(fix_mojibake_encoding("Hello"), "Hello");
/// assert_eq!(fix_mojibake_encoding("Dobr\u{c3}\u{bd} de\u{c5}\u{88}"), "Dobrý deň");
/// assert_eq!(fix_mojibake_encoding("Привет"), "Привет");
/// ```
pub fn fix_mojibake_encoding(s: &str) -> String {
    if s.is_ascii() || s.chars().any(|c| u32::from(c) > 0xFF) {
        return s.to_string();
    }
    let bytes: Vec<u8> = s.chars().map(|c| c as u8).collect();
    String::from_utf8(bytes).unwrap_or_else(|_| s.to_string())
}

/// Converts unix seconds to a UTC timestamp.
pub fn parse_timestamp(seconds: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds, 0).single()
}

fn non_blank(s: &str) -> bool {
    !s.trim().is_empty()
}

/// Normalizes a raw post into a [`PostRecord`].
///
/// Fails only when no usable timestamp is present; the error string says why.
pub fn normalize_post(
    raw: RawPost,
    source_archive: &str,
    options: NormalizeOptions,
) -> Result<PostRecord, String> {
    let seconds = raw.timestamp.ok_or("missing timestamp")?;
    let timestamp =
        parse_timestamp(seconds).ok_or_else(|| format!("timestamp {seconds} out of range"))?;

    let fix = |s: &str| {
        if options.fix_encoding {
            fix_mojibake_encoding(s)
        } else {
            s.to_string()
        }
    };

    let text = raw
        .data
        .iter()
        .filter_map(|d| d.post.as_ref())
        .find(|p| non_blank(p))
        .map(|p| fix(p.as_str()));

    let mut photos = Vec::new();
    let mut links = Vec::new();
    let mut place = None;

    for item in raw.attachments.iter().flat_map(|a| &a.data) {
        if let Some(uri) = item.media.as_ref().and_then(|m| m.uri.as_ref()) {
            let is_sticker = uri.to_lowercase().contains("sticker");
            if non_blank(uri) && !(options.skip_stickers && is_sticker) {
                photos.push(PhotoRef::new(uri.trim()));
            }
        }
        if let Some(url) = item.external_context.as_ref().and_then(|c| c.url.as_ref()) {
            if non_blank(url) {
                links.push(url.trim().to_string());
            }
        }
        if place.is_none() {
            place = item
                .place
                .as_ref()
                .and_then(|p| p.name.as_ref())
                .filter(|n| non_blank(n))
                .map(|n| fix(n.as_str()));
        }
    }

    links.extend(
        raw.data
            .iter()
            .filter_map(|d| d.external_context.as_ref().and_then(|c| c.url.as_ref()))
            .filter(|url| non_blank(url))
            .map(|url| url.trim().to_string()),
    );

    let tags: Vec<String> = raw
        .tags
        .iter()
        .filter_map(RawTag::name)
        .filter(|n| !n.trim().is_empty())
        .map(|n| fix(n.trim()))
        .collect();

    let mut record = PostRecord::new(timestamp, text, photos, source_archive)
        .with_tags(tags)
        .with_links(links);

    if let Some(title) = raw.title.as_ref().filter(|t| non_blank(t)) {
        record = record.with_title(fix(title.as_str()));
    }
    if let Some(place) = place {
        record = record.with_place(place);
    }

    Ok(record)
}
