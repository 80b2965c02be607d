//! CSV output writer.

use std::fs;
use std::io;
use std::path::Path;

use chrono::SecondsFormat;

use crate::error::{ExportError, Result};
use crate::record::PostRecord;

/// Separator for list-valued columns (photos, tags, links).
pub const LIST_DELIMITER: &str = "|";

const HEADER: [&str; 6] = ["id", "timestamp", "text", "photos", "tags", "links"];

/// Renders records as CSV.
///
/// # Format
/// - Delimiter: `,`, quoting only where needed
/// - Columns: `id`, `timestamp`, `text`, `photos`, `tags`, `links`
/// - Timestamp: RFC 3339, UTC, whole seconds
/// - List columns joined by `|`; photos that could not be copied are left out
/// - Encoding: UTF-8
pub fn to_csv(records: &[PostRecord]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(HEADER)?;
    for record in records {
        writer.write_record(build_row(record))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ExportError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Writes records as CSV to `path`, replacing any existing file.
pub fn write_csv(records: &[PostRecord], path: &Path) -> Result<()> {
    let content = to_csv(records)?;
    fs::write(path, content).map_err(|e| ExportError::output_dir(path, e))
}

fn build_row(record: &PostRecord) -> [String; 6] {
    [
        record.id.clone(),
        record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        record.text.clone().unwrap_or_default(),
        record.available_photos().collect::<Vec<_>>().join(LIST_DELIMITER),
        record
            .tags
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(LIST_DELIMITER),
        record.links.join(LIST_DELIMITER),
    ]
}
