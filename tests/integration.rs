//! Pipeline integration tests with export shards built at test time.

mod common;

use std::fs;

use common::{POSTS_PATH, T, Workspace, patch_bytes, post, post_with, posts_file, zip_bytes};
use postpack::config::{ExportConfig, SortOrder};
use postpack::core::{Pipeline, SiteOptions, render_html, to_csv};
use postpack::prelude::*;

fn run(ws: &Workspace) -> Extraction {
    Pipeline::new(ExportConfig::default())
        .run(&ws.input(), &ws.photos())
        .expect("pipeline run failed")
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_minimal_export() {
    let ws = Workspace::new();
    let posts = posts_file(&[post_with(T, "Hello world", &[], &["family"])]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)]);

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    let record = &extraction.records[0];
    assert_eq!(record.text.as_deref(), Some("Hello world"));

    let csv = to_csv(&extraction.records).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert_eq!(
        row,
        format!("{},2024-01-15T10:30:00Z,Hello world,,family,", record.id)
    );

    let html = render_html(&extraction.records, &SiteOptions::new());
    assert!(html.contains("Hello world"));
    assert!(html.contains("family"));

    let summary = &extraction.summary;
    assert_eq!(summary.archives_found, 1);
    assert_eq!(summary.post_files_read, 1);
    assert_eq!(summary.records_written, 1);
    assert!(!summary.has_issues());
}

#[test]
fn test_photos_are_copied() {
    let ws = Workspace::new();
    let uri = "your_facebook_activity/posts/media/Album/1.jpg";
    let posts = posts_file(&[post_with(T, "Beach", &[uri], &[])]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts), (uri, b"jpeg bytes")]);

    let extraction = run(&ws);
    let photo = &extraction.records[0].photos[0];
    let name = photo.output_name.as_deref().expect("photo should resolve");
    assert!(name.ends_with(".jpg"));
    assert_eq!(fs::read(ws.photos().join(name)).unwrap(), b"jpeg bytes");
    assert_eq!(extraction.summary.photos.copied, 1);

    let html = render_html(&extraction.records, &SiteOptions::new());
    assert!(html.contains(&format!(r#"src="photos/{name}""#)));
}

#[test]
fn test_photo_in_another_shard() {
    let ws = Workspace::new();
    let uri = "your_facebook_activity/posts/media/Album/2.png";
    let posts = posts_file(&[post_with(T, "Split export", &[uri], &[])]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)])
        .shard("facebook-2.zip", &[(uri, b"png bytes")]);

    let extraction = run(&ws);
    assert!(extraction.records[0].photos[0].is_available());
    assert_eq!(extraction.summary.photo_issues(), 0);
}

#[test]
fn test_missing_photo() {
    let ws = Workspace::new();
    let posts = posts_file(&[post_with(T, "Lost", &["posts/media/gone.jpg"], &[])]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)]);

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    let record = &extraction.records[0];
    assert_eq!(record.photos.len(), 1);
    assert!(!record.photos[0].is_available());
    assert_eq!(extraction.summary.photos.missing, 1);
    assert_eq!(extraction.summary.photo_issues(), 1);

    let html = render_html(&extraction.records, &SiteOptions::new());
    assert!(html.contains("Photo unavailable"));
    assert!(!html.contains("<img"));

    let csv = to_csv(&extraction.records).unwrap();
    assert!(csv.lines().nth(1).unwrap().contains(",Lost,,,"));
}

#[test]
fn test_duplicate_across_shards() {
    let ws = Workspace::new();
    let posts = posts_file(&[post(T, "Same post"), post(T + 60, "Only once")]);
    let other = posts_file(&[post(T, "Same post")]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)]).shard(
        "facebook-2.zip",
        &[("your_facebook_activity/posts/your_posts_2.json", &other)],
    );

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 2);
    assert_eq!(extraction.summary.duplicates, 1);
    assert_eq!(extraction.summary.records_parsed, 3);
    let ids: std::collections::HashSet<_> = extraction.records.iter().map(|r| &r.id).collect();
    assert_eq!(ids.len(), 2);
}

#[test]
fn test_default_order_is_newest_first() {
    let ws = Workspace::new();
    let posts = posts_file(&[post(T, "middle"), post(T - 100, "oldest"), post(T + 100, "newest")]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)]);

    let texts: Vec<_> = run(&ws)
        .records
        .into_iter()
        .filter_map(|r| r.text)
        .collect();
    assert_eq!(texts, vec!["newest", "middle", "oldest"]);
}

#[test]
fn test_oldest_first() {
    let ws = Workspace::new();
    let posts = posts_file(&[post(T, "middle"), post(T - 100, "oldest"), post(T + 100, "newest")]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)]);

    let extraction = Pipeline::new(ExportConfig::new().with_order(SortOrder::OldestFirst))
        .run(&ws.input(), &ws.photos())
        .unwrap();
    let texts: Vec<_> = extraction.records.into_iter().filter_map(|r| r.text).collect();
    assert_eq!(texts, vec!["oldest", "middle", "newest"]);
}

#[test]
fn test_idempotent_outputs() {
    let build = || {
        let ws = Workspace::new();
        let uri = "posts/media/a.jpg";
        let posts = posts_file(&[
            post_with(T, "Hello, \"quoted\"\nworld", &[uri, "posts/media/gone.jpg"], &["b", "a"]),
            post(T + 5, "Second"),
            post(T + 5, "Tie"),
        ]);
        ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts), (uri, b"AAA")]);
        let extraction = run(&ws);
        (
            to_csv(&extraction.records).unwrap(),
            render_html(&extraction.records, &SiteOptions::new()),
        )
    };

    let (csv_a, html_a) = build();
    let (csv_b, html_b) = build();
    assert_eq!(csv_a, csv_b);
    assert_eq!(html_a, html_b);
}

#[test]
fn test_rerun_into_populated_output() {
    let ws = Workspace::new();
    let uri = "posts/media/a.jpg";
    let posts = posts_file(&[post_with(T, "x", &[uri], &[])]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts), (uri, b"AAA")]);

    let first = run(&ws);
    let second = run(&ws);
    assert_eq!(first.records, second.records);
    assert_eq!(second.summary.photos.copied, 0);
    assert_eq!(second.summary.photos.already_present, 1);
    assert_eq!(fs::read_dir(ws.photos()).unwrap().count(), 1);
}

#[test]
fn test_shared_photo_is_stored_once() {
    let ws = Workspace::new();
    let posts = posts_file(&[
        post_with(T, "one", &["posts/media/a.jpg"], &[]),
        post_with(T + 1, "two", &["posts/media/copy.jpg"], &[]),
    ]);
    ws.shard(
        "facebook-1.zip",
        &[
            (POSTS_PATH, &posts),
            ("posts/media/a.jpg", b"same"),
            ("posts/media/copy.jpg", b"same"),
        ],
    );

    let extraction = run(&ws);
    let names: Vec<_> = extraction
        .records
        .iter()
        .map(|r| r.photos[0].output_name.clone().unwrap())
        .collect();
    assert_eq!(names[0], names[1]);
    assert_eq!(fs::read_dir(ws.photos()).unwrap().count(), 1);
}

// ============================================================================
// Tolerance
// ============================================================================

#[test]
fn test_optional_fields_missing_or_wrong_typed() {
    let ws = Workspace::new();
    let json = format!(
        r#"[
            {{"timestamp": {T}}},
            {{"timestamp": {T}, "data": "not a list", "tags": 5, "attachments": {{}}}},
            {{"timestamp": "{T}", "data": [{{"post": "string timestamp"}}]}},
            {{"data": [{{"post": "no timestamp"}}]}},
            "garbage"
        ]"#
    );
    ws.shard("facebook-1.zip", &[(POSTS_PATH, json.as_bytes())]);

    let extraction = run(&ws);
    // The first two are identical once the bad fields are dropped.
    assert_eq!(extraction.records.len(), 2);
    assert_eq!(extraction.summary.duplicates, 1);
    assert_eq!(extraction.summary.records_skipped, 2);
    assert_eq!(extraction.summary.record_issues(), 2);
}

#[test]
fn test_broken_post_file_does_not_stop_others() {
    let ws = Workspace::new();
    let good = posts_file(&[post(T, "survivor")]);
    ws.shard(
        "facebook-1.zip",
        &[
            ("posts/your_posts_1.json", b"{ not json"),
            ("posts/your_posts_2.json", &good),
        ],
    );

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.summary.post_files_failed, 1);
    assert_eq!(extraction.summary.post_files_read, 1);
}

#[test]
fn test_corrupt_shard() {
    let ws = Workspace::new();
    let posts = posts_file(&[post(T, "from the good shard")]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts)])
        .raw("facebook-2.zip", b"this is not a zip file");

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.summary.archives_found, 2);
    assert_eq!(extraction.summary.archives_failed, 1);
    assert_eq!(extraction.summary.archive_issues(), 1);
}

#[test]
fn test_entries_that_fail_to_decompress() {
    let ws = Workspace::new();
    let photo = "your_facebook_activity/posts/media/Album/1.jpg";
    let posts = posts_file(&[post_with(T, "survivor", &[photo], &[])]);
    let damaged = posts_file(&[post(T + 60, "DOOMED-POST")]);
    ws.stored_shard(
        "facebook-1.zip",
        &[
            (POSTS_PATH, &posts),
            ("your_facebook_activity/posts/your_posts_2.json", &damaged),
            (photo, b"PHOTO-BYTES"),
        ],
    );
    let shard = ws.input().join("facebook-1.zip");
    // same length, so the archive still opens but the CRC no longer matches
    patch_bytes(&shard, b"DOOMED-POST", b"DAMAGED-PST");
    patch_bytes(&shard, b"PHOTO-BYTES", b"PHOTO-BYTEZ");

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    let record = &extraction.records[0];
    assert_eq!(record.text.as_deref(), Some("survivor"));
    assert!(record.photos[0].output_name.is_none());

    let summary = &extraction.summary;
    assert_eq!(summary.post_files_read, 1);
    assert_eq!(summary.post_files_failed, 1);
    assert_eq!(summary.archive_issues(), 1);
    assert_eq!(summary.archives_failed, 1);
    assert_eq!(summary.photo_issues(), 1);
    assert_eq!(summary.photos.missing, 1);

    let archive_issue = summary.issues.iter().find(|e| e.is_archive_corrupt()).unwrap();
    assert!(archive_issue.to_string().contains("facebook-1.zip"));
    let photo_issue = summary.issues.iter().find(|e| e.is_photo_missing()).unwrap();
    assert!(photo_issue.to_string().contains(photo));
}

#[test]
fn test_oversized_post_file_is_reported() {
    let ws = Workspace::new();
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts_file(&[post(T, "too big")]))]);

    let extraction = Pipeline::new(ExportConfig::default().with_max_entry_size(16))
        .run(&ws.input(), &ws.photos())
        .unwrap();
    assert!(extraction.records.is_empty());

    let summary = &extraction.summary;
    assert!(summary.has_issues());
    assert_eq!(summary.archive_issues(), 1);
    assert_eq!(summary.archives_failed, 1);
    let message = summary.issues[0].to_string();
    assert!(message.contains(POSTS_PATH));
    assert!(message.contains("16 byte limit"));
}

#[test]
fn test_oversized_photo_keeps_its_reason() {
    let ws = Workspace::new();
    let photo = "your_facebook_activity/posts/media/big.jpg";
    let posts = posts_file(&[post_with(T, "huge photo", &[photo], &[])]);
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts), (photo, &[7u8; 4096])]);

    let extraction = Pipeline::new(ExportConfig::default().with_max_entry_size(1024))
        .run(&ws.input(), &ws.photos())
        .unwrap();
    assert_eq!(extraction.records.len(), 1);

    let summary = &extraction.summary;
    assert_eq!(summary.archive_issues(), 1);
    assert_eq!(summary.photo_issues(), 1);
    let photo_issue = summary.issues.iter().find(|e| e.is_photo_missing()).unwrap();
    assert!(photo_issue.to_string().contains("1024 byte limit"));
}

#[test]
fn test_nested_archive() {
    let ws = Workspace::new();
    let posts = posts_file(&[post(T, "inside")]);
    let inner = zip_bytes(&[(POSTS_PATH, &posts)]);
    ws.shard("outer.zip", &[("bundle/inner.zip", &inner)]);

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.records[0].source_archive, "outer.zip/bundle/inner.zip");
}

#[test]
fn test_mojibake_is_repaired() {
    let ws = Workspace::new();
    // "café" as UTF-8 bytes, each read back as a Latin-1 char
    let json = r#"[{"timestamp": 1705314600, "data": [{"post": "cafÃ©"}]}]"#;
    ws.shard("facebook-1.zip", &[(POSTS_PATH, json.as_bytes())]);

    let extraction = run(&ws);
    assert_eq!(extraction.records[0].text.as_deref(), Some("café"));
}

#[test]
fn test_non_post_files_are_ignored() {
    let ws = Workspace::new();
    let posts = posts_file(&[post(T, "kept")]);
    ws.shard(
        "facebook-1.zip",
        &[
            (POSTS_PATH, &posts),
            ("comments/comments.json", b"[{\"timestamp\": 1}]"),
            ("posts/your_posts_1.html", b"<html></html>"),
        ],
    );

    let extraction = run(&ws);
    assert_eq!(extraction.records.len(), 1);
    assert_eq!(extraction.summary.post_files_read, 1);
}

// ============================================================================
// Fatal errors
// ============================================================================

#[test]
fn test_no_archives_is_fatal() {
    let ws = Workspace::new();
    let err = Pipeline::default().run(&ws.input(), &ws.photos()).unwrap_err();
    assert!(matches!(err, ExportError::NoArchives { .. }));
    assert!(err.is_fatal());
}

#[test]
fn test_unwritable_photo_dir_is_fatal() {
    let ws = Workspace::new();
    ws.shard("facebook-1.zip", &[(POSTS_PATH, &posts_file(&[post(T, "x")]))]);
    fs::create_dir_all(ws.output()).unwrap();
    // A file where the photo directory should be
    fs::write(ws.photos(), b"in the way").unwrap();

    let err = Pipeline::default().run(&ws.input(), &ws.photos()).unwrap_err();
    assert!(matches!(err, ExportError::OutputDir { .. }));
}
