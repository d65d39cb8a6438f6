//! Integration tests: archive listing and entry previews

use crate::fixtures::{ZipBuilder, sample_submission, write_file};
use contest_preview::inspect::InspectOptions;
use contest_preview::tree::{build_tree, walk};
use contest_preview::{ArchiveEntry, Inspector, MemoryReader, PreviewError, Source};
use std::sync::Arc;
use tempfile::TempDir;

fn inspector() -> Inspector {
    Inspector::new(InspectOptions::default())
}

#[tokio::test]
async fn test_lists_local_zip() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "submission.zip", &sample_submission());

    let content = inspector()
        .preview(&Source::Local(path))
        .await
        .unwrap();

    assert_eq!(
        content.files,
        vec![
            ArchiveEntry::file("README.md", 9),
            ArchiveEntry::dir("src/"),
            ArchiveEntry::file("src/main.py", 15),
            ArchiveEntry::file("src/util/helpers.py", 22),
            ArchiveEntry::file("bin/app.exe", 8),
        ]
    );
}

#[tokio::test]
async fn test_listing_feeds_tree() {
    let reader = Arc::new(MemoryReader::new(sample_submission()));
    let content = inspector()
        .preview_reader("upload.zip", reader)
        .await
        .unwrap();

    let tree = build_tree(&content.files);
    let rows: Vec<(usize, &str, bool)> = walk(&tree)
        .iter()
        .map(|(depth, n)| (*depth, n.name.as_str(), n.is_dir))
        .collect();

    assert_eq!(
        rows,
        vec![
            (0, "bin", true),
            (1, "app.exe", false),
            (0, "src", true),
            (1, "util", true),
            (2, "helpers.py", false),
            (1, "main.py", false),
            (0, "README.md", false),
        ]
    );
}

#[tokio::test]
async fn test_archive_with_comment() {
    let bytes = ZipBuilder::new()
        .stored("a.txt", b"a")
        .comment("submitted by table 12")
        .build();
    let reader = Arc::new(MemoryReader::new(bytes));

    let content = inspector().preview_reader("x.zip", reader).await.unwrap();
    assert_eq!(content.files, vec![ArchiveEntry::file("a.txt", 1)]);
}

#[tokio::test]
async fn test_empty_zip_is_empty_not_error() {
    let reader = Arc::new(MemoryReader::new(ZipBuilder::new().build()));
    let content = inspector().preview_reader("empty.zip", reader).await.unwrap();
    assert!(content.files.is_empty());
    assert!(build_tree(&content.files).is_empty());
}

#[tokio::test]
async fn test_corrupt_zip_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "broken.zip", b"this is not really a zip archive");

    let err = inspector().preview(&Source::Local(path)).await.unwrap_err();
    assert!(matches!(err, PreviewError::Archive(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_truncated_central_directory_is_an_error() {
    let mut bytes = sample_submission();
    // drop the middle of the archive, keep the EOCD
    let tail = bytes.split_off(bytes.len() - 22);
    bytes.truncate(20);
    bytes.extend_from_slice(&tail);

    let reader = Arc::new(MemoryReader::new(bytes));
    let err = inspector()
        .preview_reader("cut.zip", reader)
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::Archive(_)));
}

#[tokio::test]
async fn test_entry_limit() {
    let mut builder = ZipBuilder::new();
    for i in 0..20 {
        builder = builder.stored(&format!("f{}.txt", i), b"x");
    }
    let reader = Arc::new(MemoryReader::new(builder.build()));
    let limited = Inspector::new(InspectOptions {
        max_entries: 10,
        ..InspectOptions::default()
    });

    let err = limited.preview_reader("many.zip", reader).await.unwrap_err();
    assert!(matches!(err, PreviewError::Archive(_)));
}

#[tokio::test]
async fn test_rar_and_loose_files_list_nothing() {
    let rar = Arc::new(MemoryReader::new(b"Rar!\x1a\x07\x01\x00rest".to_vec()));
    let content = inspector().preview_reader("sub.rar", rar).await.unwrap();
    assert!(content.files.is_empty());

    let text = Arc::new(MemoryReader::new(b"just notes".to_vec()));
    let content = inspector().preview_reader("notes.txt", text).await.unwrap();
    assert!(content.files.is_empty());
}

#[tokio::test]
async fn test_missing_archive() {
    let temp = TempDir::new().unwrap();
    let err = inspector()
        .preview(&Source::Local(temp.path().join("gone.zip")))
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::NotFound(_)));
}

#[tokio::test]
async fn test_preview_deflated_entry() {
    let temp = TempDir::new().unwrap();
    let path = write_file(temp.path(), "submission.zip", &sample_submission());

    let preview = inspector()
        .preview_entry(&Source::Local(path), "src/main.py")
        .await
        .unwrap();

    assert_eq!(preview.filename, "main.py");
    assert!(preview.is_text);
    assert_eq!(preview.content.as_deref(), Some("print('hello')\n"));
    assert_eq!(preview.size, 15);
    assert!(!preview.truncated);
}

#[tokio::test]
async fn test_preview_stored_entry_with_leading_slash() {
    let reader = Arc::new(MemoryReader::new(sample_submission()));
    let preview = inspector()
        .preview_entry_reader("s.zip", reader, "/src/util/helpers.py")
        .await
        .unwrap();
    assert_eq!(preview.content.as_deref(), Some("def f():\n    return 1\n"));
}

#[tokio::test]
async fn test_binary_entry_has_no_content() {
    let reader = Arc::new(MemoryReader::new(sample_submission()));
    let preview = inspector()
        .preview_entry_reader("s.zip", reader, "bin/app.exe")
        .await
        .unwrap();
    assert!(!preview.is_text);
    assert_eq!(preview.content, None);
    assert_eq!(preview.size, 8);
}

#[tokio::test]
async fn test_large_deflated_entry_is_bounded() {
    let body = "0123456789\n".repeat(10_000);
    let bytes = ZipBuilder::new().deflated("log/output.log", body.as_bytes()).build();
    let reader = Arc::new(MemoryReader::new(bytes));
    let small = Inspector::new(InspectOptions {
        max_preview_bytes: 100,
        ..InspectOptions::default()
    });

    let preview = small
        .preview_entry_reader("s.zip", reader, "log/output.log")
        .await
        .unwrap();

    assert!(preview.truncated);
    assert_eq!(preview.size, body.len() as u64);
    assert_eq!(preview.content.as_deref(), Some(&body[..100]));
}

#[tokio::test]
async fn test_entry_errors() {
    let reader = Arc::new(MemoryReader::new(sample_submission()));

    let err = inspector()
        .preview_entry_reader("s.zip", reader.clone(), "src/missing.py")
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::EntryNotFound(_)));

    let err = inspector()
        .preview_entry_reader("s.zip", reader, "src")
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::IsDirectory(_)));

    let rar = Arc::new(MemoryReader::new(b"Rar!\x1a\x07\x00".to_vec()));
    let err = inspector()
        .preview_entry_reader("s.rar", rar, "main.c")
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::Unsupported(_)));
}

#[tokio::test]
async fn test_exact_name_wins_over_trimmed_match() {
    // directory record listed before a file of the same name
    let bytes = ZipBuilder::new()
        .dir("data/")
        .stored("data", b"rows\n")
        .build();
    let reader = Arc::new(MemoryReader::new(bytes));

    let preview = inspector()
        .preview_entry_reader("s.zip", reader.clone(), "data")
        .await
        .unwrap();
    assert_eq!(preview.content.as_deref(), Some("rows\n"));

    let err = inspector()
        .preview_entry_reader("s.zip", reader, "data/")
        .await
        .unwrap_err();
    assert!(matches!(err, PreviewError::IsDirectory(_)));
}
