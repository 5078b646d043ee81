//! Unit tests for artifact persistence

use imagegen_fallback::output::{ArtifactMetadata, ArtifactWriter};
use imagegen_fallback::provider::ImageSize;

#[tokio::test]
async fn test_creates_nested_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let writer = ArtifactWriter::new(&nested, false);

    writer.ensure_output_dir().await.unwrap();
    assert!(nested.is_dir());
}

#[tokio::test]
async fn test_persist_writes_exact_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArtifactWriter::new(dir.path(), true);

    let artifact = writer
        .persist("pollinations", "red panda", ImageSize::new(512, 512), b"\x01\x02")
        .await
        .unwrap();

    assert!(artifact.filename.starts_with("pollinations_"));
    assert!(artifact.filename.ends_with(".jpg"));
    assert_eq!(std::fs::read(&artifact.image_path).unwrap(), b"\x01\x02");
}

#[tokio::test]
async fn test_png_payload_gets_png_extension() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArtifactWriter::new(dir.path(), false);
    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

    let artifact = writer
        .persist("openai", "red panda", ImageSize::default(), &png)
        .await
        .unwrap();

    assert!(artifact.filename.ends_with(".png"));
}

#[tokio::test]
async fn test_repeated_persist_never_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArtifactWriter::new(dir.path(), true);

    let mut paths = Vec::new();
    for i in 0..5u8 {
        let artifact = writer
            .persist("together", "same second", ImageSize::default(), &[i, i])
            .await
            .unwrap();
        paths.push(artifact.image_path);
    }

    let mut unique = paths.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);

    for (i, path) in paths.iter().enumerate() {
        assert_eq!(std::fs::read(path).unwrap(), vec![i as u8, i as u8]);
    }
}

#[tokio::test]
async fn test_list_metadata_reads_records() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArtifactWriter::new(dir.path(), true);

    writer
        .persist("deepai", "first", ImageSize::new(256, 256), b"one")
        .await
        .unwrap();
    writer
        .persist("deepai", "second", ImageSize::new(256, 256), b"two")
        .await
        .unwrap();
    std::fs::write(dir.path().join("notes.json"), "not metadata").unwrap();

    let records: Vec<ArtifactMetadata> = writer.list_metadata().await.unwrap();
    assert_eq!(records.len(), 2);

    let mut prompts: Vec<&str> = records.iter().map(|r| r.prompt.as_str()).collect();
    prompts.sort();
    assert_eq!(prompts, vec!["first", "second"]);
    assert!(records.iter().all(|r| r.size == "256x256"));
}

#[tokio::test]
async fn test_list_metadata_missing_dir() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ArtifactWriter::new(dir.path().join("never-created"), true);
    assert!(writer.list_metadata().await.unwrap().is_empty());
}
