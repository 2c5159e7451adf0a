//! Integration tests for the directory-backed asset source.
//! Creates a temporary library with a tiny 1x1 PNG and verifies enumeration,
//! thumbnail decoding, favorite round-trips and deletion semantics.

use std::fs;
use std::path::Path;

use photogallery::error::Error;
use photogallery::fs_source::FsAssetSource;
use photogallery::record::AssetId;
use photogallery::source::{AssetSource, THUMBNAIL_EDGE};

/// Write a tiny 1x1 PNG to `path`.
fn write_1x1_png<P: AsRef<Path>>(path: P) {
    // A valid minimal 1x1 RGBA PNG.
    const PNG_BYTES: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
        0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0xDA, 0x63, 0xF8,
        0xCF, 0xC0, 0xF0, 0x1F, 0x00, 0x05, 0x00, 0x01, 0xFF, 0x56, 0xC7, 0x2F, 0x0D, 0x00, 0x00,
        0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];
    fs::write(path, PNG_BYTES).expect("write png");
}

#[tokio::test]
async fn enumerates_images_and_skips_other_files() {
    let dir = tempfile::tempdir().unwrap();
    write_1x1_png(dir.path().join("tiny.png"));
    fs::write(dir.path().join("note.txt"), "hello").unwrap();

    let source = FsAssetSource::new(dir.path()).unwrap();
    let assets = source.enumerate().await.unwrap();

    assert_eq!(assets.len(), 1, "only the PNG should be picked up");
    let a = &assets[0];
    assert!(a.id.as_str().ends_with("tiny.png"));
    assert_eq!((a.pixel_width, a.pixel_height), (1, 1));
    assert!(
        a.creation_date.is_some(),
        "file mtime stands in when there is no EXIF date"
    );
    assert!(!a.is_favorite);
}

#[tokio::test]
async fn thumbnail_fetch_decodes_and_missing_file_is_per_item_failure() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("tiny.png");
    write_1x1_png(&png);

    let source = FsAssetSource::new(dir.path()).unwrap();
    let id = AssetId::new(png.to_string_lossy());
    let thumb = source.fetch_thumbnail(&id, THUMBNAIL_EDGE).await;
    assert_eq!(thumb.expect("decoded thumbnail").dimensions(), (1, 1));

    let gone = AssetId::new(dir.path().join("absent.png").to_string_lossy());
    assert!(source.fetch_thumbnail(&gone, THUMBNAIL_EDGE).await.is_none());
}

#[tokio::test]
async fn favorites_round_trip_through_enumeration() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("tiny.png");
    write_1x1_png(&png);

    let source = FsAssetSource::new(dir.path()).unwrap();
    let id = AssetId::new(png.to_string_lossy());
    source.set_favorite(&id, true).unwrap();

    let assets = source.enumerate().await.unwrap();
    assert!(assets[0].is_favorite);

    source.set_favorite(&id, false).unwrap();
    let assets = source.enumerate().await.unwrap();
    assert!(!assets[0].is_favorite);
}

#[tokio::test]
async fn delete_removes_files_and_tolerates_missing_ones() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("tiny.png");
    write_1x1_png(&png);

    let source = FsAssetSource::new(dir.path()).unwrap();
    let ids = vec![
        AssetId::new(png.to_string_lossy()),
        AssetId::new(dir.path().join("already-gone.png").to_string_lossy()),
    ];
    source.delete(&ids).await.unwrap();

    assert!(!png.exists());
    assert!(source.enumerate().await.unwrap().is_empty());
}

#[test]
fn invalid_root_is_rejected() {
    let err = FsAssetSource::new("/definitely/not/a/dir").unwrap_err();
    assert!(matches!(err, Error::BadDir(_)));
}
