use std::io::Read;

use bytes::Bytes;
use mediapress_engine::{
    build_archive, deliver_outputs, ArchiveOptions, Artifact, DeliverError, MediaKind,
};
use pretty_assertions::assert_eq;

fn artifact(output_name: &str, payload: &'static [u8]) -> Artifact {
    Artifact {
        output_name: output_name.to_string(),
        mime: "image/webp",
        bytes: Bytes::from_static(payload),
    }
}

fn options(kind: MediaKind) -> ArchiveOptions {
    ArchiveOptions::for_kind(kind, "2025-01-01T00:00:00Z".to_string())
}

#[test]
fn single_artifact_is_written_directly() {
    let temp = tempfile::TempDir::new().unwrap();
    let artifacts = vec![artifact("a.webp", b"webp-bytes")];

    let summary =
        deliver_outputs(temp.path(), &artifacts, &options(MediaKind::Image)).unwrap();

    assert!(!summary.archived);
    assert_eq!(summary.entries, 1);
    assert_eq!(summary.path.file_name().unwrap(), "a.webp");
    // Bytes land unchanged.
    assert_eq!(std::fs::read(&summary.path).unwrap(), b"webp-bytes");
}

#[test]
fn multiple_artifacts_are_bundled_into_one_zip() {
    let temp = tempfile::TempDir::new().unwrap();
    let artifacts = vec![
        artifact("a.webp", b"first"),
        artifact("b.webp", b"second"),
    ];

    let summary =
        deliver_outputs(temp.path(), &artifacts, &options(MediaKind::Image)).unwrap();

    assert!(summary.archived);
    assert_eq!(summary.entries, 2);
    assert_eq!(summary.path.file_name().unwrap(), "Converted_Images.zip");

    let file = std::fs::File::open(&summary.path).unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    assert_eq!(zip.len(), 2);

    let mut first = String::new();
    zip.by_name("Converted_WebP_Images/a.webp")
        .unwrap()
        .read_to_string(&mut first)
        .unwrap();
    assert_eq!(first, "first");

    let mut second = String::new();
    zip.by_name("Converted_WebP_Images/b.webp")
        .unwrap()
        .read_to_string(&mut second)
        .unwrap();
    assert_eq!(second, "second");
}

#[test]
fn video_archive_uses_the_video_folder() {
    let archive = build_archive(
        &[
            artifact("a.webm", b"one"),
            artifact("b.webm", b"two"),
        ],
        MediaKind::Video.archive_folder(),
    )
    .unwrap();

    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(archive)).unwrap();
    let names: Vec<String> = (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "Converted_WebM_Videos/a.webm".to_string(),
            "Converted_WebM_Videos/b.webm".to_string(),
        ]
    );
}

#[test]
fn manifest_is_written_beside_the_output() {
    let temp = tempfile::TempDir::new().unwrap();
    let artifacts = vec![
        artifact("a.webp", b"first"),
        artifact("b.webp", b"second"),
    ];

    let summary =
        deliver_outputs(temp.path(), &artifacts, &options(MediaKind::Image)).unwrap();

    let manifest_path = summary.manifest_path.expect("manifest path");
    let manifest = std::fs::read_to_string(manifest_path).unwrap();
    assert!(manifest.contains("\"entry_count\":2"));
    assert!(manifest.contains("\"a.webp\""));
    assert!(manifest.contains("\"b.webp\""));
    assert!(manifest.contains("2025-01-01T00:00:00Z"));
}

#[test]
fn manifest_can_be_disabled() {
    let temp = tempfile::TempDir::new().unwrap();
    let mut options = options(MediaKind::Image);
    options.manifest_filename = None;

    let summary =
        deliver_outputs(temp.path(), &[artifact("a.webp", b"x")], &options).unwrap();
    assert!(summary.manifest_path.is_none());
}

#[test]
fn empty_delivery_is_an_error() {
    let temp = tempfile::TempDir::new().unwrap();
    let result = deliver_outputs(temp.path(), &[], &options(MediaKind::Image));
    assert!(matches!(result, Err(DeliverError::Empty)));
}
