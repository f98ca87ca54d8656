use std::path::Path;

use mediapress_engine::{derived_name, unique_names, MediaKind};
use pretty_assertions::assert_eq;

#[test]
fn extension_is_replaced_by_target_format() {
    assert_eq!(derived_name("photo.png", MediaKind::Image), "photo.webp");
    assert_eq!(derived_name("photo.JPEG", MediaKind::Image), "photo.webp");
    assert_eq!(derived_name("clip.mp4", MediaKind::Video), "clip.webm");
    // No extension: the whole name is the stem.
    assert_eq!(derived_name("photo", MediaKind::Image), "photo.webp");
    // Only the last extension is replaced.
    assert_eq!(
        derived_name("archive.tar.png", MediaKind::Image),
        "archive.tar.webp"
    );
}

#[test]
fn stems_are_sanitized_for_the_filesystem() {
    let name = derived_name("my: photo?/bad.png", MediaKind::Image);
    assert_eq!(name, "my_ photo_bad.webp");

    // Reserved device names are patched.
    let reserved = derived_name("CON.png", MediaKind::Image);
    assert_eq!(reserved, "CON_.webp");

    // Empty stems fall back to a placeholder.
    let empty = derived_name("...png", MediaKind::Image);
    assert_eq!(empty, "untitled.webp");
}

#[test]
fn duplicate_derived_names_are_disambiguated() {
    let sources = vec![
        ("pic.png".to_string(), Path::new("/a/pic.png")),
        ("pic.jpg".to_string(), Path::new("/b/pic.jpg")),
        ("other.png".to_string(), Path::new("/a/other.png")),
    ];
    let names = unique_names(&sources, MediaKind::Image);

    assert_eq!(names.len(), 3);
    assert_eq!(names[0], "pic.webp");
    assert!(names[1].starts_with("pic-"));
    assert!(names[1].ends_with(".webp"));
    assert_ne!(names[0], names[1]);
    assert_eq!(names[2], "other.webp");

    // Deterministic across calls.
    assert_eq!(names, unique_names(&sources, MediaKind::Image));
}

#[test]
fn same_source_added_twice_still_gets_unique_names() {
    let sources = vec![
        ("pic.png".to_string(), Path::new("/a/pic.png")),
        ("pic.png".to_string(), Path::new("/a/pic.png")),
        ("pic.png".to_string(), Path::new("/a/pic.png")),
    ];
    let names = unique_names(&sources, MediaKind::Image);

    let mut unique = names.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);
}
