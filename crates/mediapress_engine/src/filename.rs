use std::collections::HashSet;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::MediaKind;

/// Windows-safe derived output name: `{sanitized_stem}.{target_extension}`.
pub fn derived_name(source_name: &str, kind: MediaKind) -> String {
    let stem = match source_name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => source_name,
    };
    format!("{}.{}", sanitize_stem(stem), kind.target_extension())
}

/// Assigns each job a derived name, disambiguating duplicates within the
/// batch: every collider after the first gets a short hash of its source
/// path appended to the stem. Output order matches input order.
pub fn unique_names(sources: &[(String, &Path)], kind: MediaKind) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(sources.len());
    for (source_name, source_path) in sources {
        let base = derived_name(source_name, kind);
        let mut candidate = base.clone();
        if taken.contains(&candidate) {
            let (stem, ext) = split_name(&base);
            let hash = short_hash(&source_path.to_string_lossy());
            candidate = format!("{stem}-{hash}.{ext}");
            let mut n = 2;
            while taken.contains(&candidate) {
                candidate = format!("{stem}-{hash}-{n}.{ext}");
                n += 1;
            }
        }
        taken.insert(candidate.clone());
        names.push(candidate);
    }
    names
}

fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (name, ""),
    }
}

fn sanitize_stem(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name = compacted;
    if final_name.len() > 80 {
        final_name.truncate(80);
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
