use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::{MediaKind, SourceFile};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("unreadable file: {0}")]
    Unreadable(String),
    #[error("not a {expected} file")]
    WrongKind { expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedFile {
    pub path: PathBuf,
    pub reason: IntakeError,
}

/// Screens candidate files against the active converter kind before any of
/// them becomes a job. Detection goes by magic bytes, not file extension:
/// PNG/JPEG signatures for images, an MP4 `ftyp` box for videos.
pub fn screen_files(paths: &[PathBuf], kind: MediaKind) -> (Vec<SourceFile>, Vec<RejectedFile>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for path in paths {
        match screen_one(path, kind) {
            Ok(file) => accepted.push(file),
            Err(reason) => rejected.push(RejectedFile {
                path: path.clone(),
                reason,
            }),
        }
    }
    (accepted, rejected)
}

fn screen_one(path: &Path, kind: MediaKind) -> Result<SourceFile, IntakeError> {
    let header = read_header(path)?;
    if !matches_kind(&header, kind) {
        return Err(IntakeError::WrongKind {
            expected: expected_label(kind),
        });
    }
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| IntakeError::Unreadable("missing file name".to_string()))?;
    Ok(SourceFile {
        name,
        path: path.to_path_buf(),
    })
}

fn read_header(path: &Path) -> Result<Vec<u8>, IntakeError> {
    let mut file = File::open(path).map_err(|err| IntakeError::Unreadable(err.to_string()))?;
    let mut header = [0u8; 32];
    let mut read = 0;
    // A short read is fine; tiny files just yield a short header.
    while read < header.len() {
        match file.read(&mut header[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(err) => return Err(IntakeError::Unreadable(err.to_string())),
        }
    }
    Ok(header[..read].to_vec())
}

fn matches_kind(header: &[u8], kind: MediaKind) -> bool {
    match kind {
        MediaKind::Image => matches!(
            image::guess_format(header),
            Ok(ImageFormat::Png | ImageFormat::Jpeg)
        ),
        MediaKind::Video => is_mp4(header),
    }
}

fn is_mp4(header: &[u8]) -> bool {
    header.len() >= 12 && &header[4..8] == b"ftyp"
}

fn expected_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "PNG or JPEG image",
        MediaKind::Video => "MP4 video",
    }
}
