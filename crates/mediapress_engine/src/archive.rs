use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::persist::{AtomicFileWriter, PersistError};
use crate::{Artifact, MediaKind};

#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    pub archive_filename: String,
    pub folder_name: String,
    pub manifest_filename: Option<String>,
    pub created_utc: String,
}

impl ArchiveOptions {
    /// Naming that matches the converter variant: one folder for WebP
    /// images, one for WebM videos.
    pub fn for_kind(kind: MediaKind, created_utc: String) -> Self {
        Self {
            archive_filename: kind.archive_filename().to_string(),
            folder_name: kind.archive_folder().to_string(),
            manifest_filename: Some("manifest.json".to_string()),
            created_utc,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliverError {
    #[error("nothing to deliver")]
    Empty,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySummary {
    pub path: PathBuf,
    pub entries: usize,
    pub archived: bool,
    pub manifest_path: Option<PathBuf>,
}

/// Builds the combined archive in memory: every artifact under its derived
/// name inside one top-level folder.
pub fn build_archive(
    artifacts: &[Artifact],
    folder_name: &str,
) -> Result<Vec<u8>, zip::result::ZipError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for artifact in artifacts {
        writer.start_file(format!("{folder_name}/{}", artifact.output_name), options)?;
        writer.write_all(&artifact.bytes)?;
    }
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Writes the requested outputs: a lone artifact goes out directly under its
/// derived name, two or more are bundled into one ZIP. Failed jobs never
/// reach this point; the caller passes successful artifacts only.
pub fn deliver_outputs(
    output_dir: &Path,
    artifacts: &[Artifact],
    options: &ArchiveOptions,
) -> Result<DeliverySummary, DeliverError> {
    if artifacts.is_empty() {
        return Err(DeliverError::Empty);
    }

    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let (path, archived) = if let [only] = artifacts {
        (writer.write(&only.output_name, &only.bytes)?, false)
    } else {
        let archive = build_archive(artifacts, &options.folder_name)?;
        (writer.write(&options.archive_filename, &archive)?, true)
    };

    let manifest_path = if let Some(name) = &options.manifest_filename {
        let manifest = json!({
            "created_utc": options.created_utc,
            "entry_count": artifacts.len(),
            "archived": archived,
            "entries": artifacts.iter().map(|artifact| {
                json!({
                    "name": artifact.output_name,
                    "mime": artifact.mime,
                    "bytes": artifact.byte_len(),
                })
            }).collect::<Vec<_>>(),
        });
        Some(writer.write(name, manifest.to_string().as_bytes())?)
    } else {
        None
    };

    Ok(DeliverySummary {
        path,
        entries: artifacts.len(),
        archived,
        manifest_path,
    })
}
