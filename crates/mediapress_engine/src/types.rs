use std::path::PathBuf;

use bytes::Bytes;

pub type JobId = u64;

/// Which converter variant is active. Mirrors the core's enum; the app maps
/// between the two at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn target_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "webp",
            MediaKind::Video => "webm",
        }
    }

    pub fn target_mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/webp",
            MediaKind::Video => "video/webm",
        }
    }

    pub fn archive_folder(&self) -> &'static str {
        match self {
            MediaKind::Image => "Converted_WebP_Images",
            MediaKind::Video => "Converted_WebM_Videos",
        }
    }

    pub fn archive_filename(&self) -> &'static str {
        match self {
            MediaKind::Image => "Converted_Images.zip",
            MediaKind::Video => "Converted_Videos.zip",
        }
    }
}

/// One input file as it enters the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Reading,
    Decoding,
    Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    pub job_id: JobId,
    pub stage: Stage,
    pub percent: u8,
}

/// Output bytes plus the metadata the delivery boundary needs. An encoder
/// either returns a whole artifact or an error, never partial bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub output_name: String,
    pub mime: &'static str,
    pub bytes: Bytes,
}

impl Artifact {
    pub fn byte_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Progress(JobProgress),
    JobCompleted {
        job_id: JobId,
        result: Result<Artifact, ConversionError>,
    },
}

/// Per-job failure. Recovered locally by the orchestrator; the batch always
/// moves on to the next job.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("source unreadable: {0}")]
    Unreadable(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("cancelled before completion")]
    Cancelled,
}

/// Structural capability failure: no job of this kind could possibly
/// succeed, so the whole run is refused before any job starts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapabilityError {
    #[error("{tool} not found on PATH")]
    ToolMissing { tool: String },
    #[error("no WebM-capable encoder available (tried libvpx-vp9, libvpx)")]
    NoWebmCodec,
}
