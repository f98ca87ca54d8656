use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use bytes::Bytes;
use engine_logging::engine_debug;
use image::{GenericImageView, ImageFormat};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    Artifact, CapabilityError, ConversionError, EngineEvent, JobId, JobProgress, MediaKind,
    SourceFile, Stage,
};

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// The conversion capability. `verify` is the structural support probe run
/// once before any job of a batch starts; `encode` turns one source file
/// into one whole artifact or an error, never partial bytes.
#[async_trait]
pub trait Encoder: Send + Sync {
    fn verify(&self) -> Result<(), CapabilityError>;

    async fn encode(
        &self,
        job_id: JobId,
        source: &SourceFile,
        output_name: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Artifact, ConversionError>;
}

fn progress(job_id: JobId, stage: Stage, percent: u8) -> EngineEvent {
    EngineEvent::Progress(JobProgress {
        job_id,
        stage,
        percent,
    })
}

/// Still-image re-encode: decode the input raster, re-encode to WebP with
/// pixel dimensions untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebpEncoder;

impl WebpEncoder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Encoder for WebpEncoder {
    fn verify(&self) -> Result<(), CapabilityError> {
        // Pure-Rust codec path, always available.
        Ok(())
    }

    async fn encode(
        &self,
        job_id: JobId,
        source: &SourceFile,
        output_name: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Artifact, ConversionError> {
        sink.emit(progress(job_id, Stage::Reading, 0));
        let data = tokio::fs::read(&source.path)
            .await
            .map_err(|err| ConversionError::Unreadable(err.to_string()))?;

        sink.emit(progress(job_id, Stage::Decoding, 25));
        let (encoded, width, height) =
            tokio::task::spawn_blocking(move || -> Result<(Vec<u8>, u32, u32), ConversionError> {
                let img = image::load_from_memory(&data)
                    .map_err(|err| ConversionError::Decode(err.to_string()))?;
                let (width, height) = img.dimensions();
                let mut out = Vec::new();
                img.write_to(&mut Cursor::new(&mut out), ImageFormat::WebP)
                    .map_err(|err| ConversionError::Encode(err.to_string()))?;
                Ok((out, width, height))
            })
            .await
            .map_err(|err| ConversionError::Encode(err.to_string()))??;

        engine_debug!(
            "job {}: re-encoded {} at {}x{} ({} bytes)",
            job_id,
            source.name,
            width,
            height,
            encoded.len()
        );
        sink.emit(progress(job_id, Stage::Encoding, 90));

        Ok(Artifact {
            output_name: output_name.to_string(),
            mime: MediaKind::Image.target_mime(),
            bytes: Bytes::from(encoded),
        })
    }
}

/// Video transcode: decode the input with the external `ffmpeg` binary and
/// re-encode to a WebM container. Real progress comes from ffmpeg's
/// `-progress` output measured against the `ffprobe` duration.
pub struct WebmEncoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    codec: OnceLock<&'static str>,
}

impl WebmEncoder {
    pub fn new() -> Self {
        Self::with_binaries(PathBuf::from("ffmpeg"), PathBuf::from("ffprobe"))
    }

    pub fn with_binaries(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            codec: OnceLock::new(),
        }
    }

    /// Picks the best WebM codec the installed ffmpeg offers, preferring
    /// VP9 over VP8. Cached after the first successful lookup.
    fn select_codec(&self) -> Result<&'static str, CapabilityError> {
        if let Some(codec) = self.codec.get() {
            return Ok(codec);
        }
        let tool_missing = |path: &PathBuf| CapabilityError::ToolMissing {
            tool: path.display().to_string(),
        };
        which::which(&self.ffmpeg).map_err(|_| tool_missing(&self.ffmpeg))?;
        which::which(&self.ffprobe).map_err(|_| tool_missing(&self.ffprobe))?;

        let listing = std::process::Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-encoders"])
            .output()
            .map_err(|_| tool_missing(&self.ffmpeg))?;
        let listing = String::from_utf8_lossy(&listing.stdout);
        let codec = if listing.contains("libvpx-vp9") {
            "libvpx-vp9"
        } else if listing.contains("libvpx") {
            "libvpx"
        } else {
            return Err(CapabilityError::NoWebmCodec);
        };
        let _ = self.codec.set(codec);
        Ok(codec)
    }

    async fn probe_duration_secs(&self, source: &SourceFile) -> Option<f64> {
        let output = tokio::process::Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(&source.path)
            .stdin(Stdio::null())
            .output()
            .await
            .ok()?;
        String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|secs| *secs > 0.0)
    }
}

#[async_trait]
impl Encoder for WebmEncoder {
    fn verify(&self) -> Result<(), CapabilityError> {
        self.select_codec().map(|_| ())
    }

    async fn encode(
        &self,
        job_id: JobId,
        source: &SourceFile,
        output_name: &str,
        sink: &dyn ProgressSink,
    ) -> Result<Artifact, ConversionError> {
        let codec = self
            .select_codec()
            .map_err(|err| ConversionError::Encode(err.to_string()))?;

        sink.emit(progress(job_id, Stage::Reading, 0));
        let duration = self.probe_duration_secs(source).await;

        let staging = tempfile::tempdir()
            .map_err(|err| ConversionError::Encode(err.to_string()))?;
        let out_path = staging.path().join("out.webm");

        let mut command = tokio::process::Command::new(&self.ffmpeg);
        command
            .args(["-hide_banner", "-nostats", "-loglevel", "error", "-y", "-i"])
            .arg(&source.path)
            .args(["-c:v", codec, "-b:v", "1M", "-c:a", "libopus"])
            .args(["-progress", "pipe:1"])
            .arg(&out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|err| ConversionError::Encode(err.to_string()))?;

        // The -progress stream reports the output timestamp; against the
        // probed duration that is genuine completion, not interpolation.
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            let mut last_percent = 0u8;
            while let Ok(Some(line)) = lines.next_line().await {
                let micros = line
                    .strip_prefix("out_time_us=")
                    .or_else(|| line.strip_prefix("out_time_ms="))
                    .and_then(|value| value.trim().parse::<f64>().ok());
                if let (Some(micros), Some(duration)) = (micros, duration) {
                    let percent = ((micros / 1_000_000.0) / duration * 100.0).clamp(0.0, 99.0);
                    let percent = percent as u8;
                    if percent > last_percent {
                        last_percent = percent;
                        sink.emit(progress(job_id, Stage::Encoding, percent));
                    }
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|err| ConversionError::Encode(err.to_string()))?;
        if !output.status.success() {
            let detail = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::Encode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                detail.trim()
            )));
        }

        let bytes = tokio::fs::read(&out_path)
            .await
            .map_err(|err| ConversionError::Encode(err.to_string()))?;
        engine_debug!(
            "job {}: transcoded {} with {} ({} bytes)",
            job_id,
            source.name,
            codec,
            bytes.len()
        );

        Ok(Artifact {
            output_name: output_name.to_string(),
            mime: MediaKind::Video.target_mime(),
            bytes: Bytes::from(bytes),
        })
    }
}
