use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use engine_logging::{engine_info, engine_warn};
use mediapress_core::{ArtifactMeta, DeliveryReport, Effect, JobId, Msg};
use mediapress_engine::{
    deliver_outputs, derived_name, unique_names, ArchiveOptions, Artifact, Encoder, EngineConfig,
    EngineEvent, EngineEvents, EngineHandle, MediaKind, ProgressMode, SourceFile, WebmEncoder,
    WebpEncoder,
};

pub fn engine_kind(kind: mediapress_core::MediaKind) -> MediaKind {
    match kind {
        mediapress_core::MediaKind::Image => MediaKind::Image,
        mediapress_core::MediaKind::Video => MediaKind::Video,
    }
}

pub struct RunnerSettings {
    pub output_dir: PathBuf,
    pub workers: usize,
    pub smooth_progress: bool,
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub manifest: bool,
}

/// Executes core effects against the engine and pumps engine events back as
/// core messages. Also owns the artifact store: the bytes of every
/// successful conversion, keyed by job id, backing delivery.
pub struct EffectRunner {
    engine: EngineHandle,
    encoder: Arc<dyn Encoder>,
    artifacts: Arc<Mutex<BTreeMap<JobId, Artifact>>>,
    msg_tx: mpsc::Sender<Msg>,
    kind: MediaKind,
    output_dir: PathBuf,
    manifest: bool,
}

impl EffectRunner {
    pub fn new(msg_tx: mpsc::Sender<Msg>, kind: MediaKind, settings: RunnerSettings) -> Self {
        let encoder: Arc<dyn Encoder> = match kind {
            MediaKind::Image => Arc::new(WebpEncoder::new()),
            MediaKind::Video => {
                let ffmpeg = settings
                    .ffmpeg
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("ffmpeg"));
                let ffprobe = settings
                    .ffprobe
                    .clone()
                    .unwrap_or_else(|| PathBuf::from("ffprobe"));
                Arc::new(WebmEncoder::with_binaries(ffmpeg, ffprobe))
            }
        };
        let config = EngineConfig {
            workers: settings.workers,
            progress: if settings.smooth_progress {
                ProgressMode::Smoothed {
                    steps: 10,
                    interval: Duration::from_millis(50),
                }
            } else {
                ProgressMode::Genuine
            },
        };
        let (engine, events) = EngineHandle::new(config, encoder.clone());
        let artifacts = Arc::new(Mutex::new(BTreeMap::new()));
        spawn_event_pump(events, msg_tx.clone(), artifacts.clone());
        Self {
            engine,
            encoder,
            artifacts,
            msg_tx,
            kind,
            output_dir: settings.output_dir,
            manifest: settings.manifest,
        }
    }

    /// Executes one update's worth of effects. Output names are assigned
    /// across the whole run, so duplicate stems stay distinguishable in the
    /// archive.
    pub fn run(&self, effects: Vec<Effect>) {
        let mut names = self.assign_names(&effects).into_iter();
        for effect in effects {
            match effect {
                Effect::StartBatch => {
                    if let Err(err) = self.encoder.verify() {
                        engine_warn!("conversion capability missing: {}", err);
                        let _ = self.msg_tx.send(Msg::BatchAborted {
                            reason: err.to_string(),
                        });
                        // No job of this kind could succeed; drop the
                        // enqueues that follow.
                        return;
                    }
                }
                Effect::EnqueueJob {
                    job_id,
                    source_name,
                    source,
                } => {
                    let output_name = names
                        .next()
                        .unwrap_or_else(|| derived_name(&source_name, self.kind));
                    engine_info!("job {}: {} -> {}", job_id, source_name, output_name);
                    self.engine.enqueue(
                        job_id,
                        SourceFile {
                            name: source_name,
                            path: source,
                        },
                        output_name,
                    );
                }
                Effect::Deliver { job_ids } => self.deliver(&job_ids),
                Effect::DiscardOutputs => {
                    self.artifacts.lock().expect("artifact store").clear();
                }
            }
        }
    }

    fn assign_names(&self, effects: &[Effect]) -> Vec<String> {
        let sources: Vec<(String, &Path)> = effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::EnqueueJob {
                    source_name,
                    source,
                    ..
                } => Some((source_name.clone(), source.as_path())),
                _ => None,
            })
            .collect();
        unique_names(&sources, self.kind)
    }

    fn deliver(&self, job_ids: &[JobId]) {
        let artifacts: Vec<Artifact> = {
            let store = self.artifacts.lock().expect("artifact store");
            job_ids
                .iter()
                .filter_map(|id| store.get(id).cloned())
                .collect()
        };
        let mut options = ArchiveOptions::for_kind(self.kind, Utc::now().to_rfc3339());
        if !self.manifest {
            options.manifest_filename = None;
        }
        let result = deliver_outputs(&self.output_dir, &artifacts, &options)
            .map(|summary| DeliveryReport {
                path: summary.path.display().to_string(),
                entries: summary.entries,
                archived: summary.archived,
            })
            .map_err(|err| err.to_string());
        let _ = self.msg_tx.send(Msg::DeliveryFinished { result });
    }
}

fn spawn_event_pump(
    events: EngineEvents,
    msg_tx: mpsc::Sender<Msg>,
    artifacts: Arc<Mutex<BTreeMap<JobId, Artifact>>>,
) {
    thread::spawn(move || loop {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(EngineEvent::Progress(progress)) => {
                let sent = msg_tx.send(Msg::JobProgress {
                    job_id: progress.job_id,
                    percent: progress.percent,
                });
                if sent.is_err() {
                    break;
                }
            }
            Ok(EngineEvent::JobCompleted { job_id, result }) => {
                let msg = match result {
                    Ok(artifact) => {
                        let meta = ArtifactMeta {
                            output_name: artifact.output_name.clone(),
                            mime: artifact.mime.to_string(),
                            byte_len: artifact.byte_len(),
                        };
                        artifacts
                            .lock()
                            .expect("artifact store")
                            .insert(job_id, artifact);
                        Msg::JobDone {
                            job_id,
                            result: Ok(meta),
                        }
                    }
                    Err(err) => Msg::JobDone {
                        job_id,
                        result: Err(err.to_string()),
                    },
                };
                if msg_tx.send(msg).is_err() {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    });
}
