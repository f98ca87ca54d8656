use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::encode::{ChannelProgressSink, Encoder, ProgressSink};
use crate::{ConversionError, EngineEvent, JobId, SourceFile};

/// How per-job progress is reported.
///
/// `Genuine` forwards only what the encoder actually observes. `Smoothed`
/// additionally interpolates synthetic ticks at a fixed cadence while the
/// encoder runs, capped below completion; purely a presentation choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressMode {
    Genuine,
    Smoothed { steps: u32, interval: Duration },
}

impl Default for ProgressMode {
    fn default() -> Self {
        ProgressMode::Genuine
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on conversions running at once. One worker reproduces
    /// strict sequential, insertion-order processing.
    pub workers: usize,
    pub progress: ProgressMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            progress: ProgressMode::default(),
        }
    }
}

enum EngineCommand {
    Enqueue {
        job_id: JobId,
        source: SourceFile,
        output_name: String,
    },
}

/// Command side of the engine. The engine owns a dedicated thread with a
/// tokio runtime; each enqueued job becomes a task gated by a semaphore so
/// at most `workers` conversions hold a decoding resource at a time.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    cancel: CancellationToken,
}

/// Event side of the engine, owned by whoever pumps events back into the
/// state machine.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<EngineEvent, mpsc::RecvTimeoutError> {
        self.event_rx.recv_timeout(timeout)
    }
}

impl EngineHandle {
    pub fn new(config: EngineConfig, encoder: Arc<dyn Encoder>) -> (Self, EngineEvents) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let semaphore = Arc::new(Semaphore::new(config.workers.max(1)));
        let token = cancel.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::Enqueue {
                        job_id,
                        source,
                        output_name,
                    } => {
                        // Claim the worker slot here, in enqueue order, so
                        // jobs start strictly FIFO however many workers run.
                        let permit =
                            match runtime.block_on(semaphore.clone().acquire_owned()) {
                                Ok(permit) => permit,
                                Err(_) => break,
                            };
                        let encoder = encoder.clone();
                        let token = token.clone();
                        let event_tx = event_tx.clone();
                        let progress = config.progress.clone();
                        runtime.spawn(async move {
                            let _permit = permit;
                            run_job(
                                encoder.as_ref(),
                                &progress,
                                token,
                                event_tx,
                                job_id,
                                source,
                                output_name,
                            )
                            .await;
                        });
                    }
                }
            }
            // Command senders are gone; let in-flight tasks drain before the
            // runtime goes away.
            runtime.shutdown_timeout(Duration::from_secs(60));
        });

        (Self { cmd_tx, cancel }, EngineEvents { event_rx })
    }

    pub fn enqueue(&self, job_id: JobId, source: SourceFile, output_name: impl Into<String>) {
        engine_debug!("enqueue job {} ({})", job_id, source.name);
        let _ = self.cmd_tx.send(EngineCommand::Enqueue {
            job_id,
            source,
            output_name: output_name.into(),
        });
    }

    /// Cooperative stop: jobs that have not started report back as
    /// cancelled, the one currently encoding is interrupted.
    pub fn stop(&self) {
        engine_info!("engine stop requested");
        self.cancel.cancel();
    }
}

async fn run_job(
    encoder: &dyn Encoder,
    progress: &ProgressMode,
    cancel: CancellationToken,
    event_tx: mpsc::Sender<EngineEvent>,
    job_id: JobId,
    source: SourceFile,
    output_name: String,
) {
    let result = if cancel.is_cancelled() {
        Err(ConversionError::Cancelled)
    } else {
        let sink = ChannelProgressSink::new(event_tx.clone());
        drive_encode(
            encoder,
            progress,
            &cancel,
            job_id,
            &source,
            &output_name,
            &sink,
        )
        .await
    };
    let _ = event_tx.send(EngineEvent::JobCompleted { job_id, result });
}

async fn drive_encode(
    encoder: &dyn Encoder,
    progress: &ProgressMode,
    cancel: &CancellationToken,
    job_id: JobId,
    source: &SourceFile,
    output_name: &str,
    sink: &dyn ProgressSink,
) -> Result<crate::Artifact, ConversionError> {
    let encode = encoder.encode(job_id, source, output_name, sink);
    tokio::pin!(encode);

    match progress {
        ProgressMode::Genuine => {
            tokio::select! {
                _ = cancel.cancelled() => Err(ConversionError::Cancelled),
                result = &mut encode => result,
            }
        }
        ProgressMode::Smoothed { steps, interval } => {
            let step = (95 / (*steps).max(1) as u8).max(1);
            let mut ticker = tokio::time::interval(*interval);
            let mut percent = 0u8;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(ConversionError::Cancelled),
                    result = &mut encode => return result,
                    _ = ticker.tick() => {
                        if percent < 95 {
                            percent = percent.saturating_add(step).min(95);
                            sink.emit(EngineEvent::Progress(crate::JobProgress {
                                job_id,
                                stage: crate::Stage::Encoding,
                                percent,
                            }));
                        }
                    }
                }
            }
        }
    }
}
