use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::view_model::{AddStats, BatchViewModel, DownloadAffordance, JobRowView};

pub type JobId = u64;

/// Which converter variant a batch feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn noun(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Running,
    Complete,
}

/// A file accepted at the intake boundary, ready to become a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub path: PathBuf,
}

/// Metadata of a successfully produced artifact. The bytes themselves stay
/// with the presentation layer's store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMeta {
    pub output_name: String,
    pub mime: String,
    pub byte_len: u64,
}

/// Job lifecycle. Artifact metadata and failure reason live inside the
/// terminal variants, so a job can never carry both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPhase {
    Queued,
    Converting { progress: u8 },
    Succeeded { output: ArtifactMeta },
    Failed { reason: String },
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Succeeded { .. } | JobPhase::Failed { .. })
    }

    pub fn progress(&self) -> u8 {
        match self {
            JobPhase::Queued => 0,
            JobPhase::Converting { progress } => *progress,
            JobPhase::Succeeded { .. } => 100,
            JobPhase::Failed { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub id: JobId,
    pub source_name: String,
    pub source: PathBuf,
    pub phase: JobPhase,
}

/// Outcome of a delivery request, reported back by the effect runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub path: String,
    pub entries: usize,
    pub archived: bool,
}

/// The ordered job collection and its aggregate state.
///
/// Jobs are keyed by ascending id in a `BTreeMap`, so iteration order is
/// insertion order. `ready` is the successful-outputs set backing the
/// download affordance; any add-files operation invalidates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    kind: MediaKind,
    phase: BatchPhase,
    jobs: BTreeMap<JobId, ConversionJob>,
    next_job_id: JobId,
    ready: Vec<JobId>,
    run_total: usize,
    status: String,
    last_add: Option<AddStats>,
    delivery: Option<DeliveryReport>,
    dirty: bool,
}

impl Batch {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            phase: BatchPhase::Idle,
            jobs: BTreeMap::new(),
            next_job_id: 1,
            ready: Vec::new(),
            run_total: 0,
            status: String::new(),
            last_add: None,
            delivery: None,
            dirty: false,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn view(&self) -> BatchViewModel {
        let jobs: Vec<JobRowView> = self
            .jobs
            .values()
            .map(|job| JobRowView {
                job_id: job.id,
                source_name: job.source_name.clone(),
                progress: job.phase.progress(),
                phase: job.phase.clone(),
            })
            .collect();

        let download = match self.ready.as_slice() {
            [] => DownloadAffordance::None,
            [only] => {
                let output_name = match self.jobs.get(only).map(|job| &job.phase) {
                    Some(JobPhase::Succeeded { output }) => output.output_name.clone(),
                    _ => String::new(),
                };
                DownloadAffordance::Single {
                    job_id: *only,
                    output_name,
                }
            }
            many => DownloadAffordance::Archive {
                entries: many.len(),
            },
        };

        BatchViewModel {
            kind: self.kind,
            phase: self.phase,
            job_count: self.jobs.len(),
            jobs,
            status: self.status.clone(),
            download,
            last_add: self.last_add.clone(),
            delivery: self.delivery.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        let was = self.dirty;
        self.dirty = false;
        was
    }

    pub(crate) fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
        self.dirty = true;
    }

    pub(crate) fn set_last_add(&mut self, added: usize, rejected: usize) {
        self.last_add = Some(AddStats { added, rejected });
        self.dirty = true;
    }

    /// Appends one Queued job per incoming file and invalidates the previous
    /// successful-outputs set.
    pub(crate) fn enqueue_files(&mut self, files: Vec<IncomingFile>) -> usize {
        let added = files.len();
        for file in files {
            let id = self.next_job_id;
            self.next_job_id += 1;
            self.jobs.insert(
                id,
                ConversionJob {
                    id,
                    source_name: file.name,
                    source: file.path,
                    phase: JobPhase::Queued,
                },
            );
        }
        self.ready.clear();
        self.delivery = None;
        self.dirty = true;
        added
    }

    /// Removes a job iff it is still Queued. Converting and terminal jobs
    /// are never removed.
    pub(crate) fn remove_queued(&mut self, job_id: JobId) -> bool {
        let removable = matches!(
            self.jobs.get(&job_id).map(|job| &job.phase),
            Some(JobPhase::Queued)
        );
        if removable {
            self.jobs.remove(&job_id);
            self.dirty = true;
        }
        removable
    }

    pub(crate) fn queued_jobs(&self) -> Vec<(JobId, String, PathBuf)> {
        self.jobs
            .values()
            .filter(|job| matches!(job.phase, JobPhase::Queued))
            .map(|job| (job.id, job.source_name.clone(), job.source.clone()))
            .collect()
    }

    pub(crate) fn start_run(&mut self, queued: usize) {
        self.phase = BatchPhase::Running;
        self.run_total = queued;
        self.delivery = None;
        self.dirty = true;
    }

    pub(crate) fn run_total(&self) -> usize {
        self.run_total
    }

    pub(crate) fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub(crate) fn ready_ids(&self) -> Vec<JobId> {
        self.ready.clone()
    }

    /// Progress only ever increases within one conversion attempt; stale or
    /// backwards ticks are dropped.
    pub(crate) fn apply_progress(&mut self, job_id: JobId, percent: u8) {
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return;
        };
        let percent = percent.min(100);
        match &job.phase {
            JobPhase::Queued => {
                job.phase = JobPhase::Converting { progress: percent };
                self.dirty = true;
            }
            JobPhase::Converting { progress } if percent > *progress => {
                job.phase = JobPhase::Converting { progress: percent };
                self.dirty = true;
            }
            _ => {}
        }
    }

    /// Lands a terminal result for a job. Returns true when this was the
    /// last in-flight job of a running batch.
    pub(crate) fn apply_done(
        &mut self,
        job_id: JobId,
        result: Result<ArtifactMeta, String>,
    ) -> bool {
        let Some(job) = self.jobs.get_mut(&job_id) else {
            return false;
        };
        if job.phase.is_terminal() {
            return false;
        }
        match result {
            Ok(output) => {
                job.phase = JobPhase::Succeeded { output };
                self.ready.push(job_id);
            }
            Err(reason) => {
                job.phase = JobPhase::Failed { reason };
            }
        }
        self.dirty = true;

        self.phase == BatchPhase::Running
            && !self
                .jobs
                .values()
                .any(|job| !job.phase.is_terminal())
    }

    pub(crate) fn complete_run(&mut self) {
        self.phase = BatchPhase::Complete;
        self.dirty = true;
    }

    /// The structural capability failure path: nothing was attempted, the
    /// batch returns to Idle with every job still Queued.
    pub(crate) fn abort_run(&mut self, reason: &str) -> bool {
        let untouched = !self
            .jobs
            .values()
            .any(|job| matches!(job.phase, JobPhase::Converting { .. }));
        if self.phase == BatchPhase::Running && untouched {
            self.phase = BatchPhase::Idle;
            self.run_total = 0;
            self.set_status(reason.to_string());
            true
        } else {
            false
        }
    }

    pub(crate) fn record_delivery(&mut self, report: DeliveryReport) {
        self.delivery = Some(report);
        self.dirty = true;
    }

    pub(crate) fn clear(&mut self) {
        let kind = self.kind;
        *self = Batch::new(kind);
        self.dirty = true;
    }
}
