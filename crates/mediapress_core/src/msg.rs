#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Files accepted at the intake boundary, plus how many were rejected
    /// there before ever becoming jobs.
    FilesAdded {
        files: Vec<crate::IncomingFile>,
        rejected: usize,
    },
    /// User removed a queued file from the list.
    FileRemoved { job_id: crate::JobId },
    /// User asked for the batch to be converted.
    ConvertClicked,
    /// Engine progress for a job.
    JobProgress { job_id: crate::JobId, percent: u8 },
    /// Engine completion for a job.
    JobDone {
        job_id: crate::JobId,
        result: Result<crate::ArtifactMeta, String>,
    },
    /// The engine refused the whole batch before any job was attempted.
    BatchAborted { reason: String },
    /// User asked for the converted output(s).
    DownloadClicked,
    /// The effect runner finished (or failed) writing the requested output.
    DeliveryFinished {
        result: Result<crate::DeliveryReport, String>,
    },
    /// User discarded the whole batch.
    ResetClicked,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
