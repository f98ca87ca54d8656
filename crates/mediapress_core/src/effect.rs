use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Verify encoder capability and prepare the engine for a fresh run.
    StartBatch,
    /// Hand one queued job to the engine.
    EnqueueJob {
        job_id: crate::JobId,
        source_name: String,
        source: PathBuf,
    },
    /// Write the ready outputs to disk, as a single file or an archive.
    Deliver { job_ids: Vec<crate::JobId> },
    /// Drop any artifact bytes retained outside the core.
    DiscardOutputs,
}
