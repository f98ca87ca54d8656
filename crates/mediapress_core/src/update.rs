use crate::{Batch, BatchPhase, Effect, Msg};

/// Pure update function: applies a message to the batch and returns any
/// effects for the runner to execute.
pub fn update(mut batch: Batch, msg: Msg) -> (Batch, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesAdded { files, rejected } => {
            if batch.phase() == BatchPhase::Running {
                return (batch, Vec::new());
            }
            let added = batch.enqueue_files(files);
            batch.set_last_add(added, rejected);
            let noun = batch.kind().noun();
            let total = batch.job_count();
            let mut status = format!("Added {added} new {noun} file(s). Total: {total}.");
            if rejected > 0 {
                status.push_str(&format!(" Skipped {rejected} unsupported file(s)."));
            }
            batch.set_status(status);
            vec![Effect::DiscardOutputs]
        }
        Msg::FileRemoved { job_id } => {
            if batch.phase() != BatchPhase::Running {
                batch.remove_queued(job_id);
            }
            Vec::new()
        }
        Msg::ConvertClicked => {
            if batch.phase() == BatchPhase::Running {
                return (batch, Vec::new());
            }
            let queued = batch.queued_jobs();
            if queued.is_empty() {
                batch.set_status(format!(
                    "Please select {}s to convert!",
                    batch.kind().noun()
                ));
                return (batch, Vec::new());
            }
            batch.start_run(queued.len());
            batch.set_status(format!("Converting {}s...", batch.kind().noun()));
            let mut effects = Vec::with_capacity(queued.len() + 1);
            effects.push(Effect::StartBatch);
            for (job_id, source_name, source) in queued {
                effects.push(Effect::EnqueueJob {
                    job_id,
                    source_name,
                    source,
                });
            }
            effects
        }
        Msg::JobProgress { job_id, percent } => {
            batch.apply_progress(job_id, percent);
            Vec::new()
        }
        Msg::JobDone { job_id, result } => {
            let finished = batch.apply_done(job_id, result);
            if finished {
                batch.complete_run();
                batch.set_status(aggregate_status(&batch));
            }
            Vec::new()
        }
        Msg::BatchAborted { reason } => {
            batch.abort_run(&reason);
            Vec::new()
        }
        Msg::DownloadClicked => {
            if batch.phase() != BatchPhase::Complete || batch.ready_count() == 0 {
                return (batch, Vec::new());
            }
            if batch.ready_count() > 1 {
                batch.set_status("Creating ZIP...");
            } else {
                batch.set_status("Saving file...");
            }
            vec![Effect::Deliver {
                job_ids: batch.ready_ids(),
            }]
        }
        Msg::DeliveryFinished { result } => {
            match result {
                Ok(report) => {
                    if report.archived {
                        batch.set_status(format!("ZIP file ready: {}", report.path));
                    } else {
                        batch.set_status(format!("Saved {}", report.path));
                    }
                    batch.record_delivery(report);
                }
                Err(reason) => {
                    batch.set_status(format!("Download failed: {reason}"));
                }
            }
            Vec::new()
        }
        Msg::ResetClicked => {
            batch.clear();
            vec![Effect::DiscardOutputs]
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (batch, effects)
}

fn aggregate_status(batch: &Batch) -> String {
    let succeeded = batch.ready_count();
    let attempted = batch.run_total();
    let noun = batch.kind().noun();
    if succeeded == 0 {
        format!("Conversion failed - no {noun}s were converted.")
    } else if succeeded < attempted {
        format!("Converted {succeeded} of {attempted} {noun}(s) - download what succeeded.")
    } else if succeeded > 1 {
        "Conversion successful! Download all files as a ZIP.".to_string()
    } else {
        "Conversion successful!".to_string()
    }
}
