use mediapress_core::{BatchViewModel, JobPhase};

/// Prints the job table and the aggregate status line.
pub fn render(view: &BatchViewModel) {
    for job in &view.jobs {
        let detail = match &job.phase {
            JobPhase::Queued => "queued".to_string(),
            JobPhase::Converting { progress } => bar(*progress),
            JobPhase::Succeeded { output } => format!("done -> {}", output.output_name),
            JobPhase::Failed { reason } => format!("failed: {reason}"),
        };
        println!("  [{:>3}] {:<32} {}", job.job_id, job.source_name, detail);
    }
    if !view.status.is_empty() {
        println!("{}", view.status);
    }
}

fn bar(percent: u8) -> String {
    let filled = (percent as usize * 20) / 100;
    format!("[{:<20}] {percent:>3}%", "#".repeat(filled))
}
