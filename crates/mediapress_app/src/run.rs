use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context};
use engine_logging::{engine_info, engine_warn};
use mediapress_core::{
    update, Batch, BatchPhase, DownloadAffordance, IncomingFile, MediaKind, Msg,
};
use mediapress_engine::screen_files;

use crate::cli::ConvertArgs;
use crate::effects::{engine_kind, EffectRunner, RunnerSettings};
use crate::{logging, render};

pub fn run(kind: MediaKind, files: Vec<PathBuf>, args: ConvertArgs) -> anyhow::Result<()> {
    logging::initialize(args.log.into());
    mediapress_engine::ensure_output_dir(&args.output_dir).context("output directory")?;

    let (accepted, rejected) = screen_files(&files, engine_kind(kind));
    for rejection in &rejected {
        engine_warn!("skipping {}: {}", rejection.path.display(), rejection.reason);
        eprintln!("skipping {}: {}", rejection.path.display(), rejection.reason);
    }
    engine_info!(
        "starting {} batch: {} file(s), {} rejected",
        kind.noun(),
        accepted.len(),
        rejected.len()
    );

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(
        msg_tx.clone(),
        engine_kind(kind),
        RunnerSettings {
            output_dir: args.output_dir,
            workers: args.workers,
            smooth_progress: args.smooth_progress,
            ffmpeg: args.ffmpeg,
            ffprobe: args.ffprobe,
            manifest: !args.no_manifest,
        },
    );

    // Background tick to coalesce rendering.
    let tick_tx = msg_tx.clone();
    thread::spawn(move || {
        let interval = Duration::from_millis(75);
        while tick_tx.send(Msg::Tick).is_ok() {
            thread::sleep(interval);
        }
    });

    let incoming: Vec<IncomingFile> = accepted
        .into_iter()
        .map(|file| IncomingFile {
            name: file.name,
            path: file.path,
        })
        .collect();
    msg_tx.send(Msg::FilesAdded {
        files: incoming,
        rejected: rejected.len(),
    })?;
    msg_tx.send(Msg::ConvertClicked)?;

    let mut state = Batch::new(kind);
    let mut download_requested = false;
    let mut outcome = Ok(());
    while let Ok(msg) = msg_rx.recv() {
        let is_tick = matches!(msg, Msg::Tick);
        let was_convert = matches!(msg, Msg::ConvertClicked);
        let was_abort = matches!(msg, Msg::BatchAborted { .. });
        let was_delivery = matches!(msg, Msg::DeliveryFinished { .. });

        dispatch(&mut state, msg, &runner);
        if is_tick && state.consume_dirty() {
            render::render(&state.view());
        }

        let view = state.view();
        if was_abort {
            outcome = Err(anyhow!(view.status.clone()));
            break;
        }
        if was_convert && view.phase != BatchPhase::Running {
            // Nothing was queued; the status line already says so.
            break;
        }
        if was_delivery {
            if view.delivery.is_none() {
                outcome = Err(anyhow!(view.status.clone()));
            }
            break;
        }
        if view.phase == BatchPhase::Complete {
            match view.download {
                DownloadAffordance::None => {
                    outcome = Err(anyhow!(view.status.clone()));
                    break;
                }
                _ if !download_requested => {
                    download_requested = true;
                    msg_tx.send(Msg::DownloadClicked)?;
                }
                _ => {}
            }
        }
    }

    // Final render so the terminal shows the landed state.
    state.consume_dirty();
    render::render(&state.view());
    outcome
}

fn dispatch(state: &mut Batch, msg: Msg, runner: &EffectRunner) {
    let kind = state.kind();
    let current = std::mem::replace(state, Batch::new(kind));
    let (next, effects) = update(current, msg);
    *state = next;
    runner.run(effects);
}
