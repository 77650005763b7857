pub mod check;
pub mod compress;
pub mod export;
pub mod probe;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use trimcrop_common::config::AppConfig;
use trimcrop_conversion::{FfmpegEngine, JobOrchestrator};
use trimcrop_session::{EditingSession, FsMediaResolver, SessionPhase};
use trimcrop_session_model::job::JobStatus;

/// Open a headless editing session on `input` with its duration loaded.
pub(crate) async fn open_session(config: &AppConfig, input: &Path) -> anyhow::Result<EditingSession> {
    let engine = Arc::new(FfmpegEngine::new(config.engine.clone()));
    let orchestrator = JobOrchestrator::new(engine.clone(), tokio::runtime::Handle::current());
    let mut session = EditingSession::open(
        &input.to_string_lossy(),
        &FsMediaResolver,
        orchestrator,
        &config.editor,
    );

    if session.phase() == &SessionPhase::Loading {
        match engine.probe(input).await {
            Ok(probe) => session.on_media_loaded(probe.duration_secs),
            Err(err) => session.on_media_error(&err.to_string()),
        }
    }

    if let SessionPhase::LoadFailed(message) = session.phase() {
        anyhow::bail!("{message}");
    }
    Ok(session)
}

/// Print progress until the session's job finishes; returns the output path.
pub(crate) async fn follow_job(session: &mut EditingSession) -> anyhow::Result<String> {
    let mut last_stage = String::new();
    while let Some(status) = session.next_job_update().await {
        let view = session.view();
        if view.stage != last_stage && !status.is_terminal() {
            tracing::debug!(stage = %view.stage, "stage changed");
            last_stage = view.stage.clone();
        }
        print!("\r  Progress: {:5.1}%  {:<24}", view.progress, view.stage);
        std::io::stdout().flush().ok();
        if status.is_terminal() {
            break;
        }
    }
    println!();

    if let Some(output) = session.take_export_success() {
        return Ok(output);
    }
    let view = session.view();
    match view.job {
        JobStatus::Failed(_) => anyhow::bail!(view.error.unwrap_or_else(|| view.stage.clone())),
        other => anyhow::bail!("conversion ended in unexpected state: {other:?}"),
    }
}
