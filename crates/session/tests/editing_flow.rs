use std::sync::Arc;

use proptest::prelude::*;
use trimcrop_common::config::EditorDefaults;
use trimcrop_common::error::{TrimcropError, TrimcropResult};
use trimcrop_conversion::{JobOrchestrator, ScriptedEngine, ScriptedOutcome};
use trimcrop_editor_core::{Point, ReferenceFrame};
use trimcrop_session::{EditingSession, MediaResolver, SessionPhase};
use trimcrop_session_model::job::JobStatus;
use trimcrop_session_model::range::RangeBound;

struct PresentResolver;

impl MediaResolver for PresentResolver {
    fn file_exists(&self, _path: &str) -> bool {
        true
    }

    fn resolve_playable_url(&self, path: &str) -> TrimcropResult<String> {
        Ok(format!("file://{path}"))
    }
}

fn open_session(engine: Arc<ScriptedEngine>) -> EditingSession {
    let orchestrator = JobOrchestrator::new(engine, tokio::runtime::Handle::current());
    EditingSession::open(
        "/videos/clip.mp4",
        &PresentResolver,
        orchestrator,
        &EditorDefaults::default(),
    )
}

fn timeline() -> ReferenceFrame {
    ReferenceFrame::strip(0.0, 1200.0)
}

fn drag_handle(session: &mut EditingSession, which: RangeBound, from_x: f64, to_x: f64) {
    session
        .begin_range_drag(which, timeline(), Point::new(from_x, 0.0))
        .unwrap();
    session.update_drag(Point::new(to_x, 0.0)).unwrap();
    session.end_drag().unwrap();
}

#[tokio::test]
async fn trimmed_export_runs_to_success() {
    let engine = Arc::new(ScriptedEngine::new(
        vec![0.0, 10.0, 45.0, 80.0, 100.0],
        ScriptedOutcome::Output("/out.mp4".into()),
    ));
    let mut session = open_session(Arc::clone(&engine));
    session.on_media_loaded(120.0);
    assert_eq!(session.phase(), &SessionPhase::Ready);

    drag_handle(&mut session, RangeBound::Start, 0.0, 100.0);
    drag_handle(&mut session, RangeBound::End, 1200.0, 500.0);
    let range = session.view().range.unwrap();
    assert!((range.start - 10.0).abs() < 1e-9);
    assert!((range.end - 50.0).abs() < 1e-9);

    let request = session.export().unwrap();
    let json = serde_json::to_value(&request).unwrap();
    assert!((json["startTime"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert!((json["endTime"].as_f64().unwrap() - 50.0).abs() < 1e-9);
    assert!(json.get("crop").is_none());
    assert_eq!(json["targetSize"], 8);

    // Second export while the first is live
    assert!(matches!(session.export(), Err(TrimcropError::AlreadyRunning)));

    let mut progress = Vec::new();
    while let Some(status) = session.next_job_update().await {
        if let JobStatus::InProgress(p) = status {
            progress.push(p);
        }
        if status.is_terminal() {
            break;
        }
    }
    assert_eq!(progress, vec![0.0, 10.0, 45.0, 80.0, 100.0]);

    let view = session.view();
    assert_eq!(view.job, JobStatus::Succeeded("/out.mp4".into()));
    assert_eq!(view.progress, 100.0);
    assert!(!view.can_return);

    assert_eq!(session.take_export_success(), Some("/out.mp4".into()));
    assert_eq!(session.take_export_success(), None);
    assert_eq!(engine.calls(), 1);
    assert_eq!(engine.requests()[0], request);
}

#[tokio::test]
async fn end_handle_stops_at_min_span() {
    let engine = Arc::new(ScriptedEngine::new(vec![], ScriptedOutcome::Output("/o.mp4".into())));
    let mut session = open_session(engine);
    session.on_media_loaded(120.0);

    drag_handle(&mut session, RangeBound::End, 1200.0, 2.0);
    let range = session.view().range.unwrap();
    assert_eq!(range.start, 0.0);
    assert!((range.end - 0.5).abs() < 1e-9);
}

#[tokio::test]
async fn playback_loops_inside_range() {
    let engine = Arc::new(ScriptedEngine::new(vec![], ScriptedOutcome::Output("/o.mp4".into())));
    let mut session = open_session(engine);
    session.on_media_loaded(120.0);
    drag_handle(&mut session, RangeBound::Start, 0.0, 300.0);
    drag_handle(&mut session, RangeBound::End, 1200.0, 600.0);

    let outcome = session.toggle_play().unwrap();
    assert!(outcome.seek_to.is_none());
    assert_eq!(session.on_tick(45.0), None);
    assert_eq!(session.on_tick(60.0), Some(30.0));
    assert_eq!(session.seek(90.0).unwrap(), 30.0);
}

#[tokio::test]
async fn view_serializes_for_presentation() {
    let engine = Arc::new(ScriptedEngine::new(vec![], ScriptedOutcome::Output("/o.mp4".into())));
    let mut session = open_session(engine);
    session.on_media_loaded(42.0);

    let json = serde_json::to_value(session.view()).unwrap();
    assert_eq!(json["phase"]["state"], "ready");
    assert_eq!(json["duration"], 42.0);
    assert_eq!(json["job"]["state"], "idle");
    assert_eq!(json["cropMode"], false);
    assert_eq!(json["canReturn"], false);
}

proptest! {
    #[test]
    fn range_invariant_holds_across_drags(
        drags in proptest::collection::vec((any::<bool>(), -100.0f64..1400.0), 1..30)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _guard = runtime.enter();
        let engine = Arc::new(ScriptedEngine::new(vec![], ScriptedOutcome::Output("/o.mp4".into())));
        let mut session = open_session(engine);
        session.on_media_loaded(120.0);

        for (is_start, x) in drags {
            let which = if is_start { RangeBound::Start } else { RangeBound::End };
            session.begin_range_drag(which, timeline(), Point::new(x, 0.0)).unwrap();
            session.update_drag(Point::new(1200.0 - x, 0.0)).unwrap();
            let range = session.view().range.unwrap();
            prop_assert!(range.end - range.start >= 0.5 - 1e-9);
            prop_assert!(range.start >= 0.0 && range.end <= 120.0);
            session.end_drag().unwrap();
        }
    }
}
