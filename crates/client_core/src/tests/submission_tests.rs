use super::*;

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use shared::error::SELECT_FROM_LIST;
use tokio::sync::broadcast::error::TryRecvError;

use crate::loader::LOADER_CAPTIONS;

struct FakeAnalysis {
    delay: Duration,
    outcome: Result<RiskReport, AnalysisError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<AnalyzeRiskRequest>>,
}

impl FakeAnalysis {
    fn ok(delay: Duration, report: RiskReport) -> Arc<Self> {
        Self::with_outcome(delay, Ok(report))
    }

    fn failing(delay: Duration, err: AnalysisError) -> Arc<Self> {
        Self::with_outcome(delay, Err(err))
    }

    fn with_outcome(delay: Duration, outcome: Result<RiskReport, AnalysisError>) -> Arc<Self> {
        Arc::new(Self {
            delay,
            outcome,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisApi for FakeAnalysis {
    async fn analyze(&self, request: &AnalyzeRiskRequest) -> Result<RiskReport, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}

fn high_report() -> RiskReport {
    RiskReport {
        overall_severity: "High".into(),
        city: "karachi".into(),
        profession: "farmer".into(),
        official_dispatch: Some("Open cooling centres".into()),
        ..RiskReport::default()
    }
}

fn controller(api: Arc<FakeAnalysis>) -> SubmissionController {
    SubmissionController::new(api, TimingSettings::default())
}

fn fill(controller: &SubmissionController, city: &str) {
    controller.edit(Field::City, city);
    controller.edit(Field::Profession, "Farmer");
    controller.edit(Field::Concern, "Heatwave");
}

fn drain(rx: &mut broadcast::Receiver<WorkflowUpdate>) -> Vec<WorkflowUpdate> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(update) => out.push(update),
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return out,
            Err(TryRecvError::Lagged(_)) => panic!("update channel lagged"),
        }
    }
}

fn progress_of(updates: &[WorkflowUpdate]) -> Vec<u8> {
    updates
        .iter()
        .filter_map(|update| match update {
            WorkflowUpdate::Progress(value) => Some(*value),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn invalid_city_never_reaches_the_network() {
    let api = FakeAnalysis::ok(Duration::from_secs(1), high_report());
    let controller = controller(Arc::clone(&api));
    fill(&controller, "Atlantis");
    assert!(!controller.can_submit());

    let err = controller.submit().await.expect_err("atlantis is not listed");
    match err {
        SubmitError::Validation(err) => {
            assert_eq!(err.field, Field::City);
            assert_eq!(err.message, SELECT_FROM_LIST);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(api.calls(), 0);
    let state = controller.snapshot();
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert!(!state.loading.is_active());
    assert_eq!(state.form.error(Field::City), Some(SELECT_FROM_LIST));
    assert_eq!(controller.active_loader_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn successful_submission_commits_report_with_monotonic_progress() {
    let api = FakeAnalysis::ok(Duration::from_millis(3_200), high_report());
    let controller = controller(Arc::clone(&api));
    let mut updates = controller.subscribe();
    fill(&controller, "  Karachi ");

    let report = controller.submit().await.expect("submission");
    assert!(report.is_high_severity());

    let requests = api.requests.lock().expect("requests lock").clone();
    assert_eq!(
        requests,
        vec![AnalyzeRiskRequest {
            city: "karachi".into(),
            profession: "farmer".into(),
            concern: "heatwave".into(),
        }]
    );

    let updates = drain(&mut updates);
    assert_eq!(progress_of(&updates), vec![20, 50, 75, 90, 100]);
    let captions: Vec<_> = updates
        .iter()
        .filter_map(|update| match update {
            WorkflowUpdate::Caption(caption) => Some(*caption),
            _ => None,
        })
        .collect();
    assert_eq!(captions, LOADER_CAPTIONS.to_vec());
    assert_eq!(
        updates.last(),
        Some(&WorkflowUpdate::Phase(SubmissionPhase::Reporting))
    );

    let state = controller.snapshot();
    assert_eq!(state.phase, SubmissionPhase::Reporting);
    assert!(!state.loading.is_active());
    assert_eq!(state.loading.progress(), 100);
    assert!(state.report.is_some());
    assert_eq!(controller.active_loader_timers(), 0);
}

#[tokio::test(start_paused = true)]
async fn fast_response_is_not_overwritten_by_late_checkpoints() {
    let api = FakeAnalysis::ok(Duration::ZERO, high_report());
    let controller = controller(api);
    let mut updates = controller.subscribe();
    fill(&controller, "Lahore");

    controller.submit().await.expect("submission");
    tokio::time::sleep(Duration::from_secs(10)).await;

    let progress = progress_of(&drain(&mut updates));
    assert_eq!(progress, vec![20, 90, 100]);
    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(controller.snapshot().loading.progress(), 100);
}

#[tokio::test(start_paused = true)]
async fn failure_unwinds_loading_and_surfaces_fatal_error() {
    let api = FakeAnalysis::failing(
        Duration::from_millis(1_500),
        AnalysisError::Network("connection reset".into()),
    );
    let controller = controller(api);
    let mut updates = controller.subscribe();
    fill(&controller, "Quetta");

    let err = controller.submit().await.expect_err("network failure");
    assert!(err.is_fatal());
    assert_eq!(err.category(), shared::error::ErrorCategory::Network);

    let state = controller.snapshot();
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert!(!state.loading.is_active());
    assert_eq!(state.loading.progress(), 0);
    assert!(state.report.is_none());
    assert!(state
        .fatal_error
        .as_deref()
        .is_some_and(|message| message.contains("connection reset")));
    assert_eq!(state.form.value(Field::City), "Quetta");
    assert!(controller.can_submit());
    assert_eq!(controller.active_loader_timers(), 0);

    let updates = drain(&mut updates);
    assert!(updates
        .iter()
        .any(|update| matches!(update, WorkflowUpdate::Fatal(_))));

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(controller.snapshot().loading.phase_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn second_submit_while_loading_is_rejected() {
    let api = FakeAnalysis::ok(Duration::from_secs(2), high_report());
    let controller = controller(Arc::clone(&api));
    fill(&controller, "Multan");

    let (first, second) = tokio::join!(controller.submit(), async {
        tokio::task::yield_now().await;
        controller.submit().await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(SubmitError::InFlight)));
    assert_eq!(api.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_submission_returns_form_to_idle() {
    let api = FakeAnalysis::ok(Duration::from_secs(2), high_report());
    let controller = controller(Arc::clone(&api));
    let mut updates = controller.subscribe();
    fill(&controller, "Karachi");

    let cancelled = tokio::time::timeout(Duration::from_millis(100), controller.submit()).await;
    assert!(cancelled.is_err());

    let state = controller.snapshot();
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert!(!state.loading.is_active());
    assert!(state.fatal_error.is_none());
    assert!(controller.can_submit());
    assert_eq!(controller.active_loader_timers(), 0);
    assert_eq!(
        drain(&mut updates).last(),
        Some(&WorkflowUpdate::Phase(SubmissionPhase::Idle))
    );

    controller.submit().await.expect("resubmission");
    assert_eq!(controller.snapshot().phase, SubmissionPhase::Reporting);
    assert_eq!(api.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn loader_timer_is_released_across_repeated_submissions() {
    let api = FakeAnalysis::ok(Duration::from_millis(2_100), high_report());
    let controller = controller(api);
    fill(&controller, "Sukkur");

    for _ in 0..3 {
        controller.submit().await.expect("submission");
        assert_eq!(controller.active_loader_timers(), 0);
        controller.dismiss_report();
        assert_eq!(controller.snapshot().phase, SubmissionPhase::Idle);
    }
}

#[tokio::test(start_paused = true)]
async fn new_submission_discards_previous_report() {
    let api = FakeAnalysis::ok(Duration::from_millis(100), high_report());
    let controller = controller(api);
    fill(&controller, "Hyderabad");
    controller.submit().await.expect("first");
    assert!(controller.snapshot().report.is_some());

    let pending = controller.submit();
    tokio::pin!(pending);
    tokio::select! {
        biased;
        _ = &mut pending => panic!("should still be loading"),
        () = tokio::time::sleep(Duration::from_millis(10)) => {}
    }
    let state = controller.snapshot();
    assert_eq!(state.phase, SubmissionPhase::Loading);
    assert!(state.report.is_none());

    pending.await.expect("second");
    assert!(controller.snapshot().report.is_some());
}

#[test]
fn reducer_keeps_progress_monotonic_for_any_checkpoint_order() {
    let orders: [&[u8]; 4] = [&[50, 75, 90, 100], &[90, 50, 100, 75], &[100, 50], &[75, 20, 50, 90]];
    for order in orders {
        let mut state = WorkflowState::default();
        state.apply(WorkflowEvent::FieldEdited {
            field: Field::City,
            value: "Gwadar".into(),
        });
        assert!(matches!(
            state.apply(WorkflowEvent::SubmitRequested { initial_progress: 20 }),
            Transition::StartAnalysis(_)
        ));
        let mut last = state.loading.progress();
        for value in order {
            state.apply(WorkflowEvent::ProgressCheckpoint(*value));
            assert!(state.loading.progress() >= last, "regressed on {order:?}");
            last = state.loading.progress();
        }
    }
}

#[test]
fn reducer_ignores_late_events_outside_loading() {
    let mut state = WorkflowState::default();
    assert_eq!(
        state.apply(WorkflowEvent::ProgressCheckpoint(50)),
        Transition::Ignored
    );
    assert_eq!(state.apply(WorkflowEvent::CaptionTick), Transition::Ignored);
    assert_eq!(
        state.apply(WorkflowEvent::ReportCommitted(Arc::new(high_report()))),
        Transition::Ignored
    );
    assert_eq!(
        state.apply(WorkflowEvent::AnalysisFailed("late".into())),
        Transition::Ignored
    );
    assert_eq!(
        state.apply(WorkflowEvent::AnalysisAbandoned),
        Transition::Ignored
    );
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert!(state.report.is_none());
}

#[test]
fn reducer_blocks_and_restores_phase_on_invalid_city() {
    let mut state = WorkflowState::default();
    state.apply(WorkflowEvent::FieldEdited {
        field: Field::City,
        value: "Narnia".into(),
    });
    let transition = state.apply(WorkflowEvent::SubmitRequested { initial_progress: 20 });
    assert!(matches!(transition, Transition::Blocked(_)));
    assert_eq!(state.phase, SubmissionPhase::Idle);
    assert!(!state.loading.is_active());
    assert!(!state.can_submit());
}
