//! Analyze-request workflow: form edits, submit gating, cosmetic progress,
//! report commit and fatal failure unwinding.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    domain::{Field, RiskReport},
    error::ValidationError,
    protocol::AnalyzeRiskRequest,
};
use tokio::{sync::broadcast, time::sleep};
use tracing::{debug, info, warn};

use crate::{
    config::TimingSettings,
    error::{AnalysisError, SubmitError},
    loader::{LoaderTicker, LoadingState, TimerGauge},
    transport::AnalysisApi,
    validator::FormState,
};

const UPDATE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Validating,
    Loading,
    Reporting,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub form: FormState,
    pub phase: SubmissionPhase,
    pub loading: LoadingState,
    pub report: Option<Arc<RiskReport>>,
    pub fatal_error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    FieldEdited { field: Field, value: String },
    SubmitRequested { initial_progress: u8 },
    ProgressCheckpoint(u8),
    CaptionTick,
    ReportCommitted(Arc<RiskReport>),
    AnalysisFailed(String),
    /// The caller stopped waiting before the analysis resolved.
    AnalysisAbandoned,
    ReportDismissed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied,
    Ignored,
    Blocked(ValidationError),
    StartAnalysis(AnalyzeRiskRequest),
}

impl WorkflowState {
    /// Applies one event. No I/O happens here; the returned transition tells
    /// the caller whether a network call should start.
    pub fn apply(&mut self, event: WorkflowEvent) -> Transition {
        match event {
            WorkflowEvent::FieldEdited { field, value } => {
                if self.phase == SubmissionPhase::Loading {
                    return Transition::Ignored;
                }
                self.form.edit(field, value);
                Transition::Applied
            }
            WorkflowEvent::SubmitRequested { initial_progress } => {
                if self.phase == SubmissionPhase::Loading {
                    return Transition::Ignored;
                }
                let resume = self.phase;
                self.phase = SubmissionPhase::Validating;
                if let Err(err) = self.form.check_submittable() {
                    self.phase = resume;
                    return Transition::Blocked(err);
                }
                self.phase = SubmissionPhase::Loading;
                self.loading = LoadingState::begin(initial_progress);
                self.report = None;
                self.fatal_error = None;
                Transition::StartAnalysis(AnalyzeRiskRequest::normalized(self.form.fields()))
            }
            WorkflowEvent::ProgressCheckpoint(value) => {
                if self.phase == SubmissionPhase::Loading && self.loading.advance(value) {
                    Transition::Applied
                } else {
                    Transition::Ignored
                }
            }
            WorkflowEvent::CaptionTick => {
                if self.loading.tick() {
                    Transition::Applied
                } else {
                    Transition::Ignored
                }
            }
            WorkflowEvent::ReportCommitted(report) => {
                if self.phase != SubmissionPhase::Loading {
                    return Transition::Ignored;
                }
                self.loading.finish();
                self.report = Some(report);
                self.phase = SubmissionPhase::Reporting;
                Transition::Applied
            }
            WorkflowEvent::AnalysisFailed(message) => {
                if self.phase != SubmissionPhase::Loading {
                    return Transition::Ignored;
                }
                self.loading = LoadingState::default();
                self.report = None;
                self.fatal_error = Some(message);
                self.phase = SubmissionPhase::Idle;
                Transition::Applied
            }
            WorkflowEvent::AnalysisAbandoned => {
                if self.phase != SubmissionPhase::Loading {
                    return Transition::Ignored;
                }
                self.loading = LoadingState::default();
                self.report = None;
                self.phase = SubmissionPhase::Idle;
                Transition::Applied
            }
            WorkflowEvent::ReportDismissed => {
                if self.phase != SubmissionPhase::Reporting {
                    return Transition::Ignored;
                }
                self.report = None;
                self.phase = SubmissionPhase::Idle;
                Transition::Applied
            }
        }
    }

    /// Submit stays disabled while a field error persists or a request is out.
    pub fn can_submit(&self) -> bool {
        self.phase != SubmissionPhase::Loading && !self.form.has_errors()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowUpdate {
    Phase(SubmissionPhase),
    Progress(u8),
    Caption(&'static str),
    FieldError {
        field: Field,
        message: Option<String>,
    },
    Fatal(String),
}

#[derive(PartialEq, Eq)]
struct Observed {
    phase: SubmissionPhase,
    progress: u8,
    caption: Option<&'static str>,
    errors: Vec<(Field, String)>,
    fatal: Option<String>,
}

impl Observed {
    fn of(state: &WorkflowState) -> Self {
        Self {
            phase: state.phase,
            progress: state.loading.progress(),
            caption: state
                .loading
                .is_active()
                .then(|| state.loading.caption()),
            errors: state
                .form
                .errors()
                .map(|(field, message)| (field, message.to_string()))
                .collect(),
            fatal: state.fatal_error.clone(),
        }
    }

    fn diff(&self, after: &Observed) -> Vec<WorkflowUpdate> {
        let mut updates = Vec::new();
        for field in Field::ALL {
            let before = self.error(field);
            let now = after.error(field);
            if before != now {
                updates.push(WorkflowUpdate::FieldError {
                    field,
                    message: now.map(str::to_string),
                });
            }
        }
        if self.phase != after.phase {
            updates.push(WorkflowUpdate::Phase(after.phase));
        }
        if self.progress != after.progress && after.phase == SubmissionPhase::Loading {
            updates.push(WorkflowUpdate::Progress(after.progress));
        }
        if let Some(caption) = after.caption {
            if self.caption != after.caption {
                updates.push(WorkflowUpdate::Caption(caption));
            }
        }
        if let Some(fatal) = &after.fatal {
            if self.fatal.as_ref() != Some(fatal) {
                updates.push(WorkflowUpdate::Fatal(fatal.clone()));
            }
        }
        updates
    }

    fn error(&self, field: Field) -> Option<&str> {
        self.errors
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, message)| message.as_str())
    }
}

struct WorkflowStore {
    state: Mutex<WorkflowState>,
    updates: broadcast::Sender<WorkflowUpdate>,
}

impl WorkflowStore {
    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, event: WorkflowEvent) -> Transition {
        let mut state = self.lock();
        let before = Observed::of(&state);
        let transition = state.apply(event);
        let after = Observed::of(&state);
        drop(state);

        if before != after {
            for update in before.diff(&after) {
                // no subscribers is fine
                let _ = self.updates.send(update);
            }
        }
        transition
    }
}

/// Held by `submit` while it owns the `Loading` phase. Dropping it armed
/// (the submit future was cancelled) returns the workflow to `Idle`.
struct LoadingClaim {
    store: Arc<WorkflowStore>,
    armed: bool,
}

impl LoadingClaim {
    fn new(store: Arc<WorkflowStore>) -> Self {
        Self { store, armed: true }
    }

    fn settle(mut self, event: WorkflowEvent) -> Transition {
        self.armed = false;
        self.store.apply(event)
    }
}

impl Drop for LoadingClaim {
    fn drop(&mut self) {
        if self.armed && self.store.apply(WorkflowEvent::AnalysisAbandoned) == Transition::Applied
        {
            debug!("risk analysis abandoned before completion");
        }
    }
}

pub struct SubmissionController {
    api: Arc<dyn AnalysisApi>,
    timing: TimingSettings,
    store: Arc<WorkflowStore>,
    timers: TimerGauge,
}

impl SubmissionController {
    pub fn new(api: Arc<dyn AnalysisApi>, timing: TimingSettings) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            api,
            timing,
            store: Arc::new(WorkflowStore {
                state: Mutex::new(WorkflowState::default()),
                updates,
            }),
            timers: TimerGauge::default(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowUpdate> {
        self.store.updates.subscribe()
    }

    pub fn snapshot(&self) -> WorkflowState {
        self.store.lock().clone()
    }

    pub fn can_submit(&self) -> bool {
        self.store.lock().can_submit()
    }

    /// Caption timers still scheduled; zero whenever loading is inactive.
    pub fn active_loader_timers(&self) -> usize {
        self.timers.live()
    }

    pub fn edit(&self, field: Field, value: impl Into<String>) {
        self.store.apply(WorkflowEvent::FieldEdited {
            field,
            value: value.into(),
        });
    }

    pub fn dismiss_report(&self) {
        if self.store.apply(WorkflowEvent::ReportDismissed) == Transition::Applied {
            debug!("risk report dismissed");
        }
    }

    pub async fn submit(&self) -> Result<Arc<RiskReport>, SubmitError> {
        let request = match self.store.apply(WorkflowEvent::SubmitRequested {
            initial_progress: self.timing.initial_progress,
        }) {
            Transition::StartAnalysis(request) => request,
            Transition::Blocked(err) => {
                info!(field = %err.field, "submission blocked by validation");
                return Err(SubmitError::Validation(err));
            }
            Transition::Applied | Transition::Ignored => return Err(SubmitError::InFlight),
        };
        info!(
            city = %request.city,
            profession = %request.profession,
            concern = %request.concern,
            "risk analysis submitted"
        );
        let claim = LoadingClaim::new(Arc::clone(&self.store));

        let ticker = {
            let store = Arc::clone(&self.store);
            LoaderTicker::start(self.timing.caption_interval(), &self.timers, move || {
                store.apply(WorkflowEvent::CaptionTick);
            })
        };

        match self.await_analysis(&request).await {
            Ok(report) => {
                self.store.apply(WorkflowEvent::ProgressCheckpoint(
                    self.timing.near_complete_progress,
                ));
                self.store.apply(WorkflowEvent::ProgressCheckpoint(100));
                sleep(self.timing.settle_delay()).await;
                ticker.stop();

                let report = Arc::new(report);
                claim.settle(WorkflowEvent::ReportCommitted(Arc::clone(&report)));
                info!(severity = %report.overall_severity, "risk report committed");
                Ok(report)
            }
            Err(err) => {
                ticker.stop();
                claim.settle(WorkflowEvent::AnalysisFailed(err.to_string()));
                warn!(error = %err, "risk analysis failed");
                Err(SubmitError::Analysis(err))
            }
        }
    }

    async fn await_analysis(
        &self,
        request: &AnalyzeRiskRequest,
    ) -> Result<RiskReport, AnalysisError> {
        let call = self.api.analyze(request);
        tokio::pin!(call);
        let cosmetic = self.cosmetic_progress();
        tokio::pin!(cosmetic);
        let mut cosmetic_done = false;

        // Checkpoints run beside the call but never gate it; whatever is
        // still pending when the call resolves is dropped.
        loop {
            tokio::select! {
                biased;
                result = &mut call => return result,
                () = &mut cosmetic, if !cosmetic_done => cosmetic_done = true,
            }
        }
    }

    async fn cosmetic_progress(&self) {
        let started = tokio::time::Instant::now();
        for checkpoint in &self.timing.checkpoints {
            tokio::time::sleep_until(started + checkpoint.delay()).await;
            self.store
                .apply(WorkflowEvent::ProgressCheckpoint(checkpoint.progress));
        }
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
