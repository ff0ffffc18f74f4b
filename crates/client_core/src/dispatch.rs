//! Secondary "send official dispatch" action bound to one report instance.

use std::sync::Arc;

use shared::{domain::RiskReport, protocol::SendAlertRequest};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{error::DispatchError, transport::AlertApi};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchState {
    #[default]
    Idle,
    Sending,
    Success,
    Error,
}

impl DispatchState {
    pub fn can_dispatch(self) -> bool {
        matches!(self, DispatchState::Idle | DispatchState::Error)
    }

    pub fn button_label(self) -> &'static str {
        match self {
            DispatchState::Idle => "Send Official Dispatch",
            DispatchState::Sending => "Sending Dispatch...",
            DispatchState::Success => "Dispatch Sent",
            DispatchState::Error => "Dispatch Failed - Retry",
        }
    }
}

#[derive(Debug)]
pub enum DispatchOutcome {
    Sent,
    Failed(DispatchError),
    /// The button was disabled; nothing was sent.
    Skipped(DispatchState),
    /// The report is not high severity or carries no official dispatch text.
    Unavailable,
}

/// Owns the dispatch state for a single report. Dropping the controller with
/// its report is the only way back to `Idle` after a success.
pub struct DispatchController {
    api: Arc<dyn AlertApi>,
    recipient_email: String,
    state: watch::Sender<DispatchState>,
}

impl DispatchController {
    pub fn new(api: Arc<dyn AlertApi>, recipient_email: impl Into<String>) -> Self {
        let (state, _) = watch::channel(DispatchState::Idle);
        Self {
            api,
            recipient_email: recipient_email.into(),
            state,
        }
    }

    pub fn state(&self) -> DispatchState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DispatchState> {
        self.state.subscribe()
    }

    pub async fn dispatch(&self, report: &RiskReport) -> DispatchOutcome {
        if !report.is_high_severity() || report.official_dispatch.is_none() {
            return DispatchOutcome::Unavailable;
        }

        let mut observed = DispatchState::Idle;
        let claimed = self.state.send_if_modified(|state| {
            observed = *state;
            if state.can_dispatch() {
                *state = DispatchState::Sending;
                true
            } else {
                false
            }
        });
        if !claimed {
            debug!(state = ?observed, "dispatch ignored while disabled");
            return DispatchOutcome::Skipped(observed);
        }

        let claim = SendingClaim {
            state: &self.state,
            restore: observed,
            armed: true,
        };
        let request = SendAlertRequest::for_report(report, self.recipient_email.clone());
        match self.api.send_alert(&request).await {
            Ok(()) => {
                claim.settle(DispatchState::Success);
                info!(recipient = %self.recipient_email, "official dispatch delivered");
                DispatchOutcome::Sent
            }
            Err(err) => {
                claim.settle(DispatchState::Error);
                warn!(error = %err, "official dispatch failed");
                DispatchOutcome::Failed(err)
            }
        }
    }
}

/// Marks `Sending` as owned by one in-flight call. If that call is dropped
/// before settling, the button returns to the state it was claimed from.
struct SendingClaim<'a> {
    state: &'a watch::Sender<DispatchState>,
    restore: DispatchState,
    armed: bool,
}

impl SendingClaim<'_> {
    fn settle(mut self, outcome: DispatchState) {
        self.armed = false;
        self.state.send_replace(outcome);
    }
}

impl Drop for SendingClaim<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let restore = self.restore;
        self.state.send_if_modified(|state| {
            if *state == DispatchState::Sending {
                *state = restore;
                true
            } else {
                false
            }
        });
        debug!(state = ?restore, "dispatch abandoned before completion");
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
