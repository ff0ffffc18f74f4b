//! Client-side workflow for the climate risk form: validation against the
//! option catalogs, the analyze submission with cosmetic progress, report
//! view modelling and the official dispatch action.

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod loader;
pub mod report_view;
pub mod submission;
pub mod transport;
pub mod validator;

pub use dispatch::{DispatchController, DispatchOutcome, DispatchState};
pub use submission::{SubmissionController, SubmissionPhase, WorkflowUpdate};
pub use transport::{AlertApi, AnalysisApi, HttpRiskService};
