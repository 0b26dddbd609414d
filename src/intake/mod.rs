//! Intake algorithms and workflows
//!
//! - [`Orchestrator`] - two-pass creation of epics and stories
//! - [`ReportBuilder`] - the comment posted on the source ticket
//! - [`IntakeWorkflow`] - a full run against the tracker
//! - [`precheck`] / [`take_snapshot`] - work done before the planner runs

mod fail_open;
mod orchestrator;
mod precheck;
mod report;
mod snapshot;
mod workflow;

pub use fail_open::fail_open;
pub use orchestrator::{
    Orchestrator, OrchestratorOptions, Plan, PlanError, PlannedEpic, PlannedStory, DEFAULT_SUMMARY,
};
pub use precheck::{precheck, skip_comment, PreCheckDecision};
pub use report::{build_report, ReportBuilder};
pub use snapshot::{take_snapshot, SnapshotSummary};
pub use workflow::{error_comment, IntakeSummary, IntakeWorkflow, SourceTicket};
