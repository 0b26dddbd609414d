//! Pre-check before the planner runs
//!
//! A ticket carrying the work-in-progress label for the current context is
//! left alone. Otherwise the tracker snapshot is written for the planner.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::fail_open::fail_open;
use super::snapshot::take_snapshot;
use super::workflow::SourceTicket;
use crate::storage::{IntakeConfig, SnapshotStore};
use crate::tracker::Tracker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PreCheckDecision {
    Proceed,
    Skip { wip_label: String },
}

impl PreCheckDecision {
    pub fn should_proceed(&self) -> bool {
        matches!(self, PreCheckDecision::Proceed)
    }
}

/// Comment posted when a ticket is skipped
pub fn skip_comment(wip_label: &str) -> String {
    format!(
        "h3. *Processing Skipped*\n\n\
         This ticket has the *{}* label indicating work is in progress.\n\
         Processing will be skipped until the label is removed.\n\n\
         _Remove the label to allow automated processing._",
        wip_label
    )
}

pub fn precheck(
    ticket: &SourceTicket,
    config: &IntakeConfig,
    tracker: &mut dyn Tracker,
    store: &SnapshotStore,
) -> PreCheckDecision {
    match ticket.wip_label(&config.labels) {
        Some(wip_label) => {
            let labels = fail_open("fetch labels", || tracker.labels(&ticket.key)).unwrap_or_default();

            if labels.iter().any(|l| l == &wip_label) {
                info!("Ticket {} has WIP label \"{}\" - skipping", ticket.key, wip_label);
                fail_open("post skip comment", || {
                    tracker.post_comment(&ticket.key, &skip_comment(&wip_label))
                });
                return PreCheckDecision::Skip { wip_label };
            }
        }
        None => debug!("No context id, skipping WIP check"),
    }

    match config.project_key(&ticket.key) {
        Some(project) => {
            info!("Fetching existing {} issues for {}", project, ticket.key);
            take_snapshot(&project, config, tracker, store);
        }
        None => warn!("Cannot derive a project key from \"{}\"; no snapshot written", ticket.key),
    }

    PreCheckDecision::Proceed
}
