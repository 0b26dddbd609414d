//! `intake run`

use std::process::ExitCode;

use anyhow::Result;
use tracing::debug;

use super::app::TicketArgs;
use super::output::Output;
use super::tracker_cmd::open_tracker;
use crate::domain::DirectKeyPolicy;
use crate::intake::{fail_open, IntakeSummary, IntakeWorkflow, SourceTicket};
use crate::storage::Workspace;

pub fn run(
    output: &Output,
    args: &TicketArgs,
    initiator: Option<String>,
    dry_run: bool,
) -> Result<ExitCode> {
    let ticket = SourceTicket::new(&args.ticket)
        .with_initiator(initiator)
        .with_context_id(args.context_id.clone());

    let summary = match execute(&ticket, dry_run) {
        Ok(summary) => summary,
        Err(e) => IntakeSummary::failed(format!("{:#}", e)),
    };

    print_summary(output, &summary, dry_run);

    Ok(if summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Opens the workspace and tracker, then runs the workflow
fn execute(ticket: &SourceTicket, dry_run: bool) -> Result<IntakeSummary> {
    let workspace = Workspace::open_current()?;
    let settings = workspace.settings();
    let mut tracker = open_tracker(&workspace, dry_run)?;
    let texts = workspace.texts();

    let known_keys = match settings.placeholders.direct_keys {
        DirectKeyPolicy::RequireKnown => {
            let store = workspace.snapshot_store(&ticket.key);
            debug!("Seeding known keys from {}", store.epics_path().display());
            fail_open("read snapshot", || store.known_epic_keys()).unwrap_or_default()
        }
        DirectKeyPolicy::PassThrough => Vec::new(),
    };

    let summary = IntakeWorkflow::new(settings, &texts)
        .with_known_keys(known_keys)
        .run(ticket, tracker.as_mut());

    Ok(summary)
}

fn print_summary(output: &Output, summary: &IntakeSummary, dry_run: bool) {
    if output.is_json() {
        output.data(summary);
        return;
    }

    if dry_run {
        if let Some(report) = &summary.report {
            println!("{}", report);
            output.blank();
        }
    } else {
        for outcome in &summary.outcomes {
            match (outcome.key(), outcome.error()) {
                (Some(key), _) => println!("{:<12} {:<6} {}", key, outcome.kind().label(), outcome.summary()),
                (None, error) => println!(
                    "{:<12} {:<6} {} ({})",
                    "FAILED",
                    outcome.kind().label(),
                    outcome.summary(),
                    error.unwrap_or("unknown error")
                ),
            }
        }
    }

    match (&summary.message, &summary.error) {
        (Some(message), _) => output.success(message),
        (None, Some(error)) => output.error(error),
        (None, None) => {}
    }
}
