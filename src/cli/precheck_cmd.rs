//! `intake precheck` and `intake snapshot`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Result};

use super::app::TicketArgs;
use super::output::Output;
use super::tracker_cmd::open_tracker;
use crate::intake::{self, PreCheckDecision, SourceTicket};
use crate::storage::{SnapshotStore, Workspace};

/// Exit code telling the caller to stop processing the ticket
pub const SKIP_EXIT_CODE: u8 = 3;

pub fn precheck(output: &Output, args: &TicketArgs) -> Result<ExitCode> {
    let ticket = SourceTicket::new(&args.ticket).with_context_id(args.context_id.clone());
    let workspace = Workspace::open_current()?;
    let mut tracker = open_tracker(&workspace, false)?;
    let store = workspace.snapshot_store(&ticket.key);

    let decision = intake::precheck(&ticket, workspace.settings(), tracker.as_mut(), &store);

    if output.is_json() {
        output.data(&decision);
    }

    match decision {
        PreCheckDecision::Proceed => {
            if !output.is_json() {
                output.success(&format!("{} is ready for intake", ticket.key));
            }
            Ok(ExitCode::SUCCESS)
        }
        PreCheckDecision::Skip { wip_label } => {
            if !output.is_json() {
                println!("Skipping {}: it carries the {} label", ticket.key, wip_label);
            }
            Ok(ExitCode::from(SKIP_EXIT_CODE))
        }
    }
}

pub fn snapshot(output: &Output, args: &TicketArgs, out: Option<PathBuf>) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let settings = workspace.settings();
    let project = settings
        .project_key(&args.ticket)
        .ok_or_else(|| anyhow!("Cannot derive a project key from ticket \"{}\"", args.ticket))?;
    let store = match out {
        Some(dir) => SnapshotStore::new(dir),
        None => workspace.snapshot_store(args.ticket.trim()),
    };
    let mut tracker = open_tracker(&workspace, false)?;

    let summary = intake::take_snapshot(&project, settings, tracker.as_mut(), &store);

    if output.is_json() {
        output.data(&summary);
    } else {
        let describe = |count: Option<usize>| match count {
            Some(n) => n.to_string(),
            None => "failed".to_string(),
        };
        println!("Snapshot of {} written to {}", project, summary.dir.display());
        println!("  epics:   {}", describe(summary.epics));
        println!("  stories: {}", describe(summary.stories));
    }

    Ok(if summary.epics.is_some() && summary.stories.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
