//! `intake validate`

use std::collections::HashSet;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::Output;
use crate::domain::Reference;
use crate::intake::{Orchestrator, Plan};
use crate::storage::Workspace;

/// How a story's parent will be resolved
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum ParentStatus {
    /// Placeholder declared by an epic in the same list
    Declared,
    /// Placeholder no epic declares; the story will fail
    Undeclared,
    /// Tracker key handed through
    Direct,
}

#[derive(Debug, Serialize)]
struct StoryCheck<'a> {
    index: usize,
    summary: &'a str,
    parent: &'a Reference,
    status: ParentStatus,
}

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    entries: usize,
    plan: &'a Plan,
    stories: Vec<StoryCheck<'a>>,
    undeclared: usize,
}

pub fn run(output: &Output) -> Result<ExitCode> {
    let workspace = Workspace::open_current()?;
    let settings = workspace.settings();
    let entries = workspace.entries();

    let orchestrator = Orchestrator::new("", settings.orchestrator_options());
    let plan = orchestrator.plan(&entries).with_context(|| {
        format!("Invalid entry list: {}", workspace.stories_path().display())
    })?;

    let declared: HashSet<&str> = plan.placeholders().collect();
    let stories: Vec<_> = plan
        .stories()
        .iter()
        .map(|story| StoryCheck {
            index: story.index,
            summary: &story.summary,
            parent: &story.parent,
            status: match &story.parent {
                Reference::Placeholder(id) if declared.contains(id.as_str()) => ParentStatus::Declared,
                Reference::Placeholder(_) => ParentStatus::Undeclared,
                Reference::DirectKey(_) => ParentStatus::Direct,
            },
        })
        .collect();
    let undeclared = stories
        .iter()
        .filter(|s| matches!(s.status, ParentStatus::Undeclared))
        .count();

    if output.is_json() {
        output.data(&ValidationReport {
            entries: entries.len(),
            plan: &plan,
            stories,
            undeclared,
        });
        return Ok(ExitCode::SUCCESS);
    }

    println!("Epics ({}):", plan.epics().len());
    for epic in plan.epics() {
        match &epic.temp_id {
            Some(id) => println!("  #{:<4} {} [{}]", epic.index, epic.summary, id),
            None => println!("  #{:<4} {}", epic.index, epic.summary),
        }
    }
    output.blank();

    println!("Stories ({}):", stories.len());
    for story in &stories {
        let parent = match story.status {
            ParentStatus::Declared => format!("placeholder {}", story.parent),
            ParentStatus::Undeclared => format!("placeholder {} (not declared by any epic)", story.parent),
            ParentStatus::Direct => format!("key {}", story.parent),
        };
        println!("  #{:<4} {} -> {}", story.index, story.summary, parent);
    }
    output.blank();

    if undeclared > 0 {
        println!(
            "{} story(ies) reference a placeholder no epic declares and will not be created",
            undeclared
        );
    }
    output.success(&format!("{} entries are valid", entries.len()));

    Ok(ExitCode::SUCCESS)
}
