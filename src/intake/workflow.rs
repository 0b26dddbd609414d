//! The intake run
//!
//! Reads the planner's output, creates the tickets, posts the report on the
//! source ticket and moves it along. Ticket creation failures end up in the
//! report; follow-up actions on the source ticket fail open. Anything else that
//! goes wrong aborts the run with a diagnostic comment.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use super::fail_open::fail_open;
use super::orchestrator::Orchestrator;
use super::report::ReportBuilder;
use crate::domain::{count_created, Outcome};
use crate::storage::{read_entries, read_narrative, IntakeConfig, LabelConfig, TextSource};
use crate::tracker::Tracker;

/// The ticket that requested the intake
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTicket {
    pub key: String,
    /// Account the ticket is handed back to
    pub initiator: Option<String>,
    /// Automation context; names the work-in-progress label
    pub context_id: Option<String>,
}

impl SourceTicket {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into().trim().to_string(),
            initiator: None,
            context_id: None,
        }
    }

    pub fn with_initiator(mut self, initiator: Option<String>) -> Self {
        self.initiator = non_blank(initiator);
        self
    }

    pub fn with_context_id(mut self, context_id: Option<String>) -> Self {
        self.context_id = non_blank(context_id);
        self
    }

    /// Work-in-progress label, if the ticket carries a context id
    pub fn wip_label(&self, labels: &LabelConfig) -> Option<String> {
        self.context_id.as_deref().map(|ctx| labels.wip_label(ctx))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Result of an intake run
#[derive(Debug, Clone, Serialize)]
pub struct IntakeSummary {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(rename = "results")]
    pub outcomes: Vec<Outcome>,

    /// Comment posted on the source ticket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
}

impl IntakeSummary {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            outcomes: Vec::new(),
            report: None,
        }
    }

    /// Number of tickets created
    pub fn created(&self) -> usize {
        count_created(&self.outcomes)
    }
}

/// Comment posted when a run aborts
pub fn error_comment(error: &str) -> String {
    format!(
        "*Intake Workflow Error:* {}. Please check server logs for details.",
        error
    )
}

/// One intake run against a configured workspace
pub struct IntakeWorkflow<'a> {
    config: &'a IntakeConfig,
    texts: &'a dyn TextSource,
    known_keys: Vec<String>,
}

impl<'a> IntakeWorkflow<'a> {
    pub fn new(config: &'a IntakeConfig, texts: &'a dyn TextSource) -> Self {
        Self {
            config,
            texts,
            known_keys: Vec::new(),
        }
    }

    /// Keys that exist in the tracker already (from the snapshot)
    pub fn with_known_keys(mut self, keys: Vec<String>) -> Self {
        self.known_keys = keys;
        self
    }

    /// Runs the intake; never returns an error
    pub fn run(&self, ticket: &SourceTicket, tracker: &mut dyn Tracker) -> IntakeSummary {
        info!("Processing intake ticket creation for: {}", ticket.key);

        match self.materialize(ticket, tracker) {
            Ok(summary) => summary,
            Err(e) => {
                let message = format!("{:#}", e);
                error!("Error in intake run: {}", message);

                if !ticket.key.is_empty() {
                    fail_open("post error comment", || {
                        tracker.post_comment(&ticket.key, &error_comment(&message))
                    });
                }

                IntakeSummary::failed(message)
            }
        }
    }

    fn materialize(
        &self,
        ticket: &SourceTicket,
        tracker: &mut dyn Tracker,
    ) -> Result<IntakeSummary> {
        let project = self.config.project_key(&ticket.key).ok_or_else(|| {
            anyhow!("Cannot derive a project key from ticket \"{}\"", ticket.key)
        })?;

        let entries = read_entries(self.texts, &self.config.paths.stories);

        let orchestrator = Orchestrator::new(project, self.config.orchestrator_options());
        let plan = orchestrator
            .plan(&entries)
            .context("Invalid entry list")?;

        let resolver = orchestrator
            .resolver()
            .with_known_keys(self.known_keys.iter().cloned());
        let outcomes = orchestrator.execute(&plan, &mut *tracker, self.texts, resolver);

        let narrative = read_narrative(self.texts, &self.config.paths.comment);
        let report = ReportBuilder::new(self.config.tracker.browse_url.clone())
            .build(&outcomes, &narrative);

        self.finish(ticket, &report, tracker);

        let message = format!(
            "Intake complete for {}: created {} ticket(s), moved to {}",
            ticket.key,
            count_created(&outcomes),
            self.config.statuses.done
        );
        info!("{}", message);

        Ok(IntakeSummary {
            success: true,
            message: Some(message),
            error: None,
            outcomes,
            report: Some(report),
        })
    }

    /// Follow-up actions on the source ticket
    fn finish(&self, ticket: &SourceTicket, report: &str, tracker: &mut dyn Tracker) {
        let key = ticket.key.as_str();
        let labels = &self.config.labels;

        if fail_open("post report", || tracker.post_comment(key, report)).is_some() {
            info!("Posted intake analysis comment to {}", key);
        }

        for label in [&labels.intake, &labels.generated] {
            fail_open("add label", || tracker.add_label(key, label));
        }

        match &ticket.initiator {
            Some(initiator) => {
                if fail_open("assign", || tracker.assign(key, initiator)).is_some() {
                    info!("Assigned {} to initiator", key);
                }
            }
            None => debug!("No initiator given; leaving assignee unchanged"),
        }

        let done = &self.config.statuses.done;
        if fail_open("transition", || tracker.transition(key, done)).is_some() {
            info!("Moved {} to {}", key, done);
        }

        if let Some(wip_label) = ticket.wip_label(labels) {
            if fail_open("remove WIP label", || tracker.remove_label(key, &wip_label)).is_some() {
                info!("Removed WIP label \"{}\" from {}", wip_label, key);
            }
        }
    }
}
