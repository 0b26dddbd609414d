//! Report rendering
//!
//! The report is tracker wiki markup: the planner's narrative, a list of the
//! tickets that were created, the ones that were not, and a total.

use std::fmt::Write;

use crate::domain::{count_created, Outcome};

const HEADING: &str = "h3. *Created Tickets*";
const EMPTY_NOTE: &str = "_No tickets were created (stories.json was empty)._";
const ALL_FAILED_NOTE: &str = "_None of the planned tickets could be created._";
const FAILED_HEADING: &str = "*Failed to Create:*";

/// Renders outcomes into the comment posted on the source ticket
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    browse_url: Option<String>,
}

impl ReportBuilder {
    /// `browse_url` is prefixed to keys to link them, e.g.
    /// `https://tracker.example.com/browse/`
    pub fn new(browse_url: Option<String>) -> Self {
        let browse_url = browse_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        Self { browse_url }
    }

    pub fn browse_url(&self) -> Option<&str> {
        self.browse_url.as_deref()
    }

    pub fn build(&self, outcomes: &[Outcome], narrative: &str) -> String {
        let mut out = String::new();
        out.push_str(narrative);
        out.push_str("\n\n");
        out.push_str(HEADING);
        out.push_str("\n\n");

        let created = count_created(outcomes);

        if outcomes.is_empty() {
            out.push_str(EMPTY_NOTE);
            out.push('\n');
        } else if created == 0 {
            out.push_str(ALL_FAILED_NOTE);
            out.push('\n');
        }

        for outcome in outcomes.iter().filter(|o| o.is_success()) {
            self.push_created(&mut out, outcome);
        }

        let mut failures = outcomes.iter().filter(|o| !o.is_success()).peekable();
        if failures.peek().is_some() {
            out.push('\n');
            out.push_str(FAILED_HEADING);
            out.push('\n');
            for outcome in failures {
                let _ = writeln!(
                    out,
                    "* ({}) {} - Error: {}",
                    outcome.kind(),
                    outcome.summary(),
                    outcome.error().unwrap_or("Unknown error")
                );
            }
        }

        let _ = write!(out, "\n*Total Created:* {} ticket(s)", created);
        out
    }

    fn push_created(&self, out: &mut String, outcome: &Outcome) {
        let key = outcome.key().unwrap_or_default();
        let _ = match &self.browse_url {
            Some(url) => writeln!(
                out,
                "* [{key}|{url}{key}] ({}) - {}",
                outcome.kind(),
                outcome.summary()
            ),
            None => writeln!(out, "* {key} ({}) - {}", outcome.kind(), outcome.summary()),
        };
    }
}

/// Builds a report without links
pub fn build_report(outcomes: &[Outcome], narrative: &str) -> String {
    ReportBuilder::default().build(outcomes, narrative)
}
