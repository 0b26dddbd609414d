//! In-memory tracker for tests

use std::collections::HashSet;

use super::{IssueCreator, IssueSummary, SearchQuery, Tracker, TrackerError};
use crate::domain::ItemKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateEpic { project: String, summary: String, description: String },
    CreateStory { project: String, summary: String, description: String, parent: String },
    Comment { key: String, text: String },
    AddLabel { key: String, label: String },
    RemoveLabel { key: String, label: String },
    Assign { key: String, account_id: String },
    Transition { key: String, status: String },
    Labels { key: String },
    Search { kind: ItemKind },
}

/// Records every call and answers with `EPIC-n` / `STORY-n` keys
#[derive(Debug, Default)]
pub struct RecordingTracker {
    pub calls: Vec<Call>,
    /// Every epic creation fails
    pub fail_all_epics: bool,
    /// Creations with these summaries fail
    pub fail_summaries: HashSet<String>,
    /// Non-creation operations (by protocol name) that fail
    pub fail_operations: HashSet<&'static str>,
    pub labels: Vec<String>,
    pub epics: Vec<IssueSummary>,
    pub stories: Vec<IssueSummary>,
    epic_seq: u32,
    story_seq: u32,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_epics() -> Self {
        Self {
            fail_all_epics: true,
            ..Self::default()
        }
    }

    pub fn fail_summary(mut self, summary: &str) -> Self {
        self.fail_summaries.insert(summary.to_string());
        self
    }

    pub fn fail_operation(mut self, operation: &'static str) -> Self {
        self.fail_operations.insert(operation);
        self
    }

    pub fn epic_creations(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::CreateEpic { .. }))
            .count()
    }

    pub fn story_creations(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::CreateStory { .. }))
            .count()
    }

    pub fn comments(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Comment { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn guard(&self, operation: &str) -> Result<(), TrackerError> {
        if self.fail_operations.contains(operation) {
            Err(TrackerError::rejected(operation, "simulated failure"))
        } else {
            Ok(())
        }
    }
}

impl IssueCreator for RecordingTracker {
    fn create_epic(
        &mut self,
        project: &str,
        summary: &str,
        description: &str,
    ) -> Result<String, TrackerError> {
        self.calls.push(Call::CreateEpic {
            project: project.to_string(),
            summary: summary.to_string(),
            description: description.to_string(),
        });

        if self.fail_all_epics || self.fail_summaries.contains(summary) {
            return Err(TrackerError::rejected("create_issue", "epic rejected"));
        }

        self.epic_seq += 1;
        Ok(format!("EPIC-{}", self.epic_seq))
    }

    fn create_story(
        &mut self,
        project: &str,
        summary: &str,
        description: &str,
        parent_key: &str,
    ) -> Result<String, TrackerError> {
        self.calls.push(Call::CreateStory {
            project: project.to_string(),
            summary: summary.to_string(),
            description: description.to_string(),
            parent: parent_key.to_string(),
        });

        if self.fail_summaries.contains(summary) {
            return Err(TrackerError::rejected("create_issue", "story rejected"));
        }

        self.story_seq += 1;
        Ok(format!("STORY-{}", self.story_seq))
    }
}

impl Tracker for RecordingTracker {
    fn post_comment(&mut self, key: &str, text: &str) -> Result<(), TrackerError> {
        self.calls.push(Call::Comment {
            key: key.to_string(),
            text: text.to_string(),
        });
        self.guard("comment")
    }

    fn add_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError> {
        self.calls.push(Call::AddLabel {
            key: key.to_string(),
            label: label.to_string(),
        });
        self.guard("add_label")
    }

    fn remove_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError> {
        self.calls.push(Call::RemoveLabel {
            key: key.to_string(),
            label: label.to_string(),
        });
        self.guard("remove_label")
    }

    fn assign(&mut self, key: &str, account_id: &str) -> Result<(), TrackerError> {
        self.calls.push(Call::Assign {
            key: key.to_string(),
            account_id: account_id.to_string(),
        });
        self.guard("assign")
    }

    fn transition(&mut self, key: &str, status: &str) -> Result<(), TrackerError> {
        self.calls.push(Call::Transition {
            key: key.to_string(),
            status: status.to_string(),
        });
        self.guard("transition")
    }

    fn labels(&mut self, key: &str) -> Result<Vec<String>, TrackerError> {
        self.calls.push(Call::Labels {
            key: key.to_string(),
        });
        self.guard("labels")?;
        Ok(self.labels.clone())
    }

    fn search(&mut self, query: &SearchQuery) -> Result<Vec<IssueSummary>, TrackerError> {
        self.calls.push(Call::Search { kind: query.kind });
        self.guard("search")?;

        let issues = match query.kind {
            ItemKind::Epic => &self.epics,
            ItemKind::Story => &self.stories,
        };
        Ok(issues
            .iter()
            .filter(|i| !query.exclude.contains(&i.key))
            .cloned()
            .collect())
    }
}
