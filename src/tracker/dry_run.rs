//! Tracker that performs nothing remotely

use tracing::info;

use super::{IssueCreator, IssueSummary, SearchQuery, Tracker, TrackerError};

/// Mints sequential `DRY-n` keys and logs the calls it would have made
#[derive(Debug, Default)]
pub struct DryRunTracker {
    next: u32,
}

impl DryRunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn mint(&mut self) -> String {
        self.next += 1;
        format!("DRY-{}", self.next)
    }
}

impl IssueCreator for DryRunTracker {
    fn create_epic(
        &mut self,
        project: &str,
        summary: &str,
        _description: &str,
    ) -> Result<String, TrackerError> {
        let key = self.mint();
        info!(%project, %key, %summary, "dry-run: would create epic");
        Ok(key)
    }

    fn create_story(
        &mut self,
        project: &str,
        summary: &str,
        _description: &str,
        parent_key: &str,
    ) -> Result<String, TrackerError> {
        let key = self.mint();
        info!(%project, %key, %parent_key, %summary, "dry-run: would create story");
        Ok(key)
    }
}

impl Tracker for DryRunTracker {
    fn post_comment(&mut self, key: &str, text: &str) -> Result<(), TrackerError> {
        info!(%key, chars = text.len(), "dry-run: would post comment");
        Ok(())
    }

    fn add_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError> {
        info!(%key, %label, "dry-run: would add label");
        Ok(())
    }

    fn remove_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError> {
        info!(%key, %label, "dry-run: would remove label");
        Ok(())
    }

    fn assign(&mut self, key: &str, account_id: &str) -> Result<(), TrackerError> {
        info!(%key, %account_id, "dry-run: would assign");
        Ok(())
    }

    fn transition(&mut self, key: &str, status: &str) -> Result<(), TrackerError> {
        info!(%key, %status, "dry-run: would transition");
        Ok(())
    }

    fn labels(&mut self, _key: &str) -> Result<Vec<String>, TrackerError> {
        Ok(Vec::new())
    }

    fn search(&mut self, _query: &SearchQuery) -> Result<Vec<IssueSummary>, TrackerError> {
        Ok(Vec::new())
    }
}
