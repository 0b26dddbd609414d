//! # Tracker Seam
//!
//! Everything intake does to the outside issue tracker goes through the traits
//! in this module. The core only needs [`IssueCreator`]; the surrounding
//! workflows use the wider [`Tracker`].
//!
//! ## Implementations
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`PluginTracker`] | Talks to an `intake-tracker-{name}` plugin binary |
//! | [`DryRunTracker`] | Mints `DRY-n` keys and performs nothing remotely |
//!
//! ## Plugin Protocol
//!
//! ```text
//! CLI                          Plugin Binary
//!  │                               │
//!  ├── Spawn: intake-tracker-jira  │
//!  │                               │
//!  ├── Stdin: {"operation": "create_issue", "params": {...}}
//!  │                               │
//!  └── Stdout: {"success": true, "data": {"key": "JD-12"}}
//! ```
//!
//! Every plugin must support `--manifest` to declare its capabilities.

mod dry_run;
mod loader;
mod plugin;
mod protocol;

#[cfg(test)]
pub(crate) mod recording;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ItemKind;

pub use dry_run::DryRunTracker;
pub use loader::{full_plugin_name, PluginInfo, PluginLoader, TRACKER_PLUGIN_PREFIX};
pub use plugin::{IssueTypes, PluginTracker};
pub use protocol::{PluginManifest, PluginRequest, PluginResponse, PluginType, TRACKER_OPERATIONS};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Tracker rejected {operation}: {message}")]
    Rejected { operation: String, message: String },

    #[error("Tracker response to {0} did not include an issue key")]
    MissingKey(String),

    #[error("Invalid tracker response to {operation}: {message}")]
    InvalidResponse { operation: String, message: String },

    #[error("Tracker plugin failed: {0}")]
    Plugin(String),
}

impl TrackerError {
    pub fn rejected(operation: impl Into<String>, message: impl Into<String>) -> Self {
        TrackerError::Rejected {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

/// Creates epics and stories; the only capability the core needs
pub trait IssueCreator {
    /// Creates an epic and returns its tracker key
    fn create_epic(
        &mut self,
        project: &str,
        summary: &str,
        description: &str,
    ) -> Result<String, TrackerError>;

    /// Creates a story under `parent_key` and returns its tracker key
    fn create_story(
        &mut self,
        project: &str,
        summary: &str,
        description: &str,
        parent_key: &str,
    ) -> Result<String, TrackerError>;
}

/// Full set of tracker operations used by the intake workflows
pub trait Tracker: IssueCreator {
    fn post_comment(&mut self, key: &str, text: &str) -> Result<(), TrackerError>;

    fn add_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError>;

    fn remove_label(&mut self, key: &str, label: &str) -> Result<(), TrackerError>;

    fn assign(&mut self, key: &str, account_id: &str) -> Result<(), TrackerError>;

    fn transition(&mut self, key: &str, status: &str) -> Result<(), TrackerError>;

    /// Labels currently on an issue
    fn labels(&mut self, key: &str) -> Result<Vec<String>, TrackerError>;

    /// Existing issues of one kind in a project, newest first
    fn search(&mut self, query: &SearchQuery) -> Result<Vec<IssueSummary>, TrackerError>;
}

/// Query for existing issues
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub project: String,
    pub kind: ItemKind,
    /// Keys to leave out of the result
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SearchQuery {
    pub fn new(project: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            project: project.into(),
            kind,
            exclude: Vec::new(),
        }
    }

    pub fn excluding(mut self, keys: impl IntoIterator<Item = String>) -> Self {
        self.exclude.extend(keys);
        self
    }
}

/// Flattened view of an existing tracker issue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    /// Free-form diagram payload some trackers attach to issues
    #[serde(default)]
    pub diagrams: Option<serde_json::Value>,

    /// Key of the parent issue
    #[serde(default)]
    pub parent: Option<String>,
}
