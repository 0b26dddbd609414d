//! Workspace management
//!
//! Handles workspace initialization and provides access to its files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use super::config::{Config, IntakeConfig, WORKSPACE_DIR};
use super::entries::read_entries;
use super::snapshot::SnapshotStore;
use super::text::FsTextSource;
use crate::domain::Entry;

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("Not in an intake workspace. Run 'intake init' first.")]
    NotInWorkspace,
}

const DEFAULT_CONFIG: &str = r#"# intake configuration

# Summary used for entries whose summary is blank
default_summary = "Untitled"

[tracker]
# Resolved to the intake-tracker-<plugin> binary
plugin = "jira"
# Empty: use the prefix of the source ticket key
project = ""
# browse_url = "https://tracker.example.com/browse/"

[issue_types]
epic = "Epic"
story = "Story"

[labels]
intake = "ai_intake"
generated = "ai_generated"
wip_suffix = "_wip"

[statuses]
done = "Done"

[paths]
stories = "outputs/stories.json"
comment = "outputs/comment.md"
input_dir = "input"

[placeholders]
prefix = "temp"
# "reject" or "last_wins"
duplicates = "reject"
# "pass_through" or "require_known"
direct_keys = "pass_through"

[snapshot]
exclude_keys = []
"#;

const GITIGNORE: &str = r#"# Local plugin builds
plugins/*.cache
"#;

/// An intake workspace
pub struct Workspace {
    root: PathBuf,
    config: Config,
}

impl Workspace {
    /// Opens an existing workspace at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(WORKSPACE_DIR).is_dir() {
            return Err(WorkspaceError::NotInWorkspace.into());
        }

        let config = Config::for_workspace(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the workspace at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_workspace_root().ok_or(WorkspaceError::NotInWorkspace)?;

        Self::open(root)
    }

    /// Initializes a new workspace at the given path
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let intake_dir = root.join(WORKSPACE_DIR);

        let plugins_dir = intake_dir.join("plugins");
        fs::create_dir_all(&plugins_dir).with_context(|| {
            format!(
                "Failed to create plugins directory: {}",
                plugins_dir.display()
            )
        })?;

        let config_path = intake_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = intake_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Returns the workspace root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .intake directory path
    pub fn intake_dir(&self) -> PathBuf {
        self.root.join(WORKSPACE_DIR)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shorthand for the workspace-level settings
    pub fn settings(&self) -> &IntakeConfig {
        &self.config.intake
    }

    /// Returns the plugins directory
    pub fn plugins_dir(&self) -> PathBuf {
        self.intake_dir().join("plugins")
    }

    /// Text source rooted at the workspace
    pub fn texts(&self) -> FsTextSource {
        FsTextSource::new(&self.root)
    }

    /// Path of the planner's entry list
    pub fn stories_path(&self) -> PathBuf {
        self.root.join(&self.settings().paths.stories)
    }

    /// Reads the planner's entry list leniently
    pub fn entries(&self) -> Vec<Entry> {
        read_entries(&self.texts(), &self.settings().paths.stories)
    }

    /// Snapshot store for a source ticket
    pub fn snapshot_store(&self, ticket_key: &str) -> SnapshotStore {
        SnapshotStore::new(self.settings().snapshot_dir(&self.root, ticket_key))
    }
}
