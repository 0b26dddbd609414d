//! Configuration handling for intake
//!
//! Configuration is stored in `.intake/config.toml` (workspace) and
//! `~/.config/intake/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DirectKeyPolicy, DuplicatePolicy, PlaceholderConvention, DEFAULT_PLACEHOLDER_PREFIX};
use crate::intake::{OrchestratorOptions, DEFAULT_SUMMARY};
use crate::tracker::IssueTypes;

/// Name of the workspace marker directory
pub const WORKSPACE_DIR: &str = ".intake";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which tracker plugin to use and where tickets live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Plugin name, resolved to `intake-tracker-<plugin>`
    pub plugin: String,

    /// Project key for new issues; empty means the source ticket's prefix
    pub project: String,

    /// Prefix used to link keys in the report
    pub browse_url: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            plugin: "jira".to_string(),
            project: String::new(),
            browse_url: None,
        }
    }
}

/// Labels applied to the source ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub intake: String,
    pub generated: String,

    /// Appended to the context id to form the work-in-progress label
    pub wip_suffix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            intake: "ai_intake".to_string(),
            generated: "ai_generated".to_string(),
            wip_suffix: "_wip".to_string(),
        }
    }
}

impl LabelConfig {
    /// Work-in-progress label for a context id
    pub fn wip_label(&self, context_id: &str) -> String {
        format!("{}{}", context_id, self.wip_suffix)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Status the source ticket moves to after a run
    pub done: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            done: "Done".to_string(),
        }
    }
}

/// Workspace-relative locations of planner output and tracker snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub stories: String,
    pub comment: String,

    /// Snapshots are written to `<input_dir>/<ticket>/`
    pub input_dir: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            stories: "outputs/stories.json".to_string(),
            comment: "outputs/comment.md".to_string(),
            input_dir: "input".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub prefix: String,
    pub duplicates: DuplicatePolicy,
    pub direct_keys: DirectKeyPolicy,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PLACEHOLDER_PREFIX.to_string(),
            duplicates: DuplicatePolicy::default(),
            direct_keys: DirectKeyPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Epics left out of `existing_epics.json`
    pub exclude_keys: Vec<String>,
}

/// Workspace-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Summary used for entries whose summary is blank
    pub default_summary: String,

    pub tracker: TrackerConfig,
    pub issue_types: IssueTypes,
    pub labels: LabelConfig,
    pub statuses: StatusConfig,
    pub paths: PathConfig,
    pub placeholders: PlaceholderConfig,
    pub snapshot: SnapshotConfig,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            default_summary: DEFAULT_SUMMARY.to_string(),
            tracker: TrackerConfig::default(),
            issue_types: IssueTypes::default(),
            labels: LabelConfig::default(),
            statuses: StatusConfig::default(),
            paths: PathConfig::default(),
            placeholders: PlaceholderConfig::default(),
            snapshot: SnapshotConfig::default(),
        }
    }
}

impl IntakeConfig {
    /// Parses and validates a `config.toml` document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.placeholders.prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "placeholders.prefix must not be empty".to_string(),
            ));
        }
        if self.paths.stories.trim().is_empty() {
            return Err(ConfigError::Invalid("paths.stories must not be empty".to_string()));
        }
        if self.tracker.plugin.trim().is_empty() {
            return Err(ConfigError::Invalid("tracker.plugin must not be empty".to_string()));
        }
        Ok(())
    }

    /// Project key for new issues given the source ticket's key
    ///
    /// Uses `tracker.project` when set, otherwise the part of the ticket key
    /// before the first `-`.
    pub fn project_key(&self, ticket_key: &str) -> Option<String> {
        let configured = self.tracker.project.trim();
        if !configured.is_empty() {
            return Some(configured.to_string());
        }

        let prefix = ticket_key.trim().split('-').next().unwrap_or_default();
        if prefix.is_empty() {
            None
        } else {
            Some(prefix.to_string())
        }
    }

    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            convention: PlaceholderConvention::new(self.placeholders.prefix.trim()),
            duplicates: self.placeholders.duplicates,
            direct_keys: self.placeholders.direct_keys,
            default_summary: self.default_summary.clone(),
        }
    }

    /// Folder for the tracker snapshot of a source ticket
    pub fn snapshot_dir(&self, root: &Path, ticket_key: &str) -> PathBuf {
        root.join(&self.paths.input_dir).join(ticket_key)
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + workspace)
#[derive(Debug, Clone)]
pub struct Config {
    pub intake: IntakeConfig,
    pub global: GlobalConfig,
    pub workspace_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from default locations
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let workspace_root = Self::find_workspace_root();
        let intake = match &workspace_root {
            Some(root) => Self::load_workspace_config(root)?,
            None => IntakeConfig::default(),
        };

        Ok(Self {
            intake,
            global,
            workspace_root,
        })
    }

    /// Loads configuration for a specific workspace
    pub fn for_workspace(workspace_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let intake = Self::load_workspace_config(workspace_root)?;

        Ok(Self {
            intake,
            global,
            workspace_root: Some(workspace_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "intake", "intake-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn load_global() -> Result<GlobalConfig> {
        let Some(config_dir) = Self::global_config_dir() else {
            return Ok(GlobalConfig::default());
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    fn load_workspace_config(workspace_root: &Path) -> Result<IntakeConfig> {
        let config_path = workspace_root.join(WORKSPACE_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(IntakeConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read workspace config: {}", config_path.display()))?;

        IntakeConfig::parse(&content)
            .with_context(|| format!("Failed to load workspace config: {}", config_path.display()))
    }

    /// Finds the workspace root by looking for an `.intake/` directory
    pub fn find_workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_workspace_root_from(&current)
    }

    /// Walks up from `start` looking for an `.intake/` directory
    pub fn find_workspace_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns the workspace root, or an error if not in a workspace
    pub fn require_workspace_root(&self) -> Result<&Path> {
        self.workspace_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in an intake workspace. Run 'intake init' first."))
    }
}
