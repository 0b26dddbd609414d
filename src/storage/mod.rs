//! # Storage Layer
//!
//! Workspace files for intake.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `.intake/config.toml` |
//! | Planned entries | JSON array | `outputs/stories.json` |
//! | Analysis comment | Tracker markup | `outputs/comment.md` |
//! | Tracker snapshot | JSON | `input/<ticket>/existing_{epics,stories}.json` |
//!
//! ## Concurrency Safety
//!
//! - [`SnapshotStore`] writes under an exclusive `fs2` lock
//! - Snapshot writes are atomic (temp file + rename)
//!
//! ## Workspace Structure
//!
//! ```text
//! .intake/
//! ├── config.toml           # Workspace configuration
//! ├── plugins/              # Local tracker plugins
//! └── .gitignore
//! outputs/
//! ├── stories.json          # Written by the planner
//! └── comment.md
//! input/
//! └── JD-123/               # One folder per source ticket
//! ```
//!
//! ## Key Types
//!
//! - [`Workspace`] - Entry point for accessing an intake workspace
//! - [`SnapshotStore`] - Read/write tracker snapshots
//! - [`TextSource`] - Description and narrative lookup
//! - [`Config`] - Workspace and global configuration

mod config;
mod entries;
mod snapshot;
mod text;
mod workspace;

pub use config::{
    Config, ConfigError, GlobalConfig, IntakeConfig, LabelConfig, OutputFormat, PathConfig,
    PlaceholderConfig, SnapshotConfig, StatusConfig, TrackerConfig, WORKSPACE_DIR,
};
pub use entries::{parse_entries, read_entries};
pub use snapshot::{SnapshotStore, EPICS_FILE, STORIES_FILE};
pub use text::{read_narrative, FsTextSource, TextSource, FALLBACK_NARRATIVE};
pub use workspace::{Workspace, WorkspaceError};
