//! Tracker snapshot
//!
//! Dumps existing epics and stories of a project so the planner can avoid
//! duplicating them. The two halves are independent: a failed search or write
//! for one does not prevent the other.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::fail_open::fail_open;
use crate::domain::ItemKind;
use crate::storage::{IntakeConfig, SnapshotStore};
use crate::tracker::{SearchQuery, Tracker};

/// What a snapshot wrote
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub dir: PathBuf,
    /// Number of epics written, `None` if that half failed
    pub epics: Option<usize>,
    /// Number of stories written, `None` if that half failed
    pub stories: Option<usize>,
    pub taken_at: DateTime<Utc>,
}

pub fn take_snapshot(
    project: &str,
    config: &IntakeConfig,
    tracker: &mut dyn Tracker,
    store: &SnapshotStore,
) -> SnapshotSummary {
    let epics_query = SearchQuery::new(project, ItemKind::Epic)
        .excluding(config.snapshot.exclude_keys.iter().cloned());
    let epics = fail_open("snapshot epics", || -> Result<usize> {
        let epics = tracker.search(&epics_query)?;
        info!("Found {} epics", epics.len());
        let path = store.write_epics(&epics)?;
        info!("Wrote {}", path.display());
        Ok(epics.len())
    });

    let stories_query = SearchQuery::new(project, ItemKind::Story);
    let stories = fail_open("snapshot stories", || -> Result<usize> {
        let stories = tracker.search(&stories_query)?;
        info!("Found {} stories", stories.len());
        let path = store.write_stories(&stories)?;
        info!("Wrote {}", path.display());
        Ok(stories.len())
    });

    SnapshotSummary {
        dir: store.dir().to_path_buf(),
        epics,
        stories,
        taken_at: Utc::now(),
    }
}
