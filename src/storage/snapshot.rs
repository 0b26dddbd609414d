//! Tracker snapshot files
//!
//! Before a run, the epics and stories that already exist in the tracker are
//! written next to the planner's input as `existing_epics.json` and
//! `existing_stories.json`. Writes are atomic (temp file + rename) under an
//! exclusive lock.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::tracker::IssueSummary;

pub const EPICS_FILE: &str = "existing_epics.json";
pub const STORIES_FILE: &str = "existing_stories.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct EpicsDocument {
    #[serde(default)]
    epics: Vec<IssueSummary>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoriesDocument {
    #[serde(default)]
    stories: Vec<IssueSummary>,
}

/// Snapshot files for one source ticket
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn epics_path(&self) -> PathBuf {
        self.dir.join(EPICS_FILE)
    }

    pub fn stories_path(&self) -> PathBuf {
        self.dir.join(STORIES_FILE)
    }

    pub fn write_epics(&self, epics: &[IssueSummary]) -> Result<PathBuf> {
        let path = self.epics_path();
        let document = EpicsDocument {
            epics: epics.to_vec(),
        };
        write_atomic(&path, &document)?;
        Ok(path)
    }

    pub fn write_stories(&self, stories: &[IssueSummary]) -> Result<PathBuf> {
        let path = self.stories_path();
        let document = StoriesDocument {
            stories: stories.to_vec(),
        };
        write_atomic(&path, &document)?;
        Ok(path)
    }

    /// Reads the epics snapshot; a missing file is an empty list
    pub fn read_epics(&self) -> Result<Vec<IssueSummary>> {
        let path = self.epics_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        let document: EpicsDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))?;

        Ok(document.epics)
    }

    /// Keys of every epic in the snapshot
    pub fn known_epic_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .read_epics()?
            .into_iter()
            .map(|e| e.key)
            .filter(|k| !k.is_empty())
            .collect())
    }
}

fn write_atomic<T: Serialize>(path: &Path, document: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("json.tmp");

    {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        file.lock_exclusive()
            .context("Failed to acquire write lock on snapshot")?;

        let mut writer = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut writer, document)
            .context("Failed to serialize snapshot")?;
        writer.flush().context("Failed to flush snapshot")?;
    }

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}
