//! Narrative and description text
//!
//! The planner writes long-form descriptions and the analysis comment as
//! separate files next to `stories.json`. Missing or blank files are not an
//! error; callers fall back to shorter text.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Comment used when the planner produced no analysis
pub const FALLBACK_NARRATIVE: &str = "h3. *Intake Analysis*\n\n_No analysis comment was generated._";

/// Source of externally stored text
pub trait TextSource {
    /// Reads the text behind `reference`
    ///
    /// Returns `Ok(None)` when there is no such text or it is blank.
    fn read_text(&self, reference: &str) -> io::Result<Option<String>>;
}

/// Reads text files relative to a root directory
#[derive(Debug, Clone)]
pub struct FsTextSource {
    root: PathBuf,
}

impl FsTextSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl TextSource for FsTextSource {
    fn read_text(&self, reference: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.resolve(reference)) {
            Ok(content) if content.trim().is_empty() => Ok(None),
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl TextSource for HashMap<String, String> {
    fn read_text(&self, reference: &str) -> io::Result<Option<String>> {
        Ok(self
            .get(reference)
            .filter(|text| !text.trim().is_empty())
            .cloned())
    }
}

/// Reads the analysis comment, falling back to [`FALLBACK_NARRATIVE`]
pub fn read_narrative(texts: &dyn TextSource, reference: &str) -> String {
    match texts.read_text(reference) {
        Ok(Some(text)) => text,
        Ok(None) => FALLBACK_NARRATIVE.to_string(),
        Err(e) => {
            warn!(%reference, error = %e, "could not read narrative comment");
            FALLBACK_NARRATIVE.to_string()
        }
    }
}
