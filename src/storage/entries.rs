//! Planner entry list
//!
//! `stories.json` is produced by an upstream planner and is read leniently: a
//! missing, blank, malformed or non-array file yields an empty list and a
//! warning rather than an error. Every object in the array becomes an entry;
//! items that are not objects are skipped with a warning.

use serde_json::Value;
use tracing::{info, warn};

use super::text::TextSource;
use crate::domain::Entry;

/// Reads the entry list behind `reference`
pub fn read_entries(texts: &dyn TextSource, reference: &str) -> Vec<Entry> {
    match texts.read_text(reference) {
        Ok(Some(content)) => {
            let entries = parse_entries(&content);
            info!("Found {} entries in {}", entries.len(), reference);
            entries
        }
        Ok(None) => {
            warn!("{} is missing or empty", reference);
            Vec::new()
        }
        Err(e) => {
            warn!("Failed to read {}: {}", reference, e);
            Vec::new()
        }
    }
}

/// Parses the entry list from JSON text
pub fn parse_entries(content: &str) -> Vec<Entry> {
    if content.trim().is_empty() {
        warn!("entry list is empty");
        return Vec::new();
    }

    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse entry list: {}", e);
            return Vec::new();
        }
    };

    let Value::Array(items) = value else {
        warn!("entry list is not an array");
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| {
            if !item.is_object() {
                warn!("Skipping entry {}: not an object", i + 1);
                return None;
            }
            match serde_json::from_value::<Entry>(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping entry {}: {}", i + 1, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ItemKind;
    use crate::storage::FsTextSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parses_array() {
        let entries = parse_entries(
            r#"[{"tempId": "temp-1", "summary": "A"}, {"summary": "B", "parent": "temp-1"}]"#,
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].parent(), Some("temp-1"));
    }

    #[test]
    fn blank_is_empty() {
        assert!(parse_entries("  \n").is_empty());
    }

    #[test]
    fn malformed_is_empty() {
        assert!(parse_entries("[{\"summary\": ").is_empty());
    }

    #[test]
    fn non_array_is_empty() {
        assert!(parse_entries(r#"{"summary": "A"}"#).is_empty());
    }

    #[test]
    fn skips_items_that_are_not_objects() {
        let entries = parse_entries(r#"[{"summary": "A"}, 42, {"summary": "B"}]"#);

        let summaries: Vec<_> = entries.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["A", "B"]);
    }

    #[test]
    fn mistyped_fields_still_yield_entries() {
        let entries = parse_entries(
            r#"[
                {"tempId": "temp-1", "summary": "Epic A"},
                {"summary": null, "parent": "temp-1"},
                {"summary": "Epic C", "tempId": 7},
                {"summary": "Story D", "parent": 42}
            ]"#,
        );

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].kind(), ItemKind::Story);
        assert_eq!(entries[1].summary, "");
        assert_eq!(entries[2].temp_id(), Some("7"));
        assert_eq!(entries[3].parent(), Some("42"));
    }

    #[test]
    fn reads_file_through_text_source() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("outputs")).unwrap();
        fs::write(dir.path().join("outputs/stories.json"), r#"[{"summary": "A"}]"#).unwrap();

        let entries = read_entries(&FsTextSource::new(dir.path()), "outputs/stories.json");

        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_entries(&FsTextSource::new(dir.path()), "nope.json").is_empty());
    }
}
