// Flat speaker registry snapshot
// Legacy keyed store mapping speaker id -> identity metadata; the
// relational tables stay canonical, this file is a derived snapshot
// refreshed after every resolution pass

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::database::{DatabaseManager, Speaker};

/// One registry record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub label: Option<String>,
    pub aliases: BTreeSet<String>,
    /// Segment ids of the bounded exemplar set
    pub exemplars: Vec<i64>,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
}

/// Keyed speaker registry with explicit load/merge/save
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerRegistry {
    pub entries: BTreeMap<String, RegistryEntry>,
}

impl SpeakerRegistry {
    /// Load a registry file; a missing file is an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry {:?}", path))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse registry {:?}", path))
    }

    /// Merge one record into the registry: aliases union, time range
    /// widened, label filled when absent, exemplars replaced.
    pub fn merge(&mut self, id: &str, incoming: RegistryEntry) {
        let entry = self.entries.entry(id.to_string()).or_default();

        if entry.label.is_none() {
            entry.label = incoming.label;
        }
        entry.aliases.extend(incoming.aliases);
        entry.exemplars = incoming.exemplars;
        entry.first_seen = min_timestamp(entry.first_seen.take(), incoming.first_seen);
        entry.last_seen = max_timestamp(entry.last_seen.take(), incoming.last_seen);
    }

    pub fn remove(&mut self, id: &str) -> Option<RegistryEntry> {
        self.entries.remove(id)
    }

    /// Write the registry atomically: temp file in the same directory,
    /// then rename over the target. A crash mid-write never truncates
    /// the existing snapshot.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create registry directory {:?}", parent))?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(self).context("Failed to serialize registry")?;
        std::fs::write(&tmp_path, text)
            .with_context(|| format!("Failed to write registry temp file {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to swap registry into place at {:?}", path))?;
        Ok(())
    }

    /// Build the snapshot from the canonical tables
    pub fn from_database(db: &DatabaseManager) -> Result<Self> {
        let mut registry = Self::default();
        for speaker in db.list_speakers()? {
            let exemplars = db.exemplar_segment_ids(&speaker.id)?;
            registry.entries.insert(speaker.id.clone(), entry_for(&speaker, exemplars));
        }
        Ok(registry)
    }
}

fn entry_for(speaker: &Speaker, exemplars: Vec<i64>) -> RegistryEntry {
    RegistryEntry {
        label: speaker.label.clone(),
        aliases: speaker.aliases.iter().cloned().collect(),
        exemplars,
        first_seen: speaker.first_seen.clone(),
        last_seen: speaker.last_seen.clone(),
    }
}

/// Refresh the on-disk snapshot from the canonical tables
pub fn export_snapshot(db: &DatabaseManager, path: &Path) -> Result<()> {
    SpeakerRegistry::from_database(db)?.save(path)
}

// RFC3339 UTC timestamps compare correctly as strings
fn min_timestamp(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a <= b { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn max_timestamp(a: Option<String>, b: Option<String>) -> Option<String> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if a >= b { a } else { b }),
        (a, b) => a.or(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entry(label: Option<&str>, first: &str, last: &str) -> RegistryEntry {
        RegistryEntry {
            label: label.map(String::from),
            aliases: BTreeSet::new(),
            exemplars: vec![1, 2],
            first_seen: Some(first.to_string()),
            last_seen: Some(last.to_string()),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("registry.json");

        let mut registry = SpeakerRegistry::default();
        registry.merge("speaker_0", entry(Some("Jozef"), "2025-08-01T09:00:00Z", "2025-08-02T10:00:00Z"));
        registry.save(&path).unwrap();

        let loaded = SpeakerRegistry::load(&path).unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries["speaker_0"].label.as_deref(), Some("Jozef"));

        // The temp file never lingers
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let registry = SpeakerRegistry::load(&dir.path().join("none.json")).unwrap();
        assert!(registry.entries.is_empty());
    }

    #[test]
    fn test_merge_widens_time_range_and_keeps_label() {
        let mut registry = SpeakerRegistry::default();
        registry.merge("speaker_0", entry(Some("Jozef"), "2025-08-02T00:00:00Z", "2025-08-03T00:00:00Z"));
        registry.merge("speaker_0", entry(Some("Someone"), "2025-08-01T00:00:00Z", "2025-08-05T00:00:00Z"));

        let merged = &registry.entries["speaker_0"];
        assert_eq!(merged.label.as_deref(), Some("Jozef"));
        assert_eq!(merged.first_seen.as_deref(), Some("2025-08-01T00:00:00Z"));
        assert_eq!(merged.last_seen.as_deref(), Some("2025-08-05T00:00:00Z"));
    }
}
