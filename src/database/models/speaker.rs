// Database models - Speaker identities

use serde::{Deserialize, Serialize};

/// A long-lived speaker identity, persisted across recordings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Speaker {
    /// Auto-generated sequential token (`speaker_<n>`) or an externally
    /// assigned id
    pub id: String,
    /// Human-assigned display name
    pub label: Option<String>,
    /// Alternative labels this identity has been known by
    pub aliases: Vec<String>,
    pub first_seen: Option<String>,
    pub last_seen: Option<String>,
}

impl Speaker {
    pub fn new(id: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            label: None,
            aliases: Vec::new(),
            first_seen: Some(now.clone()),
            last_seen: Some(now),
        }
    }

    /// Index of an auto-generated id, if this is one (`speaker_7` -> 7)
    pub fn auto_index(id: &str) -> Option<u64> {
        id.strip_prefix("speaker_")?.parse().ok()
    }
}
