use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// In-progress writing text, persisted on every edit so a crash or quit
/// mid-stage loses nothing. Cleared on successful submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DraftData {
    pub schema_version: u32,
    pub test_id: String,
    pub task1: String,
    pub task2: String,
    pub saved_at: DateTime<Utc>,
}

impl DraftData {
    pub fn new(test_id: &str, task1: &str, task2: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            test_id: test_id.to_string(),
            task1: task1.to_string(),
            task2: task2.to_string(),
            saved_at: Utc::now(),
        }
    }

    /// Stale schema versions are discarded rather than migrated.
    pub fn usable(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }
}
